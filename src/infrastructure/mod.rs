//! Infrastructure layer.
//!
//! Configuration loading, adapter construction and the orchestration of a
//! provisioning run.
//!
//! # Submodules
//!
//! - [`config`] - Configuration loading and validation
//! - [`factory`] - Adapter construction
//! - [`orchestration`] - Gates, reconciliation, verification and the session

pub mod config;
pub mod factory;
pub mod orchestration;
