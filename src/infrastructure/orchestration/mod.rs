//! Provisioning run orchestration.
//!
//! [`session::ProvisioningSession`] drives the phases; the other modules hold
//! one phase each plus the shared retry and shutdown helpers.

pub mod gate;
pub mod reconciler;
pub mod retry;
pub mod session;
pub mod shutdown;
pub mod verifier;
