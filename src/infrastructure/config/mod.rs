//! Infrastructure configuration modules.

pub mod http;
pub mod logging;
pub mod reconcile;
pub mod retry;
pub mod settings;
