//! Outbound adapters (driven side).

pub mod probe;
pub mod pubsub;
