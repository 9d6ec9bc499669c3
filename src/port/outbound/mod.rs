//! Outbound ports: what the provisioner needs from the outside world.

pub mod broker;
pub mod probe;
