//! Broker-agnostic provisioning types: declared topology, fan-out table and
//! run report.

pub mod report;
pub mod routing;
pub mod topology;
