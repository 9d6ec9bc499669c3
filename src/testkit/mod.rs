//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`broker`]: In-memory [`BrokerAdmin`](crate::port::outbound::broker::BrokerAdmin)
//!   with failure injection and call recording.
//! - [`probe`]: Scripted [`HealthProbe`](crate::port::outbound::probe::HealthProbe).
//! - [`config`]: Canonical topologies and fast settings.
//! - [`connector`]: A [`Connector`](crate::infrastructure::factory::connector::Connector)
//!   handing out the fakes above.

pub mod broker;
pub mod config;
pub mod connector;
pub mod probe;
