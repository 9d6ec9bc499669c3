//! Adapter construction.
//!
//! The session never builds adapters itself; it asks a [`connector::Connector`]
//! for them so tests can substitute in-memory implementations.

pub mod connector;
