//! Google Cloud Pub/Sub (emulator) integration.

pub mod client;
pub mod dto;
