//! Diagnostic command handlers.

pub mod broker;
pub mod command;
pub mod config;
