//! CLI module graph.

pub mod check;
pub mod command;
pub mod entry;
pub mod output;
pub mod provision;
pub mod report;
pub mod routes;
