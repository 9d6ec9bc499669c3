//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!            ┌───────────────────────────┐
//!            │   Provisioning session    │
//!            │  (gates, reconciler, ...) │
//!            └─────────────┬─────────────┘
//!                ┌─────────┴─────────┐
//!                ▼                   ▼
//!          ┌───────────┐       ┌───────────┐
//!          │  Broker   │       │  Health   │
//!          │  Adapter  │       │   Probe   │
//!          └───────────┘       └───────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`BrokerAdmin`](outbound::BrokerAdmin) - Topic and subscription administration
//! - [`HealthProbe`](outbound::HealthProbe) - Downstream readiness checks

pub mod outbound;
