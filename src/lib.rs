//! meshprov - declarative Pub/Sub topology provisioner.
//!
//! Brings a broker's topics and push subscriptions into the state declared by
//! a topology document, gates on broker and service readiness, verifies the
//! result and reports the event-routing (fan-out) map.
//!
//! # Architecture
//!
//! Hexagonal layout:
//!
//! - **`domain`** - Topology, routing map and report types. No I/O.
//! - **`port`** - Traits the provisioner needs from the outside world
//!   (`BrokerAdmin`, `HealthProbe`).
//! - **`adapter`** - The Pub/Sub REST client, the HTTP health probe and the
//!   `clap` CLI.
//! - **`infrastructure`** - Configuration, adapter construction and the
//!   provisioning session state machine.
//!
//! # Features
//!
//! - `testkit` - In-memory broker, scripted probes and canned topologies for
//!   integration tests.
//!
//! # Example
//!
//! ```no_run
//! use meshprov::infrastructure::config::settings::ConfigLoader;
//! use meshprov::infrastructure::factory::connector::HttpConnector;
//! use meshprov::infrastructure::orchestration::session::ProvisioningSession;
//!
//! # async fn demo() -> meshprov::error::Result<()> {
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let loader = ConfigLoader::resolve(None);
//! let report = ProvisioningSession::new()
//!     .run(&loader, &HttpConnector, shutdown_rx)
//!     .await?;
//! println!("{}", report.state);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
