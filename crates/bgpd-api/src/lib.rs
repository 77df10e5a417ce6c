//! # BGP Daemon API
//!
//! The operation surface of a BGP routing daemon, built on top of the
//! [`actor_bridge`] crate.
//!
//! ## Core Components
//!
//! - **[model]**: Plain data records – neighbors, routes, VRFs, policy
//!   objects, RPKI/ROA cache entries.
//! - **[op]**: The closed operation catalog plus the static scope-validation
//!   tables that route table reads, monitors, dumps and path mutations.
//! - **[payload]**: The discriminated request/reply payload unions and the
//!   [`Bgp`](payload::Bgp) protocol marker tying everything together.
//! - **[service]**: [`ApiService`](service::ApiService), the call façade: one
//!   method per supported operation, grouped by call shape.
//! - **[daemon]**: A reference in-memory daemon – the single serialized
//!   consumer of the request queue – used by the demo binary and the
//!   integration tests.
//! - **[lifecycle]**: [`ApiSystem`](lifecycle::ApiSystem), which wires the
//!   dispatcher, spawns the daemon and manages shutdown.
//!
//! ## Quick Start
//!
//! ```rust
//! use bgpd_api::lifecycle::ApiSystem;
//! use bgpd_api::model::GlobalConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let system = ApiSystem::start();
//!     system
//!         .service
//!         .apply_global_config(GlobalConfig {
//!             asn: 64512,
//!             router_id: "192.0.2.1".to_string(),
//!             listen_port: 179,
//!         })
//!         .await
//!         .unwrap();
//!     let config = system.service.global_config().await.unwrap();
//!     assert_eq!(config.asn, 64512);
//!     system.shutdown().await;
//! }
//! ```

pub mod daemon;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod op;
pub mod payload;
pub mod service;

pub use error::ApiError;
pub use op::{Op, Scope, SoftResetDirection};
pub use payload::{Bgp, Body, Payload};
pub use service::{ApiService, Deliver, PathUpdate};
