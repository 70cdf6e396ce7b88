//! Domain layer — pure topology types, rule builders, and output parsers.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod app;
pub mod config;
pub mod error;
pub mod firewall;
pub mod instance;
pub mod mode;
pub mod parse;
pub mod remote;
pub mod service;
pub mod traffic;

pub use app::App;
pub use config::{ChaosConfig, CustomServiceConfig};
pub use error::{ConfigError, DiscoveryError, FaultError};
pub use firewall::{Direction, PortSelection, TIMES_TO_REMOVE};
pub use instance::{AppInstance, PortPair};
pub use mode::NetworkMode;
pub use service::{CUSTOM_SERVICE_TYPE, Endpoint, PortSpec, Protocol, Service};
pub use traffic::NetemOptions;
