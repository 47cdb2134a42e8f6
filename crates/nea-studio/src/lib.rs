//! # NEA Studio
//!
//! Service wrapper around one admission-control simulation session.
//!
//! - [`config`]: environment-driven service configuration
//! - [`api`]: REST operator surface
//! - [`metrics`]: Prometheus series mirrored from the session

pub mod api;
pub mod config;
pub mod metrics;

/// Service version
pub const STUDIO_VERSION: &str = env!("CARGO_PKG_VERSION");
