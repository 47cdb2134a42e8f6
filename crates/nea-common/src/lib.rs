//! # NEA Common
//!
//! Shared types and errors for the NEA Studio admission-control simulation.
//!
//! ## Core Types
//!
//! - [`WorkUnit`]: one simulated unit of work and its lifecycle status
//! - [`Invariant`] / [`InvariantSet`]: named bounds with STABLE/WARNING/VIOLATED status
//! - [`Metrics`]: derived scalars recomputed every tick
//! - [`PolicyMode`] / [`Domain`]: operator-selected policy and limit preset
//!
//! ## Randomness
//!
//! - [`random::RandomSource`]: injectable uniform source, with a seeded
//!   `rand` implementation and a replayable sequence for tests

pub mod error;
pub mod random;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{NeaError, ParseError, Result};
pub use random::{RandomSource, SequenceRandom, StdRandom};
pub use types::{
    invariant::{BoundReadings, Invariant, InvariantId, InvariantSet, InvariantStatus},
    metrics::{KpiMetrics, Metrics, TimeSeriesPoint},
    policy::{Domain, DomainLimits, PolicyMode},
    work_unit::{OutcomeReason, WorkStatus, WorkUnit, WorkUnitId},
};

/// NEA Studio version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum concurrently active units before saturation
pub const DEFAULT_CAPACITY: usize = 4;

/// Entropy above which gated modes refuse as unstable
pub const INSTABILITY_THRESHOLD: f64 = 10.0;

/// History entries shown in the event stream
pub const DISPLAY_WINDOW: usize = 20;

/// History entries aggregated into KPIs
pub const KPI_WINDOW: usize = 100;

/// Telemetry points retained for charting
pub const TELEMETRY_CAPACITY: usize = 40;
