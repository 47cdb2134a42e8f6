//! # NEA Admission
//!
//! Admission-control simulation for NEA Studio.
//!
//! ## Tick
//!
//! ```text
//! H'   = clamp(H + |active| × m_mode × m_domain × s − decay, 0, 100)
//! C    = 100 − H'
//! Φ    = containment × health × k / (1 + H' / k2)
//! ```
//!
//! Where:
//! - H: entropy, s: stress factor
//! - containment: 1 − failure rate over the KPI window
//! - health: 1.0 when no invariant is VIOLATED, otherwise the penalty factor
//!
//! ## Admission
//!
//! Gated modes refuse *before* any state change. Permissive modes admit
//! everything and may fail the unit after a short delay.

pub mod driver;
pub mod engine;
pub mod gate;
pub mod history;
pub mod scheduler;
pub mod session;
pub mod telemetry;

use serde::{Deserialize, Serialize};

pub use driver::{SessionDriver, SharedSession};
pub use engine::{EngineState, SimulationEngine, TickReport};
pub use gate::{AdmissionGate, AdmissionOutcome};
pub use history::{History, OutcomeCounts, WindowStats};
pub use scheduler::Scheduler;
pub use session::{Session, SessionEvent, SessionSnapshot};
pub use telemetry::TelemetrySink;

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Active units at which the system is saturated
    pub capacity: usize,
    /// Entropy above which gated modes refuse as unstable
    pub instability_threshold: f64,
    /// Failure probability at zero entropy in permissive modes
    pub base_failure_risk: f64,
    /// Delay between admission and a scheduled failure (ms)
    pub failure_delay_ms: u64,
    /// Simulation tick period (ms)
    pub tick_ms: u64,
    /// Telemetry sampling period (ms)
    pub telemetry_ms: u64,
    /// Automated work-request period (ms)
    pub auto_inject_ms: u64,
    /// Entropy removed every tick
    pub entropy_decay: f64,
    /// Payload removed from each active unit every tick
    pub transition_speed: f64,
    /// Entropy growth factor under stress
    pub stress_entropy_factor: f64,
    /// Transition speed factor under stress
    pub stress_speed_factor: f64,
    /// Health factor applied to Φ while any invariant is violated
    pub violation_penalty: f64,
    /// Φ scale
    pub syntropy_k: f64,
    /// Entropy damping in Φ
    pub syntropy_k2: f64,
    /// Throughput credited per completion
    pub throughput_per_completion: f64,
    /// Smallest initial payload (inclusive)
    pub payload_min: u32,
    /// Largest initial payload (exclusive)
    pub payload_max: u32,
    /// History entries aggregated into KPIs
    pub kpi_window: usize,
    /// History entries included in snapshots
    pub display_window: usize,
    /// Telemetry points retained
    pub telemetry_capacity: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            capacity: nea_common::DEFAULT_CAPACITY,
            instability_threshold: nea_common::INSTABILITY_THRESHOLD,
            base_failure_risk: 0.05,
            failure_delay_ms: 300,
            tick_ms: 800,
            telemetry_ms: 1000,
            auto_inject_ms: 1200,
            entropy_decay: 5.0,
            transition_speed: 15.0,
            stress_entropy_factor: 1.5,
            stress_speed_factor: 0.5,
            violation_penalty: 0.4,
            syntropy_k: 100.0,
            syntropy_k2: 50.0,
            throughput_per_completion: 10.0,
            payload_min: 30,
            payload_max: 90,
            kpi_window: nea_common::KPI_WINDOW,
            display_window: nea_common::DISPLAY_WINDOW,
            telemetry_capacity: nea_common::TELEMETRY_CAPACITY,
        }
    }
}
