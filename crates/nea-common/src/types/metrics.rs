//! Derived metrics snapshot and telemetry point

use serde::{Deserialize, Serialize};

/// Ratios over the recent history window, in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiMetrics {
    pub admission_rate: f64,
    pub failure_rate: f64,
    pub refusal_rate: f64,
    /// Terminal records so far
    pub total_requests: u64,
    /// Mean initial payload over the window
    pub avg_payload: f64,
}

impl Default for KpiMetrics {
    fn default() -> Self {
        Self {
            admission_rate: 100.0,
            failure_rate: 0.0,
            refusal_rate: 0.0,
            total_requests: 0,
            avg_payload: 0.0,
        }
    }
}

/// Scalars recomputed every tick; never mutated in between
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub entropy: f64,
    pub coherence: f64,
    /// Φ
    pub syntropy: f64,
    pub throughput: f64,
    pub load_percent: f64,
    pub active_count: usize,
    pub kpis: KpiMetrics,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            entropy: 0.0,
            coherence: 100.0,
            syntropy: 100.0,
            throughput: 0.0,
            load_percent: 0.0,
            active_count: 0,
            kpis: KpiMetrics::default(),
        }
    }
}

/// One chart sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    /// Session clock (ms)
    pub time_ms: u64,
    pub coherence: f64,
    pub entropy: f64,
    pub syntropy: f64,
    pub load: f64,
    pub throughput: f64,
}

impl TimeSeriesPoint {
    pub fn sample(time_ms: u64, metrics: &Metrics) -> Self {
        Self {
            time_ms,
            coherence: metrics.coherence,
            entropy: metrics.entropy,
            syntropy: metrics.syntropy,
            load: metrics.load_percent,
            throughput: metrics.throughput,
        }
    }
}
