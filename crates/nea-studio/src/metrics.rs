//! Prometheus metrics for the studio

use anyhow::Result;
use nea_admission::SessionSnapshot;
use parking_lot::Mutex;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};

/// Prometheus metrics mirrored from the session
pub struct StudioMetrics {
    pub admissions_total: IntCounter,
    pub refusals_total: IntCounter,
    pub failures_total: IntCounter,
    pub completions_total: IntCounter,
    pub entropy: Gauge,
    pub syntropy: Gauge,
    pub active_work: IntGauge,
    pub formalizer_requests_total: IntCounter,
    pub formalizer_empty_total: IntCounter,
    seen: Mutex<SeenTotals>,
}

/// Session totals already folded into the counters
#[derive(Debug, Default)]
struct SeenTotals {
    admitted: u64,
    refused: u64,
    failed: u64,
    completed: u64,
}

impl StudioMetrics {
    pub fn new() -> prometheus::Result<Self> {
        Ok(Self {
            admissions_total: IntCounter::new(
                "nea_admissions_total",
                "Work units admitted into the active set",
            )?,
            refusals_total: IntCounter::new(
                "nea_refusals_total",
                "Work units refused or preempted before execution",
            )?,
            failures_total: IntCounter::new(
                "nea_failures_total",
                "Admitted work units that failed at run time",
            )?,
            completions_total: IntCounter::new(
                "nea_completions_total",
                "Work units that ran to completion",
            )?,
            entropy: Gauge::new("nea_entropy", "Current simulated entropy")?,
            syntropy: Gauge::new("nea_syntropy", "Current syntropy index")?,
            active_work: IntGauge::new("nea_active_work", "Work units currently executing")?,
            formalizer_requests_total: IntCounter::new(
                "nea_formalizer_requests_total",
                "Formalization requests received",
            )?,
            formalizer_empty_total: IntCounter::new(
                "nea_formalizer_empty_total",
                "Formalization requests that produced no document",
            )?,
            seen: Mutex::new(SeenTotals::default()),
        })
    }

    pub fn register(&self, registry: &Registry) -> Result<()> {
        registry.register(Box::new(self.admissions_total.clone()))?;
        registry.register(Box::new(self.refusals_total.clone()))?;
        registry.register(Box::new(self.failures_total.clone()))?;
        registry.register(Box::new(self.completions_total.clone()))?;
        registry.register(Box::new(self.entropy.clone()))?;
        registry.register(Box::new(self.syntropy.clone()))?;
        registry.register(Box::new(self.active_work.clone()))?;
        registry.register(Box::new(self.formalizer_requests_total.clone()))?;
        registry.register(Box::new(self.formalizer_empty_total.clone()))?;
        Ok(())
    }

    /// Bring every series up to date with `snapshot`
    ///
    /// Session totals only grow, so counters advance by the difference from
    /// the largest total seen so far. Older snapshots leave them unchanged.
    pub fn observe(&self, snapshot: &SessionSnapshot) {
        let mut seen = self.seen.lock();
        catch_up(&self.admissions_total, &mut seen.admitted, snapshot.admitted_total);
        catch_up(
            &self.refusals_total,
            &mut seen.refused,
            snapshot.counts.refused + snapshot.counts.preempted,
        );
        catch_up(&self.failures_total, &mut seen.failed, snapshot.counts.failed);
        catch_up(&self.completions_total, &mut seen.completed, snapshot.counts.completed);
        self.entropy.set(snapshot.metrics.entropy);
        self.syntropy.set(snapshot.metrics.syntropy);
        self.active_work.set(snapshot.active.len() as i64);
    }
}

fn catch_up(counter: &IntCounter, seen: &mut u64, total: u64) {
    if total > *seen {
        counter.inc_by(total - *seen);
        *seen = total;
    }
}

/// Render `registry` in the text exposition format
pub fn render(registry: &Registry) -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
