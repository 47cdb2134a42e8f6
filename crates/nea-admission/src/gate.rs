//! Admission gate
//!
//! Decides, for every new work request, whether the unit may begin.
//!
//! ```text
//! BOUNDED           NO_ERROR          TRADITIONAL / REACTIVE
//! ───────────────   ───────────────   ────────────────────────────────
//! bound breach?     saturated?        admit
//! saturated?        unstable?         roll failure_risk = H/100 + base
//! unstable?         bound breach?     hit → schedule delayed failure
//! → PREEMPTED       → REFUSED
//! ```
//!
//! A refusal is decided before any mutation of the active set.

use nea_common::{OutcomeReason, PolicyMode, RandomSource, WorkUnit, WorkUnitId};
use tracing::{debug, info};

use crate::engine::{EngineState, SimulationEngine};
use crate::history::History;

/// Result of one work request
#[derive(Debug, Clone, PartialEq)]
pub enum AdmissionOutcome {
    /// Turned away; the terminal record is already in history
    Refused { unit: WorkUnit },
    /// Added to the active set
    Admitted {
        unit: WorkUnit,
        /// A delayed failure must be scheduled for this unit
        failure_scheduled: bool,
    },
}

impl AdmissionOutcome {
    pub fn unit(&self) -> &WorkUnit {
        match self {
            AdmissionOutcome::Refused { unit } | AdmissionOutcome::Admitted { unit, .. } => unit,
        }
    }

    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmissionOutcome::Admitted { .. })
    }
}

/// Pre-execution admission check
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    engine: SimulationEngine,
}

impl AdmissionGate {
    pub fn new(engine: SimulationEngine) -> Self {
        Self { engine }
    }

    /// Reason `mode` would refuse right now, if any
    pub fn evaluate(
        &self,
        mode: PolicyMode,
        state: &EngineState,
        history: &History,
    ) -> Option<OutcomeReason> {
        let cfg = self.engine.config();
        let readings = self.engine.readings(state, history);

        let breach = || {
            state
                .invariants
                .first_breach(&readings)
                .map(OutcomeReason::BoundBreach)
        };
        let saturated = || {
            (state.active.len() >= cfg.capacity).then_some(OutcomeReason::SaturationReject)
        };
        let unstable = || {
            (state.entropy > cfg.instability_threshold)
                .then_some(OutcomeReason::UnstableStateRefusal)
        };

        match mode {
            PolicyMode::Bounded => breach().or_else(saturated).or_else(unstable),
            PolicyMode::NoError => saturated().or_else(unstable).or_else(breach),
            PolicyMode::Traditional | PolicyMode::Reactive => None,
        }
    }

    /// Probability that an admitted unit fails in a permissive mode
    pub fn failure_risk(&self, entropy: f64) -> f64 {
        (entropy / 100.0 + self.engine.config().base_failure_risk).clamp(0.0, 1.0)
    }

    /// Handle one work request
    pub fn request_work(
        &self,
        state: &mut EngineState,
        history: &mut History,
        mode: PolicyMode,
        id: WorkUnitId,
        now_ms: u64,
        rng: &mut dyn RandomSource,
    ) -> AdmissionOutcome {
        let cfg = self.engine.config();
        let payload = rng.next_range(cfg.payload_min, cfg.payload_max) as f64;
        let unit = WorkUnit::pending(id, payload, now_ms);

        if mode.is_gated() {
            if let Some(reason) = self.evaluate(mode, state, history) {
                let refused = unit.refuse(mode.refusal_status(), reason);
                info!(id = %refused.id, %mode, %reason, "Work refused before execution");
                history.record(refused.clone());
                return AdmissionOutcome::Refused { unit: refused };
            }
            let admitted = unit.admit();
            state.active.push(admitted.clone());
            debug!(id = %admitted.id, %mode, payload, "Work admitted");
            return AdmissionOutcome::Admitted {
                unit: admitted,
                failure_scheduled: false,
            };
        }

        let risk = self.failure_risk(state.entropy);
        let mut admitted = unit.admit();
        admitted.failure_risk = Some(risk);
        state.active.push(admitted.clone());

        let failure_scheduled = rng.next_f64() < risk;
        debug!(
            id = %admitted.id,
            %mode,
            payload,
            risk,
            failure_scheduled,
            "Work admitted without pre-check"
        );
        AdmissionOutcome::Admitted {
            unit: admitted,
            failure_scheduled,
        }
    }
}

impl Default for AdmissionGate {
    fn default() -> Self {
        Self::new(SimulationEngine::default())
    }
}
