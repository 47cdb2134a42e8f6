//! Per-tick state transition
//!
//! Pure arithmetic over clamped ranges; a tick cannot fail.

use nea_common::{
    BoundReadings, Domain, InvariantSet, KpiMetrics, Metrics, PolicyMode, WorkUnit, WorkUnitId,
};
use tracing::{debug, trace};

use crate::history::History;
use crate::SimulationConfig;

/// Mutable simulation state owned by a session
#[derive(Debug, Clone)]
pub struct EngineState {
    pub entropy: f64,
    /// Admitted units still executing; every payload is > 0
    pub active: Vec<WorkUnit>,
    pub invariants: InvariantSet,
    /// Latest derived snapshot
    pub metrics: Metrics,
}

impl EngineState {
    pub fn new(domain: Domain) -> Self {
        Self {
            entropy: 0.0,
            active: Vec::new(),
            invariants: InvariantSet::for_domain(domain),
            metrics: Metrics::default(),
        }
    }

    pub fn is_active(&self, id: WorkUnitId) -> bool {
        self.active.iter().any(|unit| unit.id == id)
    }

    /// Remove an active unit, if still present
    pub fn take_active(&mut self, id: WorkUnitId) -> Option<WorkUnit> {
        let pos = self.active.iter().position(|unit| unit.id == id)?;
        Some(self.active.remove(pos))
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new(Domain::default())
    }
}

/// What a tick did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub entropy_delta: f64,
    pub completed: Vec<WorkUnitId>,
}

/// Simulation engine
#[derive(Debug, Clone)]
pub struct SimulationEngine {
    config: SimulationConfig,
}

impl SimulationEngine {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Fresh bound readings from current state
    pub fn readings(&self, state: &EngineState, history: &History) -> BoundReadings {
        BoundReadings {
            entropy: state.entropy,
            load: state.active.len() as f64 / self.config.capacity.max(1) as f64,
            failure_rate: history.window(self.config.kpi_window).failure_rate(),
        }
    }

    /// Payload removed from each active unit this tick
    pub fn transition_speed(&self, stress: bool) -> f64 {
        if stress {
            self.config.transition_speed * self.config.stress_speed_factor
        } else {
            self.config.transition_speed
        }
    }

    /// Advance the simulation by one tick
    pub fn tick(
        &self,
        state: &mut EngineState,
        history: &mut History,
        mode: PolicyMode,
        stress: bool,
    ) -> TickReport {
        let cfg = &self.config;
        let domain = state.invariants.domain();

        // 1. Entropy
        let stress_factor = if stress { cfg.stress_entropy_factor } else { 1.0 };
        let growth = state.active.len() as f64
            * mode.entropy_multiplier()
            * domain.entropy_multiplier()
            * stress_factor;
        let previous = state.entropy;
        state.entropy = (previous + growth - cfg.entropy_decay).clamp(0.0, 100.0);

        // 2. Order metrics from the previous invariant and KPI evaluation
        let coherence = 100.0 - state.entropy;
        let health = if state.invariants.any_violated() {
            cfg.violation_penalty
        } else {
            1.0
        };
        let containment = 1.0 - state.metrics.kpis.failure_rate / 100.0;
        let syntropy =
            containment * health * cfg.syntropy_k / (1.0 + state.entropy / cfg.syntropy_k2);

        // 3. Work advancement
        let speed = self.transition_speed(stress);
        let mut completed = Vec::new();
        let mut still_active = Vec::with_capacity(state.active.len());
        for mut unit in state.active.drain(..) {
            unit.payload -= speed;
            if unit.payload <= 0.0 {
                trace!(id = %unit.id, "Work unit completed");
                completed.push(unit.id);
                history.record(unit.complete());
            } else {
                still_active.push(unit);
            }
        }
        state.active = still_active;

        // 4. Invariants
        let readings = self.readings(state, history);
        state.invariants.observe(&readings);

        // 5. KPIs
        let window = history.window(cfg.kpi_window);
        let kpis = KpiMetrics {
            admission_rate: window.admission_rate(),
            failure_rate: window.failure_rate(),
            refusal_rate: window.refusal_rate(),
            total_requests: history.len() as u64,
            avg_payload: window.avg_payload(),
        };

        state.metrics = Metrics {
            entropy: state.entropy,
            coherence,
            syntropy,
            throughput: completed.len() as f64 * cfg.throughput_per_completion,
            load_percent: readings.load * 100.0,
            active_count: state.active.len(),
            kpis,
        };

        debug!(
            %mode,
            %domain,
            entropy = state.entropy,
            active = state.active.len(),
            completed = completed.len(),
            "Simulation tick"
        );

        TickReport {
            entropy_delta: state.entropy - previous,
            completed,
        }
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nea_common::{InvariantId, InvariantStatus, OutcomeReason, WorkStatus};
    use proptest::prelude::*;

    fn admitted(raw: u32, payload: f64) -> WorkUnit {
        WorkUnit::pending(WorkUnitId::new(raw), payload, 0).admit()
    }

    #[test]
    fn test_entropy_grows_with_load_in_traditional_mode() {
        let engine = SimulationEngine::default();
        let mut state = EngineState::default();
        let mut history = History::new();
        for raw in 0..4 {
            state.active.push(admitted(raw, 90.0));
        }

        let report = engine.tick(&mut state, &mut history, PolicyMode::Traditional, false);
        // 4 × 2.5 × 1.0 − 5
        assert_eq!(state.entropy, 5.0);
        assert_eq!(report.entropy_delta, 5.0);
        assert_eq!(state.metrics.coherence, 95.0);
    }

    #[test]
    fn test_entropy_clamped() {
        let engine = SimulationEngine::default();
        let mut history = History::new();

        let mut idle = EngineState::default();
        engine.tick(&mut idle, &mut history, PolicyMode::Traditional, false);
        assert_eq!(idle.entropy, 0.0);

        let mut hot = EngineState::new(Domain::Aerospace);
        hot.entropy = 99.0;
        for raw in 0..10 {
            hot.active.push(admitted(raw, 1000.0));
        }
        engine.tick(&mut hot, &mut history, PolicyMode::Reactive, true);
        assert_eq!(hot.entropy, 100.0);
        assert_eq!(hot.metrics.coherence, 0.0);
    }

    #[test]
    fn test_no_error_mode_never_grows_entropy() {
        let engine = SimulationEngine::default();
        let mut state = EngineState::default();
        let mut history = History::new();
        state.entropy = 7.0;
        for raw in 0..4 {
            state.active.push(admitted(raw, 90.0));
        }
        engine.tick(&mut state, &mut history, PolicyMode::NoError, true);
        assert_eq!(state.entropy, 2.0);
    }

    #[test]
    fn test_completion_recorded_same_tick() {
        let engine = SimulationEngine::default();
        let mut state = EngineState::default();
        let mut history = History::new();
        state.active.push(admitted(1, 30.0));
        state.active.push(admitted(2, 31.0));

        engine.tick(&mut state, &mut history, PolicyMode::NoError, false);
        assert_eq!(state.active.len(), 2);
        assert_eq!(state.active[0].payload, 15.0);
        assert!(history.is_empty());

        let report = engine.tick(&mut state, &mut history, PolicyMode::NoError, false);
        // 30 − 15 − 15 = 0 completes now; 31 leaves 1 behind
        assert_eq!(report.completed, vec![WorkUnitId::new(1)]);
        assert_eq!(state.active.len(), 1);
        assert_eq!(history.len(), 1);
        assert_eq!(history.recent(1)[0].status, WorkStatus::Completed);
        assert_eq!(state.metrics.throughput, 10.0);
        assert!(state.active.iter().all(|unit| unit.payload > 0.0));
    }

    #[test]
    fn test_stress_slows_transitions() {
        let engine = SimulationEngine::default();
        let mut state = EngineState::default();
        let mut history = History::new();
        state.active.push(admitted(1, 60.0));
        engine.tick(&mut state, &mut history, PolicyMode::Bounded, true);
        assert_eq!(state.active[0].payload, 52.5);
    }

    #[test]
    fn test_invariants_reevaluated() {
        let engine = SimulationEngine::default();
        let mut state = EngineState::new(Domain::Medical);
        let mut history = History::new();
        for raw in 0..3 {
            state.active.push(admitted(raw, 90.0));
        }
        engine.tick(&mut state, &mut history, PolicyMode::Traditional, false);

        let load = state.invariants.get(InvariantId::Load).unwrap();
        assert_eq!(load.current, 0.75);
        assert_eq!(load.status, InvariantStatus::Violated);
        // 3 × 2.5 × 1.2 − 5 = 4
        let entropy = state.invariants.get(InvariantId::Entropy).unwrap();
        assert!((entropy.current - 4.0).abs() < 1e-9);
        assert_eq!(entropy.status, InvariantStatus::Stable);
        assert_eq!(state.metrics.load_percent, 75.0);
    }

    #[test]
    fn test_syntropy_penalised_after_violation() {
        let engine = SimulationEngine::default();
        let mut state = EngineState::default();
        let mut history = History::new();

        engine.tick(&mut state, &mut history, PolicyMode::NoError, false);
        assert_eq!(state.metrics.syntropy, 100.0);

        state.invariants.observe(&BoundReadings {
            entropy: 50.0,
            load: 0.0,
            failure_rate: 0.0,
        });
        engine.tick(&mut state, &mut history, PolicyMode::NoError, false);
        assert!((state.metrics.syntropy - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_kpis_aggregate_window() {
        let engine = SimulationEngine::default();
        let mut state = EngineState::default();
        let mut history = History::new();
        history.record(admitted(1, 40.0).complete());
        history.record(admitted(2, 60.0).fail(OutcomeReason::RuntimeException));

        engine.tick(&mut state, &mut history, PolicyMode::Traditional, false);
        let kpis = state.metrics.kpis;
        assert_eq!(kpis.admission_rate, 50.0);
        assert_eq!(kpis.failure_rate, 50.0);
        assert_eq!(kpis.total_requests, 2);
        assert_eq!(kpis.avg_payload, 50.0);
        assert_eq!(state.invariants.get(InvariantId::FailureRate).unwrap().current, 50.0);
    }

    proptest! {
        #[test]
        fn prop_entropy_clamped_and_coherence_complementary(
            active in 0usize..12,
            start in 0.0f64..100.0,
            stress in any::<bool>(),
        ) {
            let engine = SimulationEngine::default();
            let mut state = EngineState::default();
            state.entropy = start;
            for i in 0..active {
                state.active.push(admitted(i as u32, 1000.0));
            }
            let mut history = History::new();
            for mode in PolicyMode::ALL {
                engine.tick(&mut state, &mut history, mode, stress);
                prop_assert!((0.0..=100.0).contains(&state.entropy));
                prop_assert!((state.metrics.coherence + state.entropy - 100.0).abs() < 1e-9);
            }
        }
    }
}
