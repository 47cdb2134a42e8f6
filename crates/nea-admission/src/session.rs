//! Simulation session
//!
//! Owns every piece of simulation state and drives it over virtual time.
//! Periodic work (tick, telemetry sampling, automated requests) and one-shot
//! delayed failures are events in a single [`Scheduler`]; each event is one
//! synchronous read-modify-write of the session.

use std::time::Duration;

use chrono::{DateTime, Utc};
use nea_common::{
    Domain, Invariant, Metrics, OutcomeReason, PolicyMode, RandomSource, StdRandom,
    TimeSeriesPoint, WorkUnit, WorkUnitId,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::engine::{EngineState, SimulationEngine, TickReport};
use crate::gate::{AdmissionGate, AdmissionOutcome};
use crate::history::{History, OutcomeCounts};
use crate::scheduler::Scheduler;
use crate::telemetry::TelemetrySink;
use crate::SimulationConfig;

/// Scheduled session events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Tick,
    Sample,
    AutoInject,
    DelayedFailure(WorkUnitId),
}

/// Mints ids that look opaque but never repeat within a session
#[derive(Debug, Clone)]
struct IdMint {
    salt: u32,
    next: u32,
}

impl IdMint {
    // odd multiplier: a bijection modulo 2^24
    const STRIDE: u32 = 0x9E37_79B1;

    fn new(rng: &mut dyn RandomSource) -> Self {
        Self {
            salt: rng.next_range(0, WorkUnitId::MASK),
            next: 0,
        }
    }

    fn mint(&mut self) -> WorkUnitId {
        let raw = self.next.wrapping_mul(Self::STRIDE).wrapping_add(self.salt);
        self.next = self.next.wrapping_add(1);
        WorkUnitId::new(raw)
    }
}

/// Read-only view of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub clock_ms: u64,
    pub mode: PolicyMode,
    pub domain: Domain,
    pub stress: bool,
    pub automation: bool,
    pub metrics: Metrics,
    pub invariants: Vec<Invariant>,
    pub active: Vec<WorkUnit>,
    /// Most recent terminal records, newest last
    pub recent: Vec<WorkUnit>,
    pub counts: OutcomeCounts,
    pub admitted_total: u64,
}

/// A single simulation session
pub struct Session {
    id: Uuid,
    config: SimulationConfig,
    engine: SimulationEngine,
    gate: AdmissionGate,
    state: EngineState,
    history: History,
    telemetry: TelemetrySink,
    scheduler: Scheduler<SessionEvent>,
    rng: Box<dyn RandomSource>,
    ids: IdMint,
    clock_ms: u64,
    mode: PolicyMode,
    stress: bool,
    automation: bool,
    admitted_total: u64,
}

impl Session {
    /// Create a session; periodic tick and sampling start immediately
    pub fn new(
        config: SimulationConfig,
        mode: PolicyMode,
        domain: Domain,
        mut rng: Box<dyn RandomSource>,
    ) -> Self {
        let engine = SimulationEngine::new(config.clone());
        let gate = AdmissionGate::new(engine.clone());
        let ids = IdMint::new(rng.as_mut());

        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(config.tick_ms.max(1), SessionEvent::Tick);
        scheduler.schedule_at(config.telemetry_ms.max(1), SessionEvent::Sample);

        let session = Self {
            id: Uuid::now_v7(),
            telemetry: TelemetrySink::new(config.telemetry_capacity),
            config,
            engine,
            gate,
            state: EngineState::new(domain),
            history: History::new(),
            scheduler,
            rng,
            ids,
            clock_ms: 0,
            mode,
            stress: false,
            automation: false,
            admitted_total: 0,
        };
        info!(session = %session.id, %mode, %domain, "Session created");
        session
    }

    /// Session with a `rand`-backed source, optionally seeded
    pub fn with_seed(
        config: SimulationConfig,
        mode: PolicyMode,
        domain: Domain,
        seed: Option<u64>,
    ) -> Self {
        let rng: Box<dyn RandomSource> = match seed {
            Some(seed) => Box::new(StdRandom::seeded(seed)),
            None => Box::new(StdRandom::from_entropy()),
        };
        Self::new(config, mode, domain, rng)
    }

    /// Move the session clock forward, firing every event that falls due.
    /// Returns the number of events fired.
    pub fn advance(&mut self, elapsed: Duration) -> usize {
        let target = self.clock_ms + elapsed.as_millis() as u64;
        let mut fired = 0;
        while let Some((due, event)) = self.scheduler.pop_due(target) {
            self.clock_ms = due;
            self.dispatch(due, event);
            fired += 1;
        }
        self.clock_ms = target;
        fired
    }

    fn dispatch(&mut self, due: u64, event: SessionEvent) {
        match event {
            SessionEvent::Tick => {
                self.tick();
                self.scheduler
                    .schedule_at(due + self.config.tick_ms.max(1), SessionEvent::Tick);
            }
            SessionEvent::Sample => {
                self.telemetry.sample(due, &self.state.metrics);
                self.scheduler
                    .schedule_at(due + self.config.telemetry_ms.max(1), SessionEvent::Sample);
            }
            SessionEvent::AutoInject => {
                if self.automation {
                    self.request_work();
                    self.scheduler
                        .schedule_at(due + self.auto_inject_interval(), SessionEvent::AutoInject);
                }
            }
            SessionEvent::DelayedFailure(id) => {
                self.fire_delayed_failure(id);
            }
        }
    }

    /// Run one engine tick now
    pub fn tick(&mut self) -> TickReport {
        self.engine
            .tick(&mut self.state, &mut self.history, self.mode, self.stress)
    }

    /// Inject one work unit through the admission gate
    #[instrument(skip(self), fields(session = %self.id, mode = %self.mode))]
    pub fn request_work(&mut self) -> AdmissionOutcome {
        let id = self.ids.mint();
        let outcome = self.gate.request_work(
            &mut self.state,
            &mut self.history,
            self.mode,
            id,
            self.clock_ms,
            self.rng.as_mut(),
        );
        if let AdmissionOutcome::Admitted {
            failure_scheduled, ..
        } = &outcome
        {
            self.admitted_total += 1;
            if *failure_scheduled {
                let due = self.clock_ms + self.config.failure_delay_ms;
                self.scheduler
                    .schedule_at(due, SessionEvent::DelayedFailure(id));
                debug!(%id, due, "Delayed failure scheduled");
            }
        }
        outcome
    }

    /// Fail an admitted unit if it is still executing.
    ///
    /// Units that completed before the failure fired are left alone, so a
    /// unit never gets a second terminal record.
    pub fn fire_delayed_failure(&mut self, id: WorkUnitId) -> bool {
        match self.state.take_active(id) {
            Some(unit) => {
                info!(%id, "Admitted work failed during execution");
                self.history.record(unit.fail(OutcomeReason::RuntimeException));
                true
            }
            None => {
                debug!(%id, "Delayed failure for settled unit ignored");
                false
            }
        }
    }

    #[instrument(skip(self), fields(session = %self.id))]
    pub fn set_mode(&mut self, mode: PolicyMode) {
        if self.mode != mode {
            info!(from = %self.mode, to = %mode, "Policy mode changed");
            self.mode = mode;
        }
    }

    /// Replace every invariant limit with the domain's table in one step
    #[instrument(skip(self), fields(session = %self.id))]
    pub fn set_domain(&mut self, domain: Domain) {
        self.state.invariants.apply_domain(domain);
        info!(%domain, "Operating domain applied");
    }

    #[instrument(skip(self), fields(session = %self.id))]
    pub fn set_stress(&mut self, enabled: bool) {
        if self.stress == enabled {
            return;
        }
        self.stress = enabled;
        info!(enabled, "Stress test toggled");
        if self.automation {
            self.reschedule_automation();
        }
    }

    #[instrument(skip(self), fields(session = %self.id))]
    pub fn set_automation(&mut self, enabled: bool) {
        if self.automation == enabled {
            return;
        }
        self.automation = enabled;
        info!(enabled, "Automated work requests toggled");
        if enabled {
            self.reschedule_automation();
        } else {
            self.scheduler
                .cancel_where(|event| *event == SessionEvent::AutoInject);
        }
    }

    fn reschedule_automation(&mut self) {
        self.scheduler
            .cancel_where(|event| *event == SessionEvent::AutoInject);
        let due = self.clock_ms + self.auto_inject_interval();
        self.scheduler.schedule_at(due, SessionEvent::AutoInject);
    }

    /// Automated request period; halved under stress
    pub fn auto_inject_interval(&self) -> u64 {
        if self.stress {
            (self.config.auto_inject_ms / 2).max(1)
        } else {
            self.config.auto_inject_ms.max(1)
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            generated_at: Utc::now(),
            clock_ms: self.clock_ms,
            mode: self.mode,
            domain: self.domain(),
            stress: self.stress,
            automation: self.automation,
            metrics: self.state.metrics,
            invariants: self.state.invariants.as_slice().to_vec(),
            active: self.state.active.clone(),
            recent: self.history.recent(self.config.display_window).to_vec(),
            counts: self.history.counts(),
            admitted_total: self.admitted_total,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn mode(&self) -> PolicyMode {
        self.mode
    }

    pub fn domain(&self) -> Domain {
        self.state.invariants.domain()
    }

    pub fn stress(&self) -> bool {
        self.stress
    }

    pub fn automation(&self) -> bool {
        self.automation
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Test and replay hook for forcing entropy
    pub fn state_mut(&mut self) -> &mut EngineState {
        &mut self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn telemetry(&self) -> Vec<TimeSeriesPoint> {
        self.telemetry.points()
    }

    pub fn admitted_total(&self) -> u64 {
        self.admitted_total
    }

    pub fn pending_events(&self) -> usize {
        self.scheduler.len()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("clock_ms", &self.clock_ms)
            .field("mode", &self.mode)
            .field("domain", &self.domain())
            .field("active", &self.state.active.len())
            .field("history", &self.history.len())
            .finish()
    }
}
