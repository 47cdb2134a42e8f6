//! End-to-end admission and lifecycle properties of a simulation session

use std::collections::HashMap;
use std::time::Duration;

use nea_admission::{AdmissionOutcome, Session, SimulationConfig};
use nea_common::{
    Domain, InvariantId, InvariantStatus, OutcomeReason, PolicyMode, SequenceRandom, StdRandom,
    WorkStatus, WorkUnitId,
};

fn session_with(mode: PolicyMode, domain: Domain, values: Vec<f64>) -> Session {
    Session::new(
        SimulationConfig::default(),
        mode,
        domain,
        Box::new(SequenceRandom::new(values)),
    )
}

#[test]
fn bounded_mode_refuses_fifth_unit_at_capacity() {
    let mut session = session_with(PolicyMode::Bounded, Domain::General, vec![0.5]);
    for _ in 0..4 {
        assert!(session.request_work().is_admitted());
    }
    assert_eq!(session.state().active.len(), 4);

    let outcome = session.request_work();
    let unit = outcome.unit();
    assert!(!outcome.is_admitted());
    assert_eq!(unit.status, WorkStatus::Preempted);
    assert!(matches!(
        unit.reason,
        Some(OutcomeReason::BoundBreach(InvariantId::Load)) | Some(OutcomeReason::SaturationReject)
    ));
    assert_eq!(session.state().active.len(), 4);
    assert_eq!(session.history().len(), 1);
}

#[test]
fn no_error_mode_saturation_reject_at_capacity() {
    let mut session = session_with(PolicyMode::NoError, Domain::General, vec![0.5]);
    for _ in 0..4 {
        session.request_work();
    }
    let outcome = session.request_work();
    assert_eq!(outcome.unit().status, WorkStatus::Refused);
    assert_eq!(outcome.unit().reason, Some(OutcomeReason::SaturationReject));
    assert_eq!(session.state().active.len(), 4);
}

#[test]
fn violated_entropy_bound_refuses_regardless_of_load() {
    let mut session = session_with(PolicyMode::Bounded, Domain::Medical, vec![0.5]);
    session.state_mut().entropy = 15.0;

    for _ in 0..3 {
        let outcome = session.request_work();
        assert_eq!(
            outcome.unit().reason,
            Some(OutcomeReason::BoundBreach(InvariantId::Entropy))
        );
        assert!(session.state().active.is_empty());
    }
}

#[test]
fn repeated_refusals_are_independent_records() {
    let mut session = session_with(PolicyMode::NoError, Domain::General, vec![0.5]);
    session.state_mut().entropy = 50.0;

    let first = session.request_work();
    let second = session.request_work();
    assert_ne!(first.unit().id, second.unit().id);
    assert_eq!(session.history().len(), 2);
    assert!(session.history().iter().all(|u| u.status == WorkStatus::Refused));
    assert!(session.state().active.is_empty());
}

#[test]
fn permissive_modes_always_admit_exactly_one() {
    for mode in [PolicyMode::Traditional, PolicyMode::Reactive] {
        let mut session = session_with(mode, Domain::Aerospace, vec![0.5, 0.99]);
        session.state_mut().entropy = 90.0;
        for expected in 1..=12 {
            let before = session.state().active.len();
            let outcome = session.request_work();
            assert!(outcome.is_admitted());
            assert_eq!(session.state().active.len(), before + 1);
            assert_eq!(session.admitted_total(), expected);
        }
    }
}

#[test]
fn payload_strictly_decreases_and_completion_is_same_tick() {
    let mut session = session_with(PolicyMode::NoError, Domain::General, vec![0.0, 0.5]);
    session.request_work();
    session.request_work();
    let mut previous: HashMap<WorkUnitId, f64> = session
        .state()
        .active
        .iter()
        .map(|u| (u.id, u.payload))
        .collect();

    for _ in 0..10 {
        let report = session.tick();
        for unit in &session.state().active {
            assert!(unit.payload > 0.0);
            assert!(unit.payload < previous[&unit.id]);
        }
        for id in &report.completed {
            assert!(previous[id] - 15.0 <= 0.0);
            assert_eq!(session.history().records_for(*id).count(), 1);
        }
        previous = session
            .state()
            .active
            .iter()
            .map(|u| (u.id, u.payload))
            .collect();
    }
    assert!(session.state().active.is_empty());
    assert_eq!(session.history().counts().completed, 2);
}

#[test]
fn every_unit_reaches_exactly_one_terminal_status() {
    let mut session = Session::new(
        SimulationConfig {
            transition_speed: 40.0,
            failure_delay_ms: 700,
            ..SimulationConfig::default()
        },
        PolicyMode::Traditional,
        Domain::General,
        Box::new(StdRandom::seeded(7)),
    );
    session.set_automation(true);
    session.set_stress(true);

    let mut requested = Vec::new();
    for _ in 0..200 {
        requested.push(session.request_work().unit().id);
        session.advance(Duration::from_millis(250));
    }
    session.set_automation(false);
    session.advance(Duration::from_secs(30));

    assert!(session.state().active.is_empty());
    for id in requested {
        let statuses: Vec<_> = session.history().records_for(id).map(|u| u.status).collect();
        assert_eq!(statuses.len(), 1, "unit {id} has {statuses:?}");
        assert!(statuses[0].is_terminal());
    }
}

#[test]
fn domain_switch_replaces_every_limit() {
    let mut session = session_with(PolicyMode::Bounded, Domain::General, vec![0.5]);
    for domain in [Domain::Aerospace, Domain::Fintech, Domain::Medical, Domain::General] {
        session.set_domain(domain);
        let limits = domain.limits();
        for inv in session.state().invariants.iter() {
            let expected = match inv.id {
                InvariantId::Entropy => limits.entropy,
                InvariantId::Load => limits.load,
                InvariantId::FailureRate => limits.failure_rate,
            };
            assert_eq!(inv.limit, expected, "{} stale after switch to {domain}", inv.id);
            assert_eq!(inv.status, InvariantStatus::classify(inv.current, inv.limit));
        }
    }
}

#[test]
fn base_failure_rate_converges_at_zero_entropy() {
    const TRIALS: u64 = 10_000;
    let mut failed = 0u64;
    for seed in 0..TRIALS {
        let mut session = Session::new(
            SimulationConfig::default(),
            PolicyMode::Reactive,
            Domain::General,
            Box::new(StdRandom::seeded(seed)),
        );
        assert_eq!(session.state().entropy, 0.0);
        let outcome = session.request_work();
        assert!(matches!(outcome, AdmissionOutcome::Admitted { .. }));
        session.advance(Duration::from_millis(300));
        failed += session.history().counts().failed;
    }
    let fraction = failed as f64 / TRIALS as f64;
    assert!((0.04..0.06).contains(&fraction), "observed failure fraction {fraction}");
}

#[test]
fn telemetry_mirrors_latest_metrics() {
    let mut session = session_with(PolicyMode::Traditional, Domain::General, vec![0.5, 0.99]);
    for _ in 0..4 {
        session.request_work();
    }
    session.advance(Duration::from_millis(1000));
    let point = *session.telemetry().last().unwrap();
    let metrics = session.state().metrics;
    assert_eq!(point.entropy, metrics.entropy);
    assert_eq!(point.coherence, metrics.coherence);
    assert_eq!(point.time_ms, 1000);

    session.advance(Duration::from_secs(120));
    assert_eq!(session.telemetry().len(), 40);
}
