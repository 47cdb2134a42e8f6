//! Append-only history of terminal work units
//!
//! Entries are never mutated or removed; readers only see windows over the
//! most recent records.

use nea_common::{WorkStatus, WorkUnit, WorkUnitId};
use serde::{Deserialize, Serialize};

/// Cumulative terminal outcomes since the session started
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub completed: u64,
    pub failed: u64,
    pub refused: u64,
    pub preempted: u64,
}

impl OutcomeCounts {
    pub fn total(&self) -> u64 {
        self.completed + self.failed + self.refused + self.preempted
    }
}

/// Aggregates over a window of recent history
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowStats {
    /// Entries in the window
    pub len: usize,
    pub completed: usize,
    pub failed: usize,
    pub refused: usize,
    pub payload_sum: f64,
}

impl WindowStats {
    /// Empty windows count as one entry
    fn denominator(&self) -> f64 {
        self.len.max(1) as f64
    }

    pub fn admission_rate(&self) -> f64 {
        self.completed as f64 / self.denominator() * 100.0
    }

    pub fn failure_rate(&self) -> f64 {
        self.failed as f64 / self.denominator() * 100.0
    }

    pub fn refusal_rate(&self) -> f64 {
        self.refused as f64 / self.denominator() * 100.0
    }

    pub fn avg_payload(&self) -> f64 {
        if self.len == 0 {
            0.0
        } else {
            self.payload_sum / self.len as f64
        }
    }
}

/// Ordered log of terminal records
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<WorkUnit>,
    counts: OutcomeCounts,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a terminal record
    pub fn record(&mut self, unit: WorkUnit) {
        debug_assert!(unit.is_terminal(), "history only holds terminal records");
        match unit.status {
            WorkStatus::Completed => self.counts.completed += 1,
            WorkStatus::Failed => self.counts.failed += 1,
            WorkStatus::Refused => self.counts.refused += 1,
            WorkStatus::Preempted => self.counts.preempted += 1,
            WorkStatus::Pending | WorkStatus::Admitted => {}
        }
        self.entries.push(unit);
    }

    /// The most recent `n` records, oldest first
    pub fn recent(&self, n: usize) -> &[WorkUnit] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    /// Aggregate the most recent `n` records
    pub fn window(&self, n: usize) -> WindowStats {
        self.recent(n)
            .iter()
            .fold(WindowStats::default(), |mut stats, unit| {
                stats.len += 1;
                stats.payload_sum += unit.initial_payload;
                match unit.status {
                    WorkStatus::Completed => stats.completed += 1,
                    WorkStatus::Failed => stats.failed += 1,
                    WorkStatus::Refused | WorkStatus::Preempted => stats.refused += 1,
                    WorkStatus::Pending | WorkStatus::Admitted => {}
                }
                stats
            })
    }

    /// Terminal records for one unit; at most one by construction
    pub fn records_for(&self, id: WorkUnitId) -> impl Iterator<Item = &WorkUnit> {
        self.entries.iter().filter(move |unit| unit.id == id)
    }

    pub fn counts(&self) -> OutcomeCounts {
        self.counts
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkUnit> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nea_common::OutcomeReason;

    fn unit(raw: u32, payload: f64) -> WorkUnit {
        WorkUnit::pending(WorkUnitId::new(raw), payload, 0)
    }

    #[test]
    fn test_empty_window_counts_as_one() {
        let history = History::new();
        let stats = history.window(100);
        assert_eq!(stats.len, 0);
        assert_eq!(stats.admission_rate(), 0.0);
        assert_eq!(stats.failure_rate(), 0.0);
        assert_eq!(stats.avg_payload(), 0.0);
    }

    #[test]
    fn test_window_rates() {
        let mut history = History::new();
        history.record(unit(1, 40.0).admit().complete());
        history.record(unit(2, 60.0).admit().fail(OutcomeReason::RuntimeException));
        history.record(unit(3, 50.0).refuse(WorkStatus::Refused, OutcomeReason::SaturationReject));
        history.record(unit(4, 50.0).admit().complete());

        let stats = history.window(100);
        assert_eq!(stats.len, 4);
        assert_eq!(stats.admission_rate(), 50.0);
        assert_eq!(stats.failure_rate(), 25.0);
        assert_eq!(stats.refusal_rate(), 25.0);
        assert_eq!(stats.avg_payload(), 50.0);

        let counts = history.counts();
        assert_eq!(counts.completed, 2);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.refused, 1);
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn test_recent_is_bounded_and_ordered() {
        let mut history = History::new();
        for raw in 0..30 {
            history.record(unit(raw, 30.0).admit().complete());
        }
        let recent = history.recent(20);
        assert_eq!(recent.len(), 20);
        assert_eq!(recent[0].id, WorkUnitId::new(10));
        assert_eq!(recent[19].id, WorkUnitId::new(29));
        assert_eq!(history.window(5).len, 5);
        assert_eq!(history.len(), 30);
    }
}
