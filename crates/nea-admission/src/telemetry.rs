//! Bounded time series for charting

use std::collections::VecDeque;

use nea_common::{Metrics, TimeSeriesPoint};

/// Ring of the most recent samples
#[derive(Debug, Clone)]
pub struct TelemetrySink {
    points: VecDeque<TimeSeriesPoint>,
    capacity: usize,
}

impl TelemetrySink {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Mirror the latest metrics snapshot; never recomputes anything
    pub fn sample(&mut self, time_ms: u64, metrics: &Metrics) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(TimeSeriesPoint::sample(time_ms, metrics));
    }

    pub fn points(&self) -> Vec<TimeSeriesPoint> {
        self.points.iter().copied().collect()
    }

    pub fn latest(&self) -> Option<&TimeSeriesPoint> {
        self.points.back()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
