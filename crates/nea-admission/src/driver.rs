//! Wall-clock driver for a shared session
//!
//! Measures real elapsed time on a heartbeat and feeds it to
//! [`Session::advance`]. The session itself stays purely virtual-time.
//!
//! The virtual clock is brought up to the whole milliseconds elapsed since
//! the driver started, so sub-millisecond remainders never accumulate as lag.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::session::Session;

/// Shared handle to a session
pub type SharedSession = Arc<Mutex<Session>>;

/// Drives a session from the tokio clock
pub struct SessionDriver {
    session: SharedSession,
    heartbeat: Duration,
}

impl SessionDriver {
    pub fn new(session: SharedSession, heartbeat: Duration) -> Self {
        Self {
            session,
            heartbeat: heartbeat.max(Duration::from_millis(1)),
        }
    }

    pub fn session(&self) -> SharedSession {
        self.session.clone()
    }

    /// Start the background heartbeat
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.heartbeat);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let start = Instant::now();
            let origin_ms = self.session.lock().clock_ms();
            info!(heartbeat_ms = self.heartbeat.as_millis() as u64, "Session driver started");

            loop {
                interval.tick().await;
                let wall_ms = origin_ms + start.elapsed().as_millis() as u64;

                let (lag_ms, fired) = {
                    let mut session = self.session.lock();
                    let lag_ms = wall_ms.saturating_sub(session.clock_ms());
                    (lag_ms, session.advance(Duration::from_millis(lag_ms)))
                };
                if fired > 0 {
                    debug!(fired, lag_ms, "Session advanced");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimulationConfig;
    use nea_common::{Domain, PolicyMode, SequenceRandom};

    #[tokio::test(start_paused = true)]
    async fn test_driver_advances_session_clock() {
        let session = Arc::new(Mutex::new(Session::new(
            SimulationConfig::default(),
            PolicyMode::NoError,
            Domain::General,
            Box::new(SequenceRandom::constant(0.5)),
        )));
        let handle = SessionDriver::new(session.clone(), Duration::from_millis(100)).spawn();

        tokio::time::sleep(Duration::from_millis(2050)).await;
        {
            let s = session.lock();
            assert!(s.clock_ms() >= 1900);
            assert!(!s.telemetry().is_empty());
        }
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_fractional_heartbeat_does_not_lag() {
        let session = Arc::new(Mutex::new(Session::new(
            SimulationConfig::default(),
            PolicyMode::NoError,
            Domain::General,
            Box::new(SequenceRandom::constant(0.5)),
        )));
        let handle = SessionDriver::new(session.clone(), Duration::from_micros(1_500)).spawn();

        tokio::time::sleep(Duration::from_millis(3_000)).await;
        let clock = session.lock().clock_ms();
        assert!((2_950..=3_000).contains(&clock), "clock lagged to {clock}");
        handle.abort();
    }
}
