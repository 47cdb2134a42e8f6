//! WorkUnit - one simulated unit of work and its lifecycle
//!
//! A unit is minted `Pending` at request time, then either turned away at
//! the gate (`Refused` / `Preempted`) or `Admitted` into the active set.
//! Admitted units end as `Completed` or `Failed`, exactly once.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::invariant::InvariantId;

/// Opaque work-unit identifier, rendered `REQ-XXXXXX`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkUnitId(u32);

impl WorkUnitId {
    /// Ids are six hex digits on the wire
    pub const MASK: u32 = 0x00FF_FFFF;

    pub fn new(raw: u32) -> Self {
        Self(raw & Self::MASK)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for WorkUnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "REQ-{:06X}", self.0)
    }
}

impl FromStr for WorkUnitId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix("REQ-")
            .ok_or_else(|| format!("work unit id must start with REQ-: {s}"))?;
        u32::from_str_radix(hex, 16)
            .map(WorkUnitId::new)
            .map_err(|e| format!("invalid work unit id {s}: {e}"))
    }
}

impl Serialize for WorkUnitId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WorkUnitId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkStatus {
    Pending,
    Admitted,
    Refused,
    Preempted,
    Failed,
    Completed,
}

impl WorkStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkStatus::Pending | WorkStatus::Admitted)
    }

    /// Turned away before execution
    pub fn is_refusal(&self) -> bool {
        matches!(self, WorkStatus::Refused | WorkStatus::Preempted)
    }
}

/// Diagnostic tag attached to terminal non-success outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeReason {
    /// Active set at capacity
    SaturationReject,
    /// Entropy above the instability threshold
    UnstableStateRefusal,
    /// A named invariant reading at or above its limit
    BoundBreach(InvariantId),
    /// Admitted unit failed during execution
    RuntimeException,
}

impl fmt::Display for OutcomeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeReason::SaturationReject => f.write_str("SATURATION_REJECT"),
            OutcomeReason::UnstableStateRefusal => f.write_str("UNSTABLE_STATE_REFUSAL"),
            OutcomeReason::BoundBreach(id) => write!(f, "BOUND_BREACH_{id}"),
            OutcomeReason::RuntimeException => f.write_str("RUN-TIME_EXCEPTION"),
        }
    }
}

impl FromStr for OutcomeReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SATURATION_REJECT" => Ok(OutcomeReason::SaturationReject),
            "UNSTABLE_STATE_REFUSAL" => Ok(OutcomeReason::UnstableStateRefusal),
            "RUN-TIME_EXCEPTION" => Ok(OutcomeReason::RuntimeException),
            other => other
                .strip_prefix("BOUND_BREACH_")
                .and_then(|id| id.parse().ok())
                .map(OutcomeReason::BoundBreach)
                .ok_or_else(|| format!("unknown outcome reason: {other}")),
        }
    }
}

impl Serialize for OutcomeReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OutcomeReason {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One simulated unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkUnit {
    pub id: WorkUnitId,
    /// Remaining work; strictly positive while the unit is active
    pub payload: f64,
    /// Payload at request time
    pub initial_payload: f64,
    /// Creation time on the session clock (ms)
    pub timestamp: u64,
    pub status: WorkStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<OutcomeReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_risk: Option<f64>,
}

impl WorkUnit {
    /// Mint a pending unit
    pub fn pending(id: WorkUnitId, payload: f64, timestamp: u64) -> Self {
        Self {
            id,
            payload,
            initial_payload: payload,
            timestamp,
            status: WorkStatus::Pending,
            reason: None,
            failure_risk: None,
        }
    }

    pub fn admit(mut self) -> Self {
        debug_assert_eq!(self.status, WorkStatus::Pending);
        self.status = WorkStatus::Admitted;
        self
    }

    /// Turn the unit away at the gate
    pub fn refuse(mut self, status: WorkStatus, reason: OutcomeReason) -> Self {
        debug_assert!(status.is_refusal());
        self.status = status;
        self.reason = Some(reason);
        self
    }

    pub fn complete(mut self) -> Self {
        debug_assert_eq!(self.status, WorkStatus::Admitted);
        self.status = WorkStatus::Completed;
        self
    }

    pub fn fail(mut self, reason: OutcomeReason) -> Self {
        debug_assert_eq!(self.status, WorkStatus::Admitted);
        self.status = WorkStatus::Failed;
        self.reason = Some(reason);
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Short log line: reason if present, payload otherwise
    pub fn summary(&self) -> String {
        match self.reason {
            Some(reason) => reason.to_string(),
            None => format!("Payload: {}", self.initial_payload.round()),
        }
    }
}
