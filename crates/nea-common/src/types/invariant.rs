//! Invariants - named bounds checked every tick and at the admission gate
//!
//! ## Status Rule
//!
//! ```text
//! VIOLATED  if current ≥ limit
//! WARNING   if current ≥ 0.75 × limit
//! STABLE    otherwise
//! ```
//!
//! Limits come from the active [`Domain`] and are only ever replaced as a set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::policy::{Domain, DomainLimits};

/// Fraction of the limit at which a bound starts warning
pub const WARNING_RATIO: f64 = 0.75;

/// Catalogue of bound identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InvariantId {
    Entropy,
    Load,
    FailureRate,
}

impl InvariantId {
    /// Catalogue order; the gate reports the first breach in this order
    pub const ALL: [InvariantId; 3] = [
        InvariantId::Entropy,
        InvariantId::Load,
        InvariantId::FailureRate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvariantId::Entropy => "inv_entropy",
            InvariantId::Load => "inv_load",
            InvariantId::FailureRate => "inv_failure",
        }
    }
}

impl fmt::Display for InvariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvariantId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InvariantId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown invariant id: {s}"))
    }
}

impl Serialize for InvariantId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for InvariantId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Bound health
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvariantStatus {
    Stable,
    Warning,
    Violated,
}

impl InvariantStatus {
    /// Pure function of reading against limit
    pub fn classify(current: f64, limit: f64) -> Self {
        if current >= limit {
            InvariantStatus::Violated
        } else if current >= WARNING_RATIO * limit {
            InvariantStatus::Warning
        } else {
            InvariantStatus::Stable
        }
    }
}

/// Fresh readings for every bound in the catalogue
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundReadings {
    /// Entropy (%)
    pub entropy: f64,
    /// Active units over capacity
    pub load: f64,
    /// Windowed failure rate (%)
    pub failure_rate: f64,
}

impl BoundReadings {
    pub fn get(&self, id: InvariantId) -> f64 {
        match id {
            InvariantId::Entropy => self.entropy,
            InvariantId::Load => self.load,
            InvariantId::FailureRate => self.failure_rate,
        }
    }
}

/// A named threshold with its latest reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invariant {
    pub id: InvariantId,
    pub name: String,
    /// Human-readable formal statement; never evaluated
    pub expression: String,
    pub limit: f64,
    pub current: f64,
    pub unit: String,
    pub status: InvariantStatus,
    pub safety_critical: bool,
}

impl Invariant {
    fn new(id: InvariantId, limits: &DomainLimits) -> Self {
        let (name, expression, unit, safety_critical) = match id {
            InvariantId::Entropy => ("Entropy Ceiling", "□(H < H_max)", "%", true),
            InvariantId::Load => ("Capacity Bound", "□(|active| / C < L_max)", "ratio", false),
            InvariantId::FailureRate => ("Failure Budget", "□(failed / total < F_max)", "%", true),
        };
        Self {
            id,
            name: name.to_string(),
            expression: expression.to_string(),
            limit: limit_for(id, limits),
            current: 0.0,
            unit: unit.to_string(),
            status: InvariantStatus::Stable,
            safety_critical,
        }
    }

    /// Record a new reading and re-derive status
    pub fn observe(&mut self, current: f64) {
        self.current = current;
        self.status = InvariantStatus::classify(self.current, self.limit);
    }

    /// Would this reading breach the bound
    pub fn is_breached_by(&self, reading: f64) -> bool {
        InvariantStatus::classify(reading, self.limit) == InvariantStatus::Violated
    }
}

fn limit_for(id: InvariantId, limits: &DomainLimits) -> f64 {
    match id {
        InvariantId::Entropy => limits.entropy,
        InvariantId::Load => limits.load,
        InvariantId::FailureRate => limits.failure_rate,
    }
}

/// The full catalogue of bounds for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvariantSet {
    domain: Domain,
    invariants: Vec<Invariant>,
}

impl InvariantSet {
    /// Catalogue with limits taken from `domain`
    pub fn for_domain(domain: Domain) -> Self {
        let limits = domain.limits();
        Self {
            domain,
            invariants: InvariantId::ALL
                .into_iter()
                .map(|id| Invariant::new(id, &limits))
                .collect(),
        }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Replace every limit with the domain's table and re-derive statuses.
    ///
    /// Takes `&mut self`, so no reader can observe a half-applied table.
    pub fn apply_domain(&mut self, domain: Domain) {
        let limits = domain.limits();
        for inv in self.invariants.iter_mut() {
            inv.limit = limit_for(inv.id, &limits);
            inv.status = InvariantStatus::classify(inv.current, inv.limit);
        }
        self.domain = domain;
    }

    /// Record readings for every bound
    pub fn observe(&mut self, readings: &BoundReadings) {
        for inv in self.invariants.iter_mut() {
            inv.observe(readings.get(inv.id));
        }
    }

    /// First bound, in catalogue order, that `readings` would breach
    pub fn first_breach(&self, readings: &BoundReadings) -> Option<InvariantId> {
        self.invariants
            .iter()
            .find(|inv| inv.is_breached_by(readings.get(inv.id)))
            .map(|inv| inv.id)
    }

    /// Whether any recorded status is VIOLATED
    pub fn any_violated(&self) -> bool {
        self.invariants
            .iter()
            .any(|inv| inv.status == InvariantStatus::Violated)
    }

    pub fn get(&self, id: InvariantId) -> Option<&Invariant> {
        self.invariants.iter().find(|inv| inv.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Invariant> {
        self.invariants.iter()
    }

    pub fn as_slice(&self) -> &[Invariant] {
        &self.invariants
    }
}

impl Default for InvariantSet {
    fn default() -> Self {
        Self::for_domain(Domain::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_status_boundaries() {
        assert_eq!(InvariantStatus::classify(20.0, 20.0), InvariantStatus::Violated);
        assert_eq!(InvariantStatus::classify(19.99, 20.0), InvariantStatus::Warning);
        assert_eq!(InvariantStatus::classify(15.0, 20.0), InvariantStatus::Warning);
        assert_eq!(InvariantStatus::classify(14.99, 20.0), InvariantStatus::Stable);
        assert_eq!(InvariantStatus::classify(0.0, 20.0), InvariantStatus::Stable);
    }

    #[test]
    fn test_catalogue_matches_domain() {
        let set = InvariantSet::for_domain(Domain::Medical);
        assert_eq!(set.as_slice().len(), 3);
        assert_eq!(set.get(InvariantId::Entropy).unwrap().limit, 12.0);
        assert_eq!(set.get(InvariantId::Load).unwrap().limit, 0.75);
        assert!(set.get(InvariantId::Entropy).unwrap().safety_critical);
        assert!(!set.get(InvariantId::Load).unwrap().safety_critical);
    }

    #[test]
    fn test_apply_domain_replaces_all_limits() {
        let mut set = InvariantSet::for_domain(Domain::General);
        set.observe(&BoundReadings {
            entropy: 10.0,
            load: 0.5,
            failure_rate: 0.0,
        });
        assert!(!set.any_violated());

        set.apply_domain(Domain::Aerospace);
        let limits = Domain::Aerospace.limits();
        assert_eq!(set.domain(), Domain::Aerospace);
        for inv in set.iter() {
            let expected = match inv.id {
                InvariantId::Entropy => limits.entropy,
                InvariantId::Load => limits.load,
                InvariantId::FailureRate => limits.failure_rate,
            };
            assert_eq!(inv.limit, expected);
        }
        // readings and catalogue order survive the swap
        let ids: Vec<_> = set.iter().map(|inv| inv.id).collect();
        assert_eq!(ids, InvariantId::ALL.to_vec());
        assert_eq!(set.get(InvariantId::Entropy).unwrap().current, 10.0);
        assert_eq!(set.get(InvariantId::Load).unwrap().current, 0.5);
        // 10 ≥ 8 and 0.5 ≥ 0.5 under the stricter table
        assert_eq!(set.get(InvariantId::Entropy).unwrap().status, InvariantStatus::Violated);
        assert_eq!(set.get(InvariantId::Load).unwrap().status, InvariantStatus::Violated);
    }

    #[test]
    fn test_first_breach_in_catalogue_order() {
        let set = InvariantSet::for_domain(Domain::General);
        let readings = BoundReadings {
            entropy: 25.0,
            load: 1.0,
            failure_rate: 0.0,
        };
        assert_eq!(set.first_breach(&readings), Some(InvariantId::Entropy));

        let readings = BoundReadings {
            entropy: 0.0,
            load: 1.0,
            failure_rate: 0.0,
        };
        assert_eq!(set.first_breach(&readings), Some(InvariantId::Load));
        assert_eq!(set.first_breach(&BoundReadings::default()), None);
    }

    proptest! {
        #[test]
        fn prop_status_is_pure_threshold_function(
            current in 0.0f64..200.0,
            limit in 0.1f64..100.0,
        ) {
            let status = InvariantStatus::classify(current, limit);
            let expected = if current >= limit {
                InvariantStatus::Violated
            } else if current >= 0.75 * limit {
                InvariantStatus::Warning
            } else {
                InvariantStatus::Stable
            };
            prop_assert_eq!(status, expected);
            prop_assert_eq!(status, InvariantStatus::classify(current, limit));
        }
    }
}
