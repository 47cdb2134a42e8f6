//! Policy modes and operating domains
//!
//! A [`PolicyMode`] decides how the admission gate treats new work and how
//! strongly concurrent load feeds entropy. A [`Domain`] is a preset of
//! invariant limits; switching domains replaces every limit at once.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::types::work_unit::WorkStatus;

/// Admission policy in force for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyMode {
    /// Admit everything, fail at run time
    Traditional,
    /// Admit everything, react to failures after the fact
    Reactive,
    /// Preempt work that would breach a bound
    Bounded,
    /// Refuse work before execution whenever the system is not coherent
    NoError,
}

impl PolicyMode {
    /// All modes in display order
    pub const ALL: [PolicyMode; 4] = [
        PolicyMode::Traditional,
        PolicyMode::Reactive,
        PolicyMode::Bounded,
        PolicyMode::NoError,
    ];

    /// Whether the gate evaluates bounds before admitting
    pub fn is_gated(&self) -> bool {
        matches!(self, PolicyMode::Bounded | PolicyMode::NoError)
    }

    /// Entropy produced per active unit per tick
    pub fn entropy_multiplier(&self) -> f64 {
        match self {
            PolicyMode::Traditional => 2.5,
            PolicyMode::Reactive => 3.5,
            PolicyMode::Bounded => 0.5,
            PolicyMode::NoError => 0.0,
        }
    }

    /// Terminal status recorded when the gate turns work away
    pub fn refusal_status(&self) -> WorkStatus {
        match self {
            PolicyMode::Bounded => WorkStatus::Preempted,
            _ => WorkStatus::Refused,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyMode::Traditional => "TRADITIONAL",
            PolicyMode::Reactive => "REACTIVE",
            PolicyMode::Bounded => "BOUNDED",
            PolicyMode::NoError => "NO_ERROR",
        }
    }
}

impl Default for PolicyMode {
    fn default() -> Self {
        PolicyMode::NoError
    }
}

impl fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        PolicyMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| ParseError::UnknownMode(s.to_string()))
    }
}

/// Invariant limits for one operating domain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainLimits {
    /// Entropy ceiling (%)
    pub entropy: f64,
    /// Maximum active/capacity ratio
    pub load: f64,
    /// Maximum windowed failure rate (%)
    pub failure_rate: f64,
}

/// Operating context preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Domain {
    General,
    Medical,
    Aerospace,
    Fintech,
}

impl Domain {
    pub const ALL: [Domain; 4] = [
        Domain::General,
        Domain::Medical,
        Domain::Aerospace,
        Domain::Fintech,
    ];

    /// Limit table for this domain
    pub fn limits(&self) -> DomainLimits {
        match self {
            Domain::General => DomainLimits {
                entropy: 20.0,
                load: 1.0,
                failure_rate: 10.0,
            },
            Domain::Medical => DomainLimits {
                entropy: 12.0,
                load: 0.75,
                failure_rate: 2.0,
            },
            Domain::Aerospace => DomainLimits {
                entropy: 8.0,
                load: 0.5,
                failure_rate: 1.0,
            },
            Domain::Fintech => DomainLimits {
                entropy: 15.0,
                load: 0.9,
                failure_rate: 5.0,
            },
        }
    }

    /// Scales entropy growth; stricter domains amplify instability
    pub fn entropy_multiplier(&self) -> f64 {
        match self {
            Domain::General => 1.0,
            Domain::Medical => 1.2,
            Domain::Aerospace => 1.5,
            Domain::Fintech => 1.3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::General => "GENERAL",
            Domain::Medical => "MEDICAL",
            Domain::Aerospace => "AEROSPACE",
            Domain::Fintech => "FINTECH",
        }
    }
}

impl Default for Domain {
    fn default() -> Self {
        Domain::General
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Domain::ALL
            .into_iter()
            .find(|domain| domain.as_str() == normalized)
            .ok_or_else(|| ParseError::UnknownDomain(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("no-error".parse::<PolicyMode>().unwrap(), PolicyMode::NoError);
        assert_eq!("Traditional".parse::<PolicyMode>().unwrap(), PolicyMode::Traditional);
        assert!("chaos".parse::<PolicyMode>().is_err());
    }

    #[test]
    fn test_gated_modes() {
        assert!(PolicyMode::Bounded.is_gated());
        assert!(PolicyMode::NoError.is_gated());
        assert!(!PolicyMode::Traditional.is_gated());
        assert!(!PolicyMode::Reactive.is_gated());
        assert_eq!(PolicyMode::Bounded.refusal_status(), WorkStatus::Preempted);
        assert_eq!(PolicyMode::NoError.refusal_status(), WorkStatus::Refused);
    }

    #[test]
    fn test_permissive_modes_amplify_entropy() {
        assert!(
            PolicyMode::Traditional.entropy_multiplier() > PolicyMode::Bounded.entropy_multiplier()
        );
        assert!(
            PolicyMode::Reactive.entropy_multiplier() > PolicyMode::Traditional.entropy_multiplier()
        );
        assert_eq!(PolicyMode::NoError.entropy_multiplier(), 0.0);
    }

    #[test]
    fn test_domain_limits_stricter_than_general() {
        let general = Domain::General.limits();
        for domain in [Domain::Medical, Domain::Aerospace, Domain::Fintech] {
            let limits = domain.limits();
            assert!(limits.entropy < general.entropy);
            assert!(limits.load < general.load);
            assert!(limits.failure_rate < general.failure_rate);
        }
    }

    #[test]
    fn test_serde_wire_names() {
        assert_eq!(serde_json::to_string(&PolicyMode::NoError).unwrap(), "\"NO_ERROR\"");
        assert_eq!(serde_json::to_string(&Domain::Aerospace).unwrap(), "\"AEROSPACE\"");
        let parsed: Domain = serde_json::from_str("\"FINTECH\"").unwrap();
        assert_eq!(parsed, Domain::Fintech);
    }
}
