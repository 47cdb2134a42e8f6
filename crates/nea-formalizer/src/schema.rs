//! Response schemas
//!
//! The formalizer asks the model for a JSON document in one of two shapes.
//! Both are display-only; nothing downstream evaluates them.

use std::fmt;
use std::str::FromStr;

use nea_common::ParseError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::FormalizerError;

/// Which document shape to request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormalSchema {
    /// TLA+-style formal logic block plus invariant list
    #[default]
    Invariance,
    /// Admission narrative, transitions, and constraint records
    Engineering,
}

impl FormalSchema {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormalSchema::Invariance => "INVARIANCE",
            FormalSchema::Engineering => "ENGINEERING",
        }
    }

    /// Schema sent as `generationConfig.responseSchema`
    pub fn response_schema(&self) -> Value {
        match self {
            FormalSchema::Invariance => json!({
                "type": "OBJECT",
                "properties": {
                    "moduleName": { "type": "STRING" },
                    "formalLogic": {
                        "type": "STRING",
                        "description": "TLA+ or formal logic block."
                    },
                    "invariants": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "property": { "type": "STRING" },
                                "definition": { "type": "STRING" },
                                "safetyCritical": { "type": "BOOLEAN" }
                            }
                        }
                    },
                    "preemptionStrategy": {
                        "type": "STRING",
                        "description": "How to refuse work to maintain invariants."
                    },
                    "summary": { "type": "STRING" }
                },
                "required": [
                    "moduleName",
                    "formalLogic",
                    "invariants",
                    "preemptionStrategy",
                    "summary"
                ]
            }),
            FormalSchema::Engineering => json!({
                "type": "OBJECT",
                "properties": {
                    "systemName": { "type": "STRING" },
                    "refusalLogic": {
                        "type": "STRING",
                        "description": "When and why work is refused before execution."
                    },
                    "atomicTransitions": {
                        "type": "ARRAY",
                        "items": { "type": "STRING" }
                    },
                    "constraints": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "metric": { "type": "STRING" },
                                "boundary": { "type": "STRING" },
                                "mechanism": { "type": "STRING" }
                            }
                        }
                    }
                },
                "required": ["systemName", "refusalLogic", "atomicTransitions", "constraints"]
            }),
        }
    }

    /// Decode the model's JSON text into this schema's document
    pub fn parse_document(&self, text: &str) -> Result<FormalizedSpec, FormalizerError> {
        let decoded = match self {
            FormalSchema::Invariance => {
                serde_json::from_str(text).map(FormalizedSpec::Invariance)
            }
            FormalSchema::Engineering => {
                serde_json::from_str(text).map(FormalizedSpec::Engineering)
            }
        };
        decoded.map_err(|e| FormalizerError::Schema(e.to_string()))
    }
}

impl fmt::Display for FormalSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormalSchema {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INVARIANCE" => Ok(FormalSchema::Invariance),
            "ENGINEERING" => Ok(FormalSchema::Engineering),
            _ => Err(ParseError::UnknownSchema(s.to_string())),
        }
    }
}

/// One invariant in an invariance document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormalInvariant {
    pub property: String,
    pub definition: String,
    #[serde(default)]
    pub safety_critical: bool,
}

/// Formal logic block plus invariant list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvarianceSpec {
    pub module_name: String,
    pub formal_logic: String,
    pub invariants: Vec<FormalInvariant>,
    pub preemption_strategy: String,
    pub summary: String,
}

/// One constraint record in an engineering document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintRecord {
    pub metric: String,
    pub boundary: String,
    pub mechanism: String,
}

/// Admission narrative with transitions and constraints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineeringSpec {
    pub system_name: String,
    pub refusal_logic: String,
    pub atomic_transitions: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<ConstraintRecord>,
}

/// A generated document, in whichever shape was requested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormalizedSpec {
    Invariance(InvarianceSpec),
    Engineering(EngineeringSpec),
}

impl FormalizedSpec {
    /// Module or system name
    pub fn title(&self) -> &str {
        match self {
            FormalizedSpec::Invariance(spec) => &spec.module_name,
            FormalizedSpec::Engineering(spec) => &spec.system_name,
        }
    }
}
