//! Prompt templates

use crate::schema::FormalSchema;

const INVARIANCE_TEMPLATE: &str = "You are a Formal Methods Engineer. Convert the following system description into a Formal Invariance Specification.

Use TLA+ style logic for the 'formalLogic' field.
Focus on:
1. Type Invariants (Variables and their domains).
2. Safety Properties (What must never happen).
3. Transition Relations (Atomic state changes).

Description: ";

const ENGINEERING_TEMPLATE: &str = "You are a No-Error Architecture engineer. Convert the following system description into an engineering specification.

Describe the admission control that refuses work before execution begins, list the atomic state transitions, and give each constraint as a metric, its boundary, and the mechanism that enforces it.

Description: ";

/// Full prompt for `description` under `schema`
pub fn render(schema: FormalSchema, description: &str) -> String {
    let template = match schema {
        FormalSchema::Invariance => INVARIANCE_TEMPLATE,
        FormalSchema::Engineering => ENGINEERING_TEMPLATE,
    };
    format!("{template}{}", description.trim())
}
