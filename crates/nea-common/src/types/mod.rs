//! Core data types for NEA Studio

pub mod invariant;
pub mod metrics;
pub mod policy;
pub mod work_unit;
