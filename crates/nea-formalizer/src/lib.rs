//! NEA Formalizer
//!
//! Turns a natural-language system description into a structured formal
//! document by calling a generative model. The result is advisory text for
//! display; it never feeds back into the admission engine.
//!
//! Call sites normally go through [`formalize_or_none`], which treats blank
//! input and every failure as "no result".

pub mod gemini;
pub mod prompt;
pub mod schema;

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

pub use gemini::GeminiFormalizer;
pub use schema::{
    ConstraintRecord, EngineeringSpec, FormalInvariant, FormalSchema, FormalizedSpec,
    InvarianceSpec,
};

/// Default Gemini endpoint
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model name
pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";

/// Trait for description formalizers
#[async_trait]
pub trait SpecFormalizer: Send + Sync {
    /// Produce a formal document for `description`
    async fn formalize(&self, description: &str) -> Result<FormalizedSpec, FormalizerError>;
}

/// Errors from formalizer calls
#[derive(Debug, thiserror::Error)]
pub enum FormalizerError {
    #[error("No API key configured")]
    MissingApiKey,

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Model returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("Model returned no content")]
    EmptyResponse,

    #[error("Response did not match schema: {0}")]
    Schema(String),
}

impl From<FormalizerError> for nea_common::NeaError {
    fn from(err: FormalizerError) -> Self {
        nea_common::NeaError::Formalizer(err.to_string())
    }
}

/// Connection and request settings for a formalizer
#[derive(Debug, Clone)]
pub struct FormalizerSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub schema: FormalSchema,
    pub timeout: Duration,
}

impl Default for FormalizerSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            schema: FormalSchema::default(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Formalize `description`, or `None` when blank or when the call fails
///
/// Blank input never reaches the formalizer. Failures are logged and
/// swallowed without retry.
pub async fn formalize_or_none(
    formalizer: &dyn SpecFormalizer,
    description: &str,
) -> Option<FormalizedSpec> {
    if description.trim().is_empty() {
        return None;
    }
    match formalizer.formalize(description).await {
        Ok(spec) => Some(spec),
        Err(e) => {
            warn!(error = %e, "Formalization failed");
            None
        }
    }
}
