//! NEA Studio configuration

use std::fmt;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use nea_admission::SimulationConfig;
use nea_common::{Domain, PolicyMode};
use nea_formalizer::{FormalSchema, FormalizerSettings};
use serde::{Deserialize, Serialize};

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudioConfig {
    /// Service host
    pub host: String,
    /// Service port
    pub port: u16,
    /// Wall-clock period at which the session is advanced (ms)
    pub heartbeat_ms: u64,
    /// Initial policy mode
    pub mode: PolicyMode,
    /// Initial operating domain
    pub domain: Domain,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
    /// Engine constants
    pub simulation: SimulationConfig,
    /// Formalizer connection
    pub formalizer: FormalizerConfig,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
            heartbeat_ms: 100,
            mode: PolicyMode::default(),
            domain: Domain::default(),
            seed: None,
            simulation: SimulationConfig::default(),
            formalizer: FormalizerConfig::default(),
        }
    }
}

impl StudioConfig {
    /// Load configuration from `.env` and the environment
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    ///
    /// Unparseable numbers are ignored and keep their default. Unknown mode,
    /// domain or schema names and zero periods are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        // Platform PORT first, NEA_PORT wins when both are set
        if let Some(p) = lookup("PORT").and_then(|v| v.parse().ok()) {
            cfg.port = p;
        }
        if let Some(host) = lookup("NEA_HOST") {
            cfg.host = host;
        }
        if let Some(p) = lookup("NEA_PORT").and_then(|v| v.parse().ok()) {
            cfg.port = p;
        }
        if let Some(v) = lookup("NEA_HEARTBEAT_MS").and_then(|v| v.parse().ok()) {
            cfg.heartbeat_ms = v;
        }

        // Simulation settings
        if let Some(v) = lookup("NEA_TICK_MS").and_then(|v| v.parse().ok()) {
            cfg.simulation.tick_ms = v;
        }
        if let Some(v) = lookup("NEA_TELEMETRY_MS").and_then(|v| v.parse().ok()) {
            cfg.simulation.telemetry_ms = v;
        }
        if let Some(v) = lookup("NEA_AUTO_INJECT_MS").and_then(|v| v.parse().ok()) {
            cfg.simulation.auto_inject_ms = v;
        }
        if let Some(v) = lookup("NEA_CAPACITY").and_then(|v| v.parse().ok()) {
            cfg.simulation.capacity = v;
        }
        if let Some(v) = lookup("NEA_SEED").and_then(|v| v.parse().ok()) {
            cfg.seed = Some(v);
        }
        if let Some(mode) = lookup("NEA_MODE") {
            cfg.mode = mode.parse().context("NEA_MODE")?;
        }
        if let Some(domain) = lookup("NEA_DOMAIN") {
            cfg.domain = domain.parse().context("NEA_DOMAIN")?;
        }

        // Formalizer settings
        cfg.formalizer.api_key = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("API_KEY"))
            .filter(|key| !key.trim().is_empty());
        if let Some(model) = lookup("NEA_FORMALIZER_MODEL") {
            cfg.formalizer.model = model;
        }
        if let Some(url) = lookup("NEA_FORMALIZER_URL") {
            cfg.formalizer.base_url = url;
        }
        if let Some(schema) = lookup("NEA_FORMALIZER_SCHEMA") {
            cfg.formalizer.schema = schema.parse().context("NEA_FORMALIZER_SCHEMA")?;
        }

        ensure!(cfg.simulation.tick_ms > 0, "NEA_TICK_MS must be greater than zero");
        ensure!(
            cfg.simulation.telemetry_ms > 0,
            "NEA_TELEMETRY_MS must be greater than zero"
        );
        ensure!(
            cfg.simulation.auto_inject_ms > 0,
            "NEA_AUTO_INJECT_MS must be greater than zero"
        );
        ensure!(cfg.heartbeat_ms > 0, "NEA_HEARTBEAT_MS must be greater than zero");

        Ok(cfg)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms)
    }
}

/// Formalizer settings
#[derive(Clone, Serialize, Deserialize)]
pub struct FormalizerConfig {
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub schema: FormalSchema,
    pub timeout_secs: u64,
}

impl Default for FormalizerConfig {
    fn default() -> Self {
        Self {
            base_url: nea_formalizer::DEFAULT_BASE_URL.to_string(),
            model: nea_formalizer::DEFAULT_MODEL.to_string(),
            api_key: None,
            schema: FormalSchema::default(),
            timeout_secs: 60,
        }
    }
}

impl FormalizerConfig {
    pub fn to_settings(&self) -> FormalizerSettings {
        FormalizerSettings {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            api_key: self.api_key.clone(),
            schema: self.schema,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

// Keeps the key out of startup logs
impl fmt::Debug for FormalizerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormalizerConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("schema", &self.schema)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
