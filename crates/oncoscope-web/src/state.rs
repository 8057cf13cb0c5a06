//! Shared application state and environment-driven configuration.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use oncoscope_cohort::Jitter;
use oncoscope_common::OncoscopeError;

/// Runtime configuration, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the external prediction backend, e.g.
    /// `http://localhost:5000`. None disables delegation entirely.
    pub backend_url: Option<String>,
    pub bind_addr: SocketAddr,
    /// Deadline for delegated single predictions.
    pub predict_timeout: Duration,
    /// Deadline for delegated batch uploads (larger payloads).
    pub upload_timeout: Duration,
    /// Jitter policy: `None` = entropy-seeded, `Some(seed)` = seeded.
    /// Overridden by `jitter_enabled = false` for deterministic output.
    pub jitter_seed: Option<u64>,
    pub jitter_enabled: bool,
    /// Artificial per-request latency to mimic model inference for the
    /// demo UI. Off by default.
    pub simulated_latency: Option<Duration>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            predict_timeout: Duration::from_secs(5),
            upload_timeout: Duration::from_secs(15),
            jitter_seed: None,
            jitter_enabled: true,
            simulated_latency: None,
        }
    }
}

impl AppConfig {
    /// Read configuration from the environment.
    ///
    /// Recognized variables: `BACKEND_URL`, `ONCOSCOPE_ADDR`,
    /// `ONCOSCOPE_PREDICT_TIMEOUT_SECS`, `ONCOSCOPE_UPLOAD_TIMEOUT_SECS`,
    /// `ONCOSCOPE_JITTER` ("off" | "random" | a numeric seed),
    /// `ONCOSCOPE_SIMULATED_LATENCY_MS`.
    pub fn from_env() -> Result<Self, OncoscopeError> {
        let mut cfg = Self::default();

        if let Ok(url) = std::env::var("BACKEND_URL") {
            if !url.trim().is_empty() {
                cfg.backend_url = Some(url.trim_end_matches('/').to_string());
            }
        }

        if let Ok(addr) = std::env::var("ONCOSCOPE_ADDR") {
            cfg.bind_addr = addr
                .parse()
                .map_err(|e| OncoscopeError::Config(format!("invalid ONCOSCOPE_ADDR: {e}")))?;
        }

        if let Some(secs) = env_u64("ONCOSCOPE_PREDICT_TIMEOUT_SECS")? {
            cfg.predict_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("ONCOSCOPE_UPLOAD_TIMEOUT_SECS")? {
            cfg.upload_timeout = Duration::from_secs(secs);
        }

        match std::env::var("ONCOSCOPE_JITTER").as_deref() {
            Ok("off") => cfg.jitter_enabled = false,
            Ok("random") | Err(_) => {}
            Ok(raw) => {
                let seed = raw.parse().map_err(|e| {
                    OncoscopeError::Config(format!("invalid ONCOSCOPE_JITTER seed: {e}"))
                })?;
                cfg.jitter_seed = Some(seed);
            }
        }

        if let Some(ms) = env_u64("ONCOSCOPE_SIMULATED_LATENCY_MS")? {
            if ms > 0 {
                cfg.simulated_latency = Some(Duration::from_millis(ms));
            }
        }

        Ok(cfg)
    }

    /// Fresh jitter source for one request. Requests are stateless, so
    /// a fixed seed makes every request reproduce the same noise.
    pub fn jitter(&self) -> Jitter {
        if !self.jitter_enabled {
            Jitter::Disabled
        } else {
            match self.jitter_seed {
                Some(seed) => Jitter::seeded(seed),
                None => Jitter::random(),
            }
        }
    }

    /// Deterministic test configuration: no jitter, no delegate, no delay.
    pub fn deterministic() -> Self {
        Self {
            jitter_enabled: false,
            ..Self::default()
        }
    }
}

fn env_u64(key: &str) -> Result<Option<u64>, OncoscopeError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| OncoscopeError::Config(format!("invalid {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Shared state injected into every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub scorer: crate::delegate::FallbackScorer,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, OncoscopeError> {
        let scorer = crate::delegate::FallbackScorer::from_config(&config)?;
        Ok(Self { config, scorer })
    }
}

pub type SharedState = Arc<AppState>;
