use std::env;

use serde::Deserialize;
use tracing::warn;

use super::timing::{normalize_max_delta_time, DEFAULT_MAX_DELTA_TIME_MS};

pub const MAX_DELTA_ENV_VAR: &str = "PIXEL_MAX_DELTA_MS";

/// Initialization parameters for an [`Engine`](crate::Engine).
///
/// `container` names the host surface. The winit host uses it as the window
/// title; nothing fails if a host cannot resolve it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub container: String,
    pub width: u32,
    pub height: u32,
    pub max_delta_time_ms: f64,
    pub clear_color: [u8; 4],
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            container: "pixel".to_string(),
            width: 640,
            height: 480,
            max_delta_time_ms: DEFAULT_MAX_DELTA_TIME_MS,
            clear_color: [0, 0, 0, 255],
        }
    }
}

impl EngineConfig {
    /// Delta-time ceiling after applying the environment override.
    pub fn resolved_max_delta_time_ms(&self) -> f64 {
        resolve_max_delta_time(env::var(MAX_DELTA_ENV_VAR), self.max_delta_time_ms)
    }
}

fn resolve_max_delta_time(env_value: Result<String, env::VarError>, config_ms: f64) -> f64 {
    let chosen = match env_value {
        Ok(value) => match value.trim().parse::<f64>() {
            Ok(ms) => ms,
            Err(_) => {
                warn!(
                    env_var = MAX_DELTA_ENV_VAR,
                    value = value.as_str(),
                    "invalid max-delta env var value; falling back to config"
                );
                config_ms
            }
        },
        Err(env::VarError::NotPresent) => config_ms,
        Err(err) => {
            warn!(
                env_var = MAX_DELTA_ENV_VAR,
                error = %err,
                "unable to read max-delta env var; falling back to config"
            );
            config_ms
        }
    };

    let normalized = normalize_max_delta_time(chosen);
    if normalized != chosen {
        warn!(
            max_delta_time_ms = chosen,
            fallback_ms = normalized,
            "max delta time must be positive and finite"
        );
    }
    normalized
}
