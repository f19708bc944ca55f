use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use pixel_engine::{Engine, EngineConfig, EngineError};
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::gameplay::{self, CoinGame};

const CONFIG_ENV_VAR: &str = "PIXEL_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "pixel.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct DemoConfig {
    pub(crate) engine: EngineConfig,
    pub(crate) player_speed: f32,
    pub(crate) coin_rows: u32,
    pub(crate) coin_columns: u32,
    pub(crate) coin_sound: Option<PathBuf>,
    pub(crate) background: Option<PathBuf>,
    pub(crate) show_fps: bool,
    pub(crate) exit_when_cleared: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                container: "Pixel Demo".to_string(),
                ..EngineConfig::default()
            },
            player_speed: 160.0,
            coin_rows: 3,
            coin_columns: 5,
            coin_sound: None,
            background: None,
            show_fps: false,
            exit_when_cleared: false,
        }
    }
}

pub(crate) struct AppWiring {
    pub(crate) engine: Engine,
    pub(crate) game: CoinGame,
}

pub(crate) fn build_app() -> Result<AppWiring, EngineError> {
    init_tracing();
    info!("=== Pixel Demo Startup ===");

    let config = load_config(&resolve_config_path());
    let mut engine = Engine::init(config.engine.clone());
    let game = gameplay::setup(&mut engine, &config)?;

    Ok(AppWiring { engine, game })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Reads the demo config. A missing or malformed file falls back to defaults.
pub(crate) fn load_config(path: &Path) -> DemoConfig {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "config_missing_using_defaults");
            return DemoConfig::default();
        }
        Err(error) => {
            warn!(path = %path.display(), error = %error, "config_unreadable_using_defaults");
            return DemoConfig::default();
        }
    };

    match parse_config(&raw) {
        Ok(config) => {
            info!(path = %path.display(), "config_loaded");
            config
        }
        Err(message) => {
            warn!(path = %path.display(), error = %message, "config_invalid_using_defaults");
            DemoConfig::default()
        }
    }
}

fn parse_config(raw: &str) -> Result<DemoConfig, String> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, DemoConfig>(&mut deserializer) {
        Ok(config) => Ok(config),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(format!("parse config json: {source}"))
            } else {
                Err(format!("parse config json at {path}: {source}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_config(&dir.path().join("absent.json"));
        assert_eq!(config, DemoConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pixel.json");
        fs::write(
            &path,
            r#"{ "coin_rows": 1, "engine": { "width": 320, "max_delta_time_ms": 50 } }"#,
        )
        .expect("write");

        let config = load_config(&path);

        assert_eq!(config.coin_rows, 1);
        assert_eq!(config.coin_columns, DemoConfig::default().coin_columns);
        assert_eq!(config.engine.width, 320);
        assert_eq!(config.engine.height, 480);
        assert_eq!(config.engine.max_delta_time_ms, 50.0);
        assert_eq!(config.engine.container, "pixel");
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pixel.json");
        fs::write(&path, r#"{ "coin_rows": "many" }"#).expect("write");

        assert_eq!(load_config(&path), DemoConfig::default());
    }

    #[test]
    fn parse_error_names_the_offending_field() {
        let error = parse_config(r#"{ "engine": { "width": "wide" } }"#).expect_err("bad width");
        assert!(error.contains("engine.width"), "{error}");
    }

    #[test]
    fn syntax_error_has_no_field_path() {
        let error = parse_config("{").expect_err("truncated");
        assert!(error.starts_with("parse config json: "), "{error}");
    }
}
