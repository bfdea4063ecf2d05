//! Configuration service implementation.
//!
//! Loads [`GatewayConfig`] from an explicit file, or from
//! `~/.config/phyto/config.toml` when present, then applies environment
//! overrides and validates the result.

use crate::paths::PhytoPaths;
use phyto_core::config::GatewayConfig;
use phyto_core::{PhytoError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

pub const ENV_BIND: &str = "PHYTO_BIND";
pub const ENV_ENGINE_COMMAND: &str = "PHYTO_ENGINE_COMMAND";
pub const ENV_MODEL_PATH: &str = "PHYTO_MODEL_PATH";
pub const ENV_OLLAMA_URL: &str = "PHYTO_OLLAMA_URL";
pub const ENV_OLLAMA_MODEL: &str = "PHYTO_OLLAMA_MODEL";

/// Where the configuration file is looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A path given on the command line. Missing file is an error.
    Explicit(PathBuf),
    /// The per-user config file. Missing file means defaults.
    UserDefault,
}

/// Loads and caches the gateway configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    source: ConfigSource,
    config: Arc<RwLock<Option<GatewayConfig>>>,
}

impl ConfigService {
    pub fn new(source: ConfigSource) -> Self {
        Self {
            source,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Uses `path` when given, the per-user file otherwise.
    pub fn from_cli(path: Option<PathBuf>) -> Self {
        Self::new(path.map_or(ConfigSource::UserDefault, ConfigSource::Explicit))
    }

    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    /// Returns the configuration, loading it on first access.
    pub fn get_config(&self) -> Result<GatewayConfig> {
        {
            let read_lock = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(cached) = read_lock.as_ref() {
                return Ok(cached.clone());
            }
        }

        let loaded = self.load()?;
        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = Some(loaded.clone());
        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = None;
    }

    fn load(&self) -> Result<GatewayConfig> {
        let mut config = match &self.source {
            ConfigSource::Explicit(path) => read_config_file(path)?,
            ConfigSource::UserDefault => match PhytoPaths::config_file() {
                Ok(path) if path.exists() => read_config_file(&path)?,
                Ok(path) => {
                    tracing::debug!(path = %path.display(), "No config file, using defaults");
                    GatewayConfig::default()
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Config directory unavailable, using defaults");
                    GatewayConfig::default()
                }
            },
        };

        apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Writes the default configuration to the per-user file if it is missing.
    pub fn ensure_config_file() -> Result<PathBuf> {
        let path = PhytoPaths::config_file().map_err(|e| PhytoError::config(e.to_string()))?;
        if path.exists() {
            return Ok(path);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let template = toml::to_string_pretty(&GatewayConfig::default()).map_err(|e| {
            PhytoError::Serialization {
                format: "toml".to_string(),
                message: e.to_string(),
            }
        })?;
        std::fs::write(&path, template)?;
        tracing::info!(path = %path.display(), "Wrote default configuration");
        Ok(path)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new(ConfigSource::UserDefault)
    }
}

fn read_config_file(path: &Path) -> Result<GatewayConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        PhytoError::config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let config: GatewayConfig = toml::from_str(&content)?;
    tracing::debug!(path = %path.display(), "Loaded configuration file");
    Ok(config)
}

/// Applies `PHYTO_*` overrides using `lookup` to read variables.
///
/// Blank values are ignored.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(bind) = get(ENV_BIND) {
        config.server.bind = bind.trim().to_string();
    }
    if let Some(command) = get(ENV_ENGINE_COMMAND) {
        config.classifier.command = command.split_whitespace().map(str::to_string).collect();
    }
    if let Some(model_path) = get(ENV_MODEL_PATH) {
        config.classifier.model_path = PathBuf::from(model_path.trim());
    }
    if let Some(url) = get(ENV_OLLAMA_URL) {
        config.advisor.base_url = url.trim().to_string();
    }
    if let Some(model) = get(ENV_OLLAMA_MODEL) {
        config.advisor.model = model.trim().to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_explicit_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.toml");
        std::fs::write(
            &path,
            r#"
            [server]
            bind = "0.0.0.0:8080"

            [classifier]
            timeout_secs = 12
            "#,
        )
        .unwrap();

        let service = ConfigService::from_cli(Some(path));
        let config = service.get_config().unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.classifier.timeout_secs, 12);
        assert_eq!(config.advisor.timeout_secs, 20);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let service = ConfigService::from_cli(Some(dir.path().join("absent.toml")));
        assert!(service.get_config().unwrap_err().is_config());
    }

    #[test]
    fn test_invalid_toml_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[classifier\ntimeout_secs = ").unwrap();

        let err = ConfigService::from_cli(Some(path)).get_config().unwrap_err();
        assert!(err.is_serialization());
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zero.toml");
        std::fs::write(&path, "[advisor]\ntimeout_secs = 0\n").unwrap();

        let err = ConfigService::from_cli(Some(path)).get_config().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_cache_and_invalidate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.toml");
        std::fs::write(&path, "[advisor]\nmodel = \"first\"\n").unwrap();
        let service = ConfigService::from_cli(Some(path.clone()));
        assert_eq!(service.get_config().unwrap().advisor.model, "first");

        std::fs::write(&path, "[advisor]\nmodel = \"second\"\n").unwrap();
        assert_eq!(service.get_config().unwrap().advisor.model, "first");

        service.invalidate_cache();
        assert_eq!(service.get_config().unwrap().advisor.model, "second");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = GatewayConfig::default();
        apply_env_overrides(
            &mut config,
            lookup(&[
                (ENV_BIND, "0.0.0.0:9000"),
                (ENV_ENGINE_COMMAND, "  /opt/venv/bin/python   engine.py  "),
                (ENV_MODEL_PATH, "/models/leaf.pth"),
                (ENV_OLLAMA_URL, "http://gpu:11434"),
                (ENV_OLLAMA_MODEL, "llama3.1:8b"),
            ]),
        );

        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(
            config.classifier.command,
            vec!["/opt/venv/bin/python", "engine.py"]
        );
        assert_eq!(config.classifier.model_path, PathBuf::from("/models/leaf.pth"));
        assert_eq!(config.advisor.base_url, "http://gpu:11434");
        assert_eq!(config.advisor.model, "llama3.1:8b");
    }

    #[test]
    fn test_blank_env_values_ignored() {
        let mut config = GatewayConfig::default();
        apply_env_overrides(&mut config, lookup(&[(ENV_ENGINE_COMMAND, "   ")]));
        assert_eq!(config, GatewayConfig::default());
    }
}
