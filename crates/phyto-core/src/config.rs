//! Gateway configuration types.
//!
//! Every field has a default, so an empty `config.toml` is a valid
//! configuration. Durations are expressed in whole seconds (or milliseconds
//! where sub-second values matter) to keep the file readable.

use crate::advisory::SamplingOptions;
use crate::classification::MAX_IMAGE_BYTES;
use crate::error::{PhytoError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub classifier: ClassifierConfig,
    pub advisor: AdvisorConfig,
    pub logging: LoggingConfig,
}

impl GatewayConfig {
    /// Checks invariants that serde defaults cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.classifier.command.is_empty() || self.classifier.command[0].trim().is_empty() {
            return Err(PhytoError::config("classifier.command must not be empty"));
        }
        if self.classifier.timeout_secs == 0 {
            return Err(PhytoError::config("classifier.timeout_secs must be positive"));
        }
        if self.classifier.max_image_bytes == 0 {
            return Err(PhytoError::config(
                "classifier.max_image_bytes must be positive",
            ));
        }
        if self.advisor.timeout_secs == 0 {
            return Err(PhytoError::config("advisor.timeout_secs must be positive"));
        }
        if self.advisor.base_url.trim().is_empty() {
            return Err(PhytoError::config("advisor.base_url must not be empty"));
        }
        if self.advisor.model.trim().is_empty() {
            return Err(PhytoError::config("advisor.model must not be empty"));
        }
        Ok(())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds to.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Program and leading arguments. The image path and the model path are
    /// appended as the last two arguments.
    pub command: Vec<String>,
    /// Model artifact handed to the engine. Read-only at request time.
    pub model_path: PathBuf,
    /// Working directory for the engine; inherits the server's when unset.
    pub working_dir: Option<PathBuf>,
    /// Directory for per-request image files; the system temp dir when unset.
    pub scratch_dir: Option<PathBuf>,
    pub timeout_secs: u64,
    pub max_image_bytes: usize,
}

impl ClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            command: vec!["python3".to_string(), "classify_image.py".to_string()],
            model_path: PathBuf::from("public").join("plant_disease_model.pth"),
            working_dir: None,
            scratch_dir: None,
            timeout_secs: 30,
            max_image_bytes: MAX_IMAGE_BYTES,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Base URL of the Ollama-compatible service.
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub sampling: SamplingOptions,
}

impl AdvisorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full URL of the non-streaming generate endpoint.
    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2:3b".to_string(),
            timeout_secs: 20,
            sampling: SamplingOptions::default(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub filter: String,
    /// Directory for daily-rotated log files. Console only when unset.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            directory: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GatewayConfig::default();
        config.validate().unwrap();
        assert_eq!(config.classifier.timeout(), Duration::from_secs(30));
        assert_eq!(config.advisor.timeout(), Duration::from_secs(20));
        assert_eq!(config.advisor.model, "llama3.2:3b");
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config, GatewayConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [classifier]
            command = ["/opt/engine/run"]
            timeout_secs = 5

            [advisor]
            base_url = "http://gpu-box:11434/"
            "#,
        )
        .unwrap();
        assert_eq!(config.classifier.command, vec!["/opt/engine/run"]);
        assert_eq!(config.classifier.timeout_secs, 5);
        assert_eq!(config.classifier.max_image_bytes, MAX_IMAGE_BYTES);
        assert_eq!(
            config.advisor.generate_url(),
            "http://gpu-box:11434/api/generate"
        );
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let mut config = GatewayConfig::default();
        config.classifier.timeout_secs = 0;
        assert!(config.validate().unwrap_err().is_config());

        let mut config = GatewayConfig::default();
        config.advisor.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_command() {
        let mut config = GatewayConfig::default();
        config.classifier.command.clear();
        assert!(config.validate().is_err());
    }
}
