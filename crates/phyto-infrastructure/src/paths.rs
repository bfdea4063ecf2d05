//! Path management for phyto configuration and log files.
//!
//! ```text
//! ~/.config/phyto/             # Config directory (XDG on Linux)
//! ├── config.toml              # Gateway configuration
//! └── logs/                    # Daily-rotated logs
//!     └── phyto-server.log.YYYY-MM-DD
//! ```

use std::path::PathBuf;

const APP_DIR: &str = "phyto";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

pub struct PhytoPaths;

impl PhytoPaths {
    /// Returns the phyto configuration directory (e.g. `~/.config/phyto/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the default directory for rotated log files.
    pub fn logs_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir() {
        let config_dir = PhytoPaths::config_dir().unwrap();
        assert!(config_dir.ends_with("phyto"));
    }

    #[test]
    fn test_config_file() {
        let config_file = PhytoPaths::config_file().unwrap();
        assert!(config_file.ends_with("config.toml"));
        assert!(config_file.starts_with(PhytoPaths::config_dir().unwrap()));
    }

    #[test]
    fn test_logs_dir() {
        let logs_dir = PhytoPaths::logs_dir().unwrap();
        assert!(logs_dir.ends_with("logs"));
        assert!(logs_dir.starts_with(PhytoPaths::config_dir().unwrap()));
    }
}
