pub mod config_service;
pub mod logging;
pub mod paths;

pub use crate::config_service::{ConfigService, ConfigSource};
pub use crate::logging::{LogOutput, init_logging};
pub use crate::paths::{PathError, PhytoPaths};
