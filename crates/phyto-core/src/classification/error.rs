//! Classification failure taxonomy.

use std::time::Duration;
use thiserror::Error;

/// Why a single `classify` call failed.
///
/// Every variant is scoped to one request; none of them is fatal to the
/// process serving it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassificationError {
    /// The caller supplied no usable image. User-correctable.
    #[error("{0}")]
    InvalidInput(String),

    /// The engine did not finish within its budget and was killed.
    #[error("Classification timeout after {}s", .budget.as_secs())]
    Timeout { budget: Duration },

    /// The engine exited unsuccessfully or reported an error record.
    #[error("Classification engine failed ({}): {stderr}", exit_label(.exit_code))]
    EngineFailure {
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The engine's output was not a single well-formed record.
    #[error("Failed to parse engine output: {reason}")]
    MalformedOutput { reason: String, raw: String },

    /// The transient image file could not be prepared.
    #[error("Transient storage error: {0}")]
    Storage(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

impl ClassificationError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn malformed(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::MalformedOutput {
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    pub fn engine_failure(exit_code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self::EngineFailure {
            exit_code,
            stderr: stderr.into(),
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether the same request may succeed if submitted again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::EngineFailure { .. } | Self::Storage(_)
        )
    }

    /// Text safe to hand back to a client.
    ///
    /// Malformed output is a bug signal and its raw content stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::MalformedOutput { .. } => {
                "Classification failed: the engine returned an unexpected result".to_string()
            }
            Self::InvalidInput(message) => message.clone(),
            other => format!("Classification failed: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_failure_message_carries_stderr() {
        let err = ClassificationError::engine_failure(Some(1), "model load error");
        assert!(err.public_message().contains("model load error"));
        assert!(err.to_string().contains("exit code 1"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_malformed_output_is_generic_for_clients() {
        let err = ClassificationError::malformed("expected value", "Traceback (most recent call)");
        assert!(!err.public_message().contains("Traceback"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_timeout_message() {
        let err = ClassificationError::Timeout {
            budget: Duration::from_secs(30),
        };
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Classification timeout after 30s");
    }
}
