//! Errors surfaced by the client flows.

use phyto_core::chat::ChatError;
use phyto_core::classification::ClassificationError;
use std::time::Duration;
use thiserror::Error;

const FAILED_PREFIX: &str = "Classification failed";

/// Failure talking to the diagnosis gateway.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// The gateway answered with a non-2xx status and an error message.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("gateway unreachable: {0}")]
    Transport(String),

    #[error("request timed out after {}s", .budget.as_secs())]
    Timeout { budget: Duration },

    #[error("unexpected gateway response: {0}")]
    Decode(String),

    /// In-process classification failed.
    #[error(transparent)]
    Classification(#[from] ClassificationError),
}

impl GatewayError {
    /// Text shown to the user when an analysis fails.
    pub fn alert_text(&self) -> String {
        match self {
            GatewayError::Rejected { message, .. } if message.starts_with(FAILED_PREFIX) => {
                message.clone()
            }
            GatewayError::Rejected { message, .. } => format!("{FAILED_PREFIX}: {message}"),
            GatewayError::Classification(e) => e.public_message(),
            _ => "Classification failed. Please try again.".to_string(),
        }
    }
}

/// Rejected user actions and failed flows.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    #[error("No image selected")]
    NoImageSelected,

    #[error("Analysis already in progress")]
    AnalysisInProgress,

    #[error("{0}")]
    InvalidImage(String),

    #[error("History entry not found: {0}")]
    EntryNotFound(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Chat(#[from] ChatError),
}

impl FlowError {
    /// Text suitable for a blocking alert.
    pub fn alert_text(&self) -> String {
        match self {
            FlowError::Gateway(e) => e.alert_text(),
            other => other.to_string(),
        }
    }
}
