//! Client-side orchestration for the diagnosis dashboard.
//!
//! The [`Dashboard`] owns the analysis and chat state machines and talks to
//! the gateway through [`DiagnosisGateway`], either over HTTP
//! ([`HttpGateway`]) or in-process ([`LocalGateway`]).

pub mod dashboard;
pub mod error;
pub mod gateway;
pub mod http_gateway;
pub mod local_gateway;
pub mod progress;

pub use dashboard::{AnalysisState, Dashboard, DashboardSettings};
pub use error::{FlowError, GatewayError};
pub use gateway::DiagnosisGateway;
pub use http_gateway::HttpGateway;
pub use local_gateway::LocalGateway;
pub use progress::ProgressTicker;
