//! Advisory domain module.
//!
//! - `request`: the per-turn `AdvisoryRequest`
//! - `prompt`: the treatment prompt and fixed sampling options
//! - `service`: the infallible `AdvisoryService` trait and its fallback text

mod prompt;
mod request;
mod service;

pub use prompt::{SamplingOptions, build_treatment_prompt};
pub use request::AdvisoryRequest;
pub use service::{ADVISORY_FALLBACK, Advice, AdviceSource, AdvisoryError, AdvisoryService};
