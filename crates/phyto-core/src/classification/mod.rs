//! Classification domain module.
//!
//! - `model`: image payloads, confidence values and results
//! - `error`: the `ClassificationError` taxonomy
//! - `output`: parsing of the engine's structured output
//! - `invoker`: the backend-agnostic `ClassificationInvoker` trait

mod error;
mod invoker;
mod model;
mod output;

pub use error::ClassificationError;
pub use invoker::ClassificationInvoker;
pub use model::{
    ClassificationResult, Confidence, ConfidenceTier, ImagePayload, MAX_IMAGE_BYTES, Prediction,
};
pub use output::parse_engine_output;
