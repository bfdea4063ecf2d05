//! Adapters to the two external engines.
//!
//! - [`SubprocessClassifier`]: runs the classification engine as a child
//!   process, one per request.
//! - [`OllamaAdvisor`]: calls an Ollama-compatible generate endpoint.

pub mod ollama_advisor;
pub mod subprocess_classifier;
mod transient;

pub use ollama_advisor::OllamaAdvisor;
pub use subprocess_classifier::SubprocessClassifier;
pub use transient::ClassificationRequest;
