//! Backend-agnostic classification contract.

use super::error::ClassificationError;
use super::model::{ClassificationResult, ImagePayload};
use async_trait::async_trait;

/// Something that can turn one image into one diagnosis.
///
/// The gateway only depends on this trait, so a subprocess engine, an
/// in-process model or a remote inference server can be swapped in without
/// touching the HTTP layer.
///
/// # Implementation Notes
///
/// Implementations must:
/// - reject an empty payload with `InvalidInput` before doing any work
/// - keep no state between calls, so concurrent calls are independent
/// - release every per-request resource before returning, on every path
#[async_trait]
pub trait ClassificationInvoker: Send + Sync {
    /// Classifies a single image.
    async fn classify(
        &self,
        image: ImagePayload,
    ) -> Result<ClassificationResult, ClassificationError>;

    /// Short backend name used in logs.
    fn name(&self) -> &str;
}
