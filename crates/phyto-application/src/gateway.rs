//! Transport-neutral access to the diagnosis gateway.

use crate::error::GatewayError;
use async_trait::async_trait;
use phyto_core::advisory::AdvisoryRequest;
use phyto_core::classification::{ClassificationResult, ImagePayload};

/// What the dashboard needs from the gateway.
#[async_trait]
pub trait DiagnosisGateway: Send + Sync {
    /// Classifies one image. Dropping the future abandons the request.
    async fn classify(&self, image: &ImagePayload) -> Result<ClassificationResult, GatewayError>;

    /// Asks for treatment advice. An empty string means the gateway had
    /// nothing to say.
    async fn chat(&self, request: &AdvisoryRequest) -> Result<String, GatewayError>;
}
