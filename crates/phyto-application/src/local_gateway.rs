//! In-process gateway wired directly to the backends.

use crate::error::GatewayError;
use crate::gateway::DiagnosisGateway;
use async_trait::async_trait;
use phyto_core::advisory::{AdvisoryRequest, AdvisoryService};
use phyto_core::classification::{ClassificationInvoker, ClassificationResult, ImagePayload};
use std::sync::Arc;

/// Runs classification and advice in the calling process, skipping HTTP.
#[derive(Clone)]
pub struct LocalGateway {
    invoker: Arc<dyn ClassificationInvoker>,
    advisor: Arc<dyn AdvisoryService>,
}

impl LocalGateway {
    pub fn new(invoker: Arc<dyn ClassificationInvoker>, advisor: Arc<dyn AdvisoryService>) -> Self {
        Self { invoker, advisor }
    }
}

#[async_trait]
impl DiagnosisGateway for LocalGateway {
    async fn classify(&self, image: &ImagePayload) -> Result<ClassificationResult, GatewayError> {
        Ok(self.invoker.classify(image.clone()).await?)
    }

    async fn chat(&self, request: &AdvisoryRequest) -> Result<String, GatewayError> {
        Ok(self.advisor.advise(request).await.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phyto_core::advisory::Advice;
    use phyto_core::classification::{ClassificationError, Confidence};

    struct RejectingInvoker;

    #[async_trait]
    impl ClassificationInvoker for RejectingInvoker {
        async fn classify(
            &self,
            _image: ImagePayload,
        ) -> Result<ClassificationResult, ClassificationError> {
            Err(ClassificationError::engine_failure(Some(1), "model load error"))
        }

        fn name(&self) -> &str {
            "rejecting"
        }
    }

    struct FallbackAdvisor;

    #[async_trait]
    impl AdvisoryService for FallbackAdvisor {
        async fn advise(&self, _request: &AdvisoryRequest) -> Advice {
            Advice::fallback()
        }
    }

    fn gateway() -> LocalGateway {
        LocalGateway::new(Arc::new(RejectingInvoker), Arc::new(FallbackAdvisor))
    }

    #[tokio::test]
    async fn test_classification_error_is_wrapped() {
        let err = gateway()
            .classify(&ImagePayload::new(b"leaf".to_vec(), None))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Classification(_)));
        assert!(err.alert_text().contains("model load error"));
    }

    #[tokio::test]
    async fn test_chat_returns_advice_text() {
        let request = AdvisoryRequest::new("help", "Apple Scab", Confidence::new(88.0).unwrap());
        let text = gateway().chat(&request).await.unwrap();
        assert_eq!(text, phyto_core::advisory::ADVISORY_FALLBACK);
    }
}
