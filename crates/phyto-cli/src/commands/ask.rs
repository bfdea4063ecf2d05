use std::sync::Arc;

use anyhow::Result;
use phyto_application::DiagnosisGateway;
use phyto_core::advisory::AdvisoryRequest;
use phyto_core::chat::{CONNECTION_FALLBACK, ChatMessage, EMPTY_REPLY_FALLBACK};
use phyto_core::classification::Confidence;

use crate::render;

pub async fn run(
    gateway: Arc<dyn DiagnosisGateway>,
    disease: &str,
    confidence: f64,
    question: &str,
) -> Result<()> {
    let request = AdvisoryRequest::new(question, disease, Confidence::saturating(confidence));
    let text = match gateway.chat(&request).await {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => EMPTY_REPLY_FALLBACK.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Chat request failed");
            CONNECTION_FALLBACK.to_string()
        }
    };
    println!("{}", render::markup(&ChatMessage::assistant(text).rendered()));
    Ok(())
}
