//! `POST /chat`

use warp::hyper::body::Bytes;
use phyto_core::advisory::Advice;
use phyto_core::wire::{ChatRequest, ChatResponse};
use std::convert::Infallible;
use warp::Reply;

use crate::app::AppState;

/// Answers a treatment question. Always 200; failures and unreadable bodies
/// become the fallback.
pub async fn chat(body: Option<Bytes>, state: AppState) -> Result<impl Reply, Infallible> {
    let parsed = body.map(|body| serde_json::from_slice::<ChatRequest>(&body));
    let advice = match parsed {
        Some(Ok(request)) if !request.message.trim().is_empty() => {
            state.advisor.advise(&request.into_advisory()).await
        }
        Some(Ok(_)) => {
            tracing::warn!("Chat request with empty message");
            Advice::fallback()
        }
        Some(Err(e)) => {
            tracing::warn!(error = %e, "Malformed chat request");
            Advice::fallback()
        }
        None => Advice::fallback(),
    };

    Ok(warp::reply::json(&ChatResponse {
        response: Some(advice.text),
    }))
}
