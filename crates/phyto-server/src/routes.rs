//! Filter composition and rejection recovery.

use std::convert::Infallible;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::{Filter, Rejection, Reply};

use crate::app::AppState;
use crate::handlers::{self, error_reply};

/// Slack on top of the image limit for multipart framing and other fields.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;
const CHAT_BODY_LIMIT: u64 = 64 * 1024;

/// All gateway routes, with request logging and JSON error bodies.
pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    // Paths before methods, so unknown paths reject as 404 rather than 405.
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handlers::health::health);

    let classify = warp::path("classify")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::multipart::form().max_length(state.max_image_bytes as u64 + MULTIPART_OVERHEAD))
        .and(with_state(state.clone()))
        .and_then(handlers::classify::classify);

    let chat = warp::path("chat")
        .and(warp::path::end())
        .and(warp::post())
        .and(chat_body())
        .and(with_state(state))
        .and_then(handlers::chat::chat);

    let api = warp::path("api").and(classify.clone().or(chat.clone()));

    health
        .or(classify)
        .or(chat)
        .or(api)
        .recover(handle_rejection)
        .with(warp::log::custom(|info| {
            tracing::info!(
                method = %info.method(),
                path = %info.path(),
                status = info.status().as_u16(),
                elapsed_ms = info.elapsed().as_millis() as u64,
                "request"
            );
        }))
}

/// The raw chat body, or `None` when it is missing or over the limit.
///
/// `/chat` answers every request, so body rejections never reach
/// [`handle_rejection`].
fn chat_body() -> impl Filter<Extract = (Option<Bytes>,), Error = Infallible> + Clone {
    warp::body::content_length_limit(CHAT_BODY_LIMIT)
        .and(warp::body::bytes())
        .map(Some)
        .recover(|rejection: Rejection| async move {
            tracing::warn!(rejection = ?rejection, "Unreadable chat body");
            Ok::<_, Infallible>(None)
        })
        .unify()
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Maps rejections to `{error}` bodies.
pub async fn handle_rejection(err: Rejection) -> Result<warp::reply::Response, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found")
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Image exceeds the upload size limit")
    } else if err.find::<warp::reject::MissingHeader>().is_some()
        || err.find::<warp::reject::InvalidHeader>().is_some()
        || err.find::<warp::reject::UnsupportedMediaType>().is_some()
        || err.find::<warp::reject::LengthRequired>().is_some()
    {
        (StatusCode::BAD_REQUEST, "No image provided")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    } else {
        tracing::error!(rejection = ?err, "Unhandled rejection");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    };
    Ok(error_reply(status, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use phyto_core::advisory::{ADVISORY_FALLBACK, Advice, AdvisoryRequest, AdvisoryService};
    use phyto_core::classification::{
        ClassificationError, ClassificationInvoker, ClassificationResult, Confidence,
        ImagePayload,
    };
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Invoker double that records what it was given.
    struct FixedInvoker {
        outcome: Result<(String, f64), ClassificationError>,
        seen: Mutex<Vec<ImagePayload>>,
    }

    impl FixedInvoker {
        fn new(outcome: Result<(String, f64), ClassificationError>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ClassificationInvoker for FixedInvoker {
        async fn classify(
            &self,
            image: ImagePayload,
        ) -> Result<ClassificationResult, ClassificationError> {
            if image.is_empty() {
                return Err(ClassificationError::invalid_input("No image provided"));
            }
            self.seen.lock().unwrap().push(image);
            self.outcome
                .clone()
                .map(|(label, c)| ClassificationResult::new(label, Confidence::new(c).unwrap()))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct EchoAdvisor;

    #[async_trait]
    impl AdvisoryService for EchoAdvisor {
        async fn advise(&self, request: &AdvisoryRequest) -> Advice {
            Advice::from_model(format!(
                "{} @ {}%: {}",
                request.diagnosis, request.confidence, request.question
            ))
        }
    }

    fn state(invoker: Arc<FixedInvoker>) -> AppState {
        AppState::new(invoker, Arc::new(EchoAdvisor))
    }

    const BOUNDARY: &str = "phyto-test-boundary";

    fn multipart(field: &str, file_name: &str, mime: &str, bytes: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn classify_request(body: Vec<u8>) -> warp::test::RequestBuilder {
        warp::test::request()
            .method("POST")
            .path("/classify")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(body)
    }

    fn json(body: &[u8]) -> serde_json::Value {
        serde_json::from_slice(body).unwrap()
    }

    #[tokio::test]
    async fn test_classify_success() {
        let invoker = FixedInvoker::new(Ok(("Tomato Late Blight".into(), 94.2)));
        let api = routes(state(invoker.clone()));

        let res = classify_request(multipart("image", "leaf.png", "image/png", b"leafbytes"))
            .reply(&api)
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            json(res.body()),
            serde_json::json!({"prediction": "Tomato Late Blight", "confidence": 94.2})
        );
        let seen = invoker.seen.lock().unwrap();
        assert_eq!(seen[0].bytes, b"leafbytes");
        assert_eq!(seen[0].mime_type.as_deref(), Some("image/png"));
        assert_eq!(seen[0].file_name.as_deref(), Some("leaf.png"));
    }

    #[tokio::test]
    async fn test_classify_under_api_prefix() {
        let api = routes(state(FixedInvoker::new(Ok(("Apple Scab".into(), 87.6)))));
        let res = warp::test::request()
            .method("POST")
            .path("/api/classify")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(multipart("image", "leaf.jpg", "image/jpeg", b"x"))
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_classify_without_image_field() {
        let invoker = FixedInvoker::new(Ok(("x".into(), 1.0)));
        let api = routes(state(invoker.clone()));

        let res = classify_request(multipart("photo", "leaf.jpg", "image/jpeg", b"x"))
            .reply(&api)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(res.body())["error"], "No image provided");
        assert!(invoker.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_classify_without_multipart_body() {
        let api = routes(state(FixedInvoker::new(Ok(("x".into(), 1.0)))));
        let res = warp::test::request()
            .method("POST")
            .path("/classify")
            .body("not multipart")
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(json(res.body())["error"].is_string());
    }

    #[tokio::test]
    async fn test_classify_error_statuses() {
        let cases = [
            (
                ClassificationError::engine_failure(Some(1), "model load error"),
                StatusCode::INTERNAL_SERVER_ERROR,
                Some("model load error"),
            ),
            (
                ClassificationError::Timeout {
                    budget: Duration::from_secs(30),
                },
                StatusCode::GATEWAY_TIMEOUT,
                Some("timeout"),
            ),
            (
                ClassificationError::malformed("not JSON", "Loading weights... secret/path"),
                StatusCode::INTERNAL_SERVER_ERROR,
                None,
            ),
        ];

        for (error, status, fragment) in cases {
            let api = routes(state(FixedInvoker::new(Err(error))));
            let res = classify_request(multipart("image", "leaf.jpg", "image/jpeg", b"x"))
                .reply(&api)
                .await;

            assert_eq!(res.status(), status);
            let message = json(res.body())["error"].as_str().unwrap().to_string();
            assert!(message.starts_with("Classification failed"), "{message}");
            match fragment {
                Some(fragment) => assert!(message.contains(fragment), "{message}"),
                None => assert!(!message.contains("secret/path"), "raw output leaked: {message}"),
            }
        }
    }

    #[tokio::test]
    async fn test_classify_empty_image_is_bad_request() {
        let api = routes(state(FixedInvoker::new(Ok(("x".into(), 1.0)))));
        let res = classify_request(multipart("image", "leaf.jpg", "image/jpeg", b""))
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_classify_body_over_limit() {
        let api = routes(state(FixedInvoker::new(Ok(("x".into(), 1.0)))).with_max_image_bytes(16));
        let big = vec![0u8; 128 * 1024];
        let res = classify_request(multipart("image", "leaf.jpg", "image/jpeg", &big))
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_chat_answers_with_advice() {
        let api = routes(state(FixedInvoker::new(Ok(("x".into(), 1.0)))));
        let res = warp::test::request()
            .method("POST")
            .path("/chat")
            .json(&serde_json::json!({
                "message": "How to treat?",
                "disease": "Apple Scab",
                "confidence": 88
            }))
            .reply(&api)
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json(res.body())["response"], "Apple Scab @ 88%: How to treat?");
    }

    #[tokio::test]
    async fn test_chat_malformed_body_gets_fallback() {
        let api = routes(state(FixedInvoker::new(Ok(("x".into(), 1.0)))));
        for body in ["{not json", r#"{"disease": "Apple Scab"}"#, r#"{"message": " ", "disease": "x", "confidence": 1}"#] {
            let res = warp::test::request()
                .method("POST")
                .path("/chat")
                .header("content-type", "application/json")
                .body(body)
                .reply(&api)
                .await;
            assert_eq!(res.status(), StatusCode::OK);
            assert_eq!(json(res.body())["response"], ADVISORY_FALLBACK);
        }
    }

    #[tokio::test]
    async fn test_chat_oversized_body_gets_fallback() {
        let api = routes(state(FixedInvoker::new(Ok(("x".into(), 1.0)))));
        let res = warp::test::request()
            .method("POST")
            .path("/chat")
            .json(&serde_json::json!({
                "message": "a".repeat(70 * 1024),
                "disease": "Apple Scab",
                "confidence": 88
            }))
            .reply(&api)
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json(res.body())["response"], ADVISORY_FALLBACK);
    }

    #[tokio::test]
    async fn test_chat_without_content_length_gets_fallback() {
        let api = routes(state(FixedInvoker::new(Ok(("x".into(), 1.0)))));
        let res = warp::test::request()
            .method("POST")
            .path("/api/chat")
            .reply(&api)
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json(res.body())["response"], ADVISORY_FALLBACK);
    }

    #[tokio::test]
    async fn test_health_and_unknown_route() {
        let api = routes(state(FixedInvoker::new(Ok(("x".into(), 1.0)))));

        let res = warp::test::request().path("/health").reply(&api).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json(res.body()), serde_json::json!({"status": "ok"}));

        let res = warp::test::request().path("/nope").reply(&api).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(res.body())["error"], "Not found");
    }
}
