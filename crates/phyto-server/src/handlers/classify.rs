//! `POST /classify`

use warp::hyper::body::Buf;
use futures::TryStreamExt;
use phyto_core::classification::{ClassificationError, ImagePayload};
use phyto_core::wire::ClassifyResponse;
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::multipart::{FormData, Part};
use warp::reply::Response;
use warp::Reply;

use super::error_reply;
use crate::app::AppState;

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

pub async fn classify(form: FormData, state: AppState) -> Result<Response, Infallible> {
    let image = match read_image(form).await {
        Ok(Some(image)) => image,
        Ok(None) => {
            return Ok(error_reply(StatusCode::BAD_REQUEST, "No image provided"));
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read multipart body");
            return Ok(error_reply(
                StatusCode::BAD_REQUEST,
                "Malformed multipart body",
            ));
        }
    };

    tracing::debug!(
        bytes = image.len(),
        mime = %image.mime_or_default(),
        file_name = image.file_name.as_deref().unwrap_or("-"),
        "Received image"
    );

    match state.classifier.classify(image).await {
        Ok(result) => Ok(warp::reply::json(&ClassifyResponse::from(&result)).into_response()),
        Err(e) => {
            if let ClassificationError::EngineFailure { stderr, .. } = &e {
                tracing::error!(stderr = %stderr, "Classification engine error");
            }
            Ok(error_reply(status_for(&e), e.public_message()))
        }
    }
}

/// Status code for a classification failure.
pub fn status_for(error: &ClassificationError) -> StatusCode {
    match error {
        ClassificationError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ClassificationError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        ClassificationError::EngineFailure { .. }
        | ClassificationError::MalformedOutput { .. }
        | ClassificationError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Reads the `image` field, skipping any others. `None` when absent.
async fn read_image(mut form: FormData) -> Result<Option<ImagePayload>, warp::Error> {
    while let Some(part) = form.try_next().await? {
        if part.name() != IMAGE_FIELD {
            continue;
        }
        return read_part(part).await.map(Some);
    }
    Ok(None)
}

async fn read_part(part: Part) -> Result<ImagePayload, warp::Error> {
    let mime_type = part.content_type().map(str::to_string);
    let file_name = part.filename().map(str::to_string);

    let bytes = part
        .stream()
        .try_fold(Vec::new(), |mut acc, chunk| async move {
            acc.extend_from_slice(chunk.chunk());
            Ok(acc)
        })
        .await?;

    let mut image = ImagePayload::new(bytes, mime_type);
    if let Some(name) = file_name {
        image = image.with_file_name(name);
    }
    Ok(image)
}
