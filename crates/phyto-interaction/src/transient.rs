//! Per-request transient image files.

use phyto_core::classification::{ClassificationError, ImagePayload};
use std::path::Path;
use tempfile::TempPath;
use uuid::Uuid;

/// One classification request and the image file staged for it.
///
/// The file name combines the request id with a random suffix, so concurrent
/// requests never share a path. The file is deleted when the request is
/// released or dropped, which covers early returns, timeouts and a cancelled
/// caller alike.
#[derive(Debug)]
pub struct ClassificationRequest {
    id: Uuid,
    image: TempPath,
    size: usize,
}

impl ClassificationRequest {
    /// Writes the payload into `scratch_dir` under a unique name.
    pub async fn stage(
        payload: &ImagePayload,
        scratch_dir: &Path,
    ) -> Result<Self, ClassificationError> {
        let id = Uuid::new_v4();
        let suffix = format!(".{}", extension_for(payload.mime_or_default()));

        let image = tempfile::Builder::new()
            .prefix(&format!("leaf-{id}-"))
            .suffix(&suffix)
            .tempfile_in(scratch_dir)
            .map_err(|e| {
                ClassificationError::Storage(format!(
                    "failed to create transient file in {}: {}",
                    scratch_dir.display(),
                    e
                ))
            })?
            .into_temp_path();

        tokio::fs::write(&image, &payload.bytes)
            .await
            .map_err(|e| {
                ClassificationError::Storage(format!(
                    "failed to write transient file {}: {}",
                    image.display(),
                    e
                ))
            })?;

        Ok(Self {
            id,
            image,
            size: payload.len(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.image
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Deletes the staged file now, logging instead of failing.
    pub fn release(self) {
        let id = self.id;
        if let Err(e) = self.image.close() {
            tracing::warn!(request_id = %id, error = %e, "Failed to remove transient image");
        }
    }
}

/// File extension for a MIME type; `jpg` when the type is unknown.
fn extension_for(mime: &str) -> &'static str {
    let Some(candidates) = mime_guess::get_mime_extensions_str(mime) else {
        return "jpg";
    };
    candidates
        .iter()
        .copied()
        .find(|ext| *ext == "jpg")
        .or_else(|| candidates.first().copied())
        .unwrap_or("jpg")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for_known_types() {
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("application/x-unknown-thing"), "jpg");
    }

    #[tokio::test]
    async fn test_stage_writes_and_release_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let payload = ImagePayload::new(b"leafbytes".to_vec(), Some("image/png".into()));

        let request = ClassificationRequest::stage(&payload, dir.path())
            .await
            .unwrap();
        let path = request.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(std::fs::read(&path).unwrap(), b"leafbytes");
        assert!(
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with(&format!("leaf-{}-", request.id()))
        );
        assert_eq!(path.extension().unwrap(), "png");

        request.release();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_drop_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let payload = ImagePayload::new(b"x".to_vec(), None);
        let path = {
            let request = ClassificationRequest::stage(&payload, dir.path())
                .await
                .unwrap();
            request.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_concurrent_stages_get_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();
        let payload = ImagePayload::new(b"x".to_vec(), None);
        let (a, b) = tokio::join!(
            ClassificationRequest::stage(&payload, dir.path()),
            ClassificationRequest::stage(&payload, dir.path())
        );
        assert_ne!(a.unwrap().path(), b.unwrap().path());
    }
}
