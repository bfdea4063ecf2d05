use phyto_core::advisory::AdvisoryService;
use phyto_core::classification::{ClassificationInvoker, MAX_IMAGE_BYTES};
use std::sync::Arc;

/// Shared, read-only handler state.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<dyn ClassificationInvoker>,
    pub advisor: Arc<dyn AdvisoryService>,
    /// Largest accepted image; the multipart limit is derived from it.
    pub max_image_bytes: usize,
}

impl AppState {
    pub fn new(classifier: Arc<dyn ClassificationInvoker>, advisor: Arc<dyn AdvisoryService>) -> Self {
        Self {
            classifier,
            advisor,
            max_image_bytes: MAX_IMAGE_BYTES,
        }
    }

    pub fn with_max_image_bytes(mut self, limit: usize) -> Self {
        self.max_image_bytes = limit;
        self
    }
}
