use crate::upload::UploadHandler;
use inference::{DetectionPipeline, DetectionService};
use std::sync::Arc;
use std::time::Duration;

pub type SharedPipeline = Arc<DetectionPipeline<Box<dyn DetectionService>>>;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: SharedPipeline,
    pub uploads: Arc<UploadHandler>,
    /// Bound on store + detect for one request
    pub inference_timeout: Option<Duration>,
}

impl AppState {
    pub fn new(
        pipeline: DetectionPipeline<Box<dyn DetectionService>>,
        uploads: UploadHandler,
        inference_timeout: Option<Duration>,
    ) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            uploads: Arc::new(uploads),
            inference_timeout,
        }
    }
}
