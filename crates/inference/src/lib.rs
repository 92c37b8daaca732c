pub mod annotate;
pub mod backend;
pub mod config;
pub mod detection;
pub mod detector;
pub mod error;
pub mod pipeline;
pub mod processing;

pub use backend::{InferenceBackend, InferenceOutput};
#[cfg(feature = "ort-backend")]
pub use backend::ort::OrtBackend;
pub use config::{DetectorConfig, ExecutionProvider, PipelineConfig};
pub use detection::{DetectionBox, DetectionResult};
pub use detector::{DetectionService, ModelDetector};
pub use error::PipelineError;
pub use pipeline::DetectionPipeline;
