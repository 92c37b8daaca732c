use serde::Deserialize;
use std::path::PathBuf;

/// COCO class id for "car".
pub const DEFAULT_TARGET_LABEL: u16 = 2;
/// Placeholder cost charged per detected object.
pub const DEFAULT_SECONDS_PER_OBJECT: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionProvider {
    Cpu,
    Cuda,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub static_dir: PathBuf,
    pub target_label: u16,
    pub seconds_per_object: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            static_dir: PathBuf::from("static"),
            target_label: DEFAULT_TARGET_LABEL,
            seconds_per_object: DEFAULT_SECONDS_PER_OBJECT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    pub model_path: String,
    pub input_width: u32,
    pub input_height: u32,
    pub confidence_threshold: f32,
    pub execution_provider: ExecutionProvider,
}

impl DetectorConfig {
    pub fn input_size(&self) -> (u32, u32) {
        (self.input_width, self.input_height)
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        let (input_width, input_height) = preprocess::DEFAULT_INPUT_SIZE;
        Self {
            model_path: "models/rf-detr.onnx".to_string(),
            input_width,
            input_height,
            confidence_threshold: 0.5,
            execution_provider: ExecutionProvider::Cpu,
        }
    }
}
