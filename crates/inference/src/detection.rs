use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Detection result with bounding box coordinates in source-image pixels,
/// confidence, and 0-indexed COCO class.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct DetectionBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: f32,
    pub class_id: u16,
}

/// Outcome of a single pass through the detection pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionResult {
    /// Boxes whose class matched the configured target label
    pub count: usize,
    /// Annotated copy of the input, written under the static directory
    pub output_image_path: PathBuf,
    /// `count * seconds_per_object`; not a measured time
    pub duration_secs: u64,
}
