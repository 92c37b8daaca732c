use crate::detection::DetectionBox;
use ndarray::ArrayViewD;

/// Maps model-space boxes back onto the source image.
pub struct TransformParams {
    pub orig_width: u32,
    pub orig_height: u32,
    pub input_width: u32,
    pub input_height: u32,
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl TransformParams {
    /// Undo the letterbox on a point given in input-space pixels, clamped to the source image.
    #[inline]
    fn to_source(&self, x: f32, y: f32) -> (f32, f32) {
        let x = ((x - self.offset_x) / self.scale).clamp(0.0, self.orig_width as f32);
        let y = ((y - self.offset_y) / self.scale).clamp(0.0, self.orig_height as f32);
        (x, y)
    }
}

pub struct PostProcessor {
    pub confidence_threshold: f32,
}

impl PostProcessor {
    pub fn new(confidence_threshold: f32) -> Self {
        Self {
            confidence_threshold,
        }
    }

    /// Parse detections from RF-DETR output into source-image boxes.
    #[tracing::instrument(skip_all)]
    pub fn parse_detections(
        &self,
        dets: &ArrayViewD<f32>,   // [1, N, 4] - boxes in cxcywh format (normalized 0-1)
        logits: &ArrayViewD<f32>, // [1, N, C] - class logits
        transform: &TransformParams,
    ) -> anyhow::Result<Vec<DetectionBox>> {
        if dets.ndim() != 3 || logits.ndim() != 3 {
            anyhow::bail!(
                "Unexpected output rank: dets {:?}, logits {:?}",
                dets.shape(),
                logits.shape()
            );
        }

        let num_queries = dets.shape()[1];
        let num_classes = logits.shape()[2];

        if logits.shape()[1] != num_queries || dets.shape()[2] != 4 {
            anyhow::bail!(
                "Output shape mismatch: dets {:?}, logits {:?}",
                dets.shape(),
                logits.shape()
            );
        }
        if num_classes < 2 {
            anyhow::bail!("Model must emit at least one non-background class");
        }

        let mut detections = Vec::new();

        for i in 0..num_queries {
            // RF-DETR uses 1-indexed classes (0=background, 1=person, 2=bicycle, ...)
            // Skip index 0 (background) and convert to 0-indexed COCO IDs
            let mut max_logit = f32::NEG_INFINITY;
            let mut class_idx = 1usize;
            for c in 1..num_classes {
                let logit = logits[[0, i, c]];
                if logit > max_logit {
                    max_logit = logit;
                    class_idx = c;
                }
            }

            let confidence = sigmoid(max_logit);
            if confidence < self.confidence_threshold {
                continue;
            }

            let (x1_norm, y1_norm, x2_norm, y2_norm) = cxcywh_to_xyxy(
                dets[[0, i, 0]],
                dets[[0, i, 1]],
                dets[[0, i, 2]],
                dets[[0, i, 3]],
            );

            let (x1, y1) = transform.to_source(
                x1_norm * transform.input_width as f32,
                y1_norm * transform.input_height as f32,
            );
            let (x2, y2) = transform.to_source(
                x2_norm * transform.input_width as f32,
                y2_norm * transform.input_height as f32,
            );

            detections.push(DetectionBox {
                x1,
                y1,
                x2,
                y2,
                confidence,
                class_id: (class_idx - 1) as u16,
            });
        }

        tracing::debug!(
            queries = num_queries,
            kept = detections.len(),
            "Parsed detections"
        );

        Ok(detections)
    }
}

/// Sigmoid activation function
#[inline]
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Convert bounding box from center-width-height format to corner format
#[inline]
fn cxcywh_to_xyxy(cx: f32, cy: f32, w: f32, h: f32) -> (f32, f32, f32, f32) {
    (cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
}
