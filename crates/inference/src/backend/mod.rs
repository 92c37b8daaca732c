use ndarray::{Array, ArrayD, IxDyn};

#[cfg(feature = "ort-backend")]
pub mod ort;

pub trait InferenceBackend: Send {
    fn load_model(path: &str) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Run inference on a preprocessed NCHW batch of one image
    fn infer(&mut self, images: &Array<f32, IxDyn>) -> anyhow::Result<InferenceOutput>;
}

pub struct InferenceOutput {
    pub dets: ArrayD<f32>,   // [1, N, 4] cxcywh (normalized 0-1)
    pub logits: ArrayD<f32>, // [1, N, num_classes] class logits, index 0 = background
}
