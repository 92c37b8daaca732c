use crate::{
    annotate,
    backend::InferenceBackend,
    config::DetectorConfig,
    detection::DetectionBox,
    processing::post::{PostProcessor, TransformParams},
};
use common::{span, span_debug};
use image::RgbImage;
use preprocess::{CpuPreProcessor, Preprocess};

/// Something that can find objects in an image and draw them back onto it.
///
/// The pipeline holds one of these behind a mutex; implementations only
/// need to be `Send`.
pub trait DetectionService: Send {
    fn infer(&mut self, frame: &RgbImage) -> anyhow::Result<Vec<DetectionBox>>;

    fn render(
        &self,
        frame: &RgbImage,
        detections: &[DetectionBox],
        target_label: u16,
    ) -> RgbImage {
        annotate::draw_detections(frame, detections, target_label)
    }
}

impl<S: DetectionService + ?Sized> DetectionService for Box<S> {
    fn infer(&mut self, frame: &RgbImage) -> anyhow::Result<Vec<DetectionBox>> {
        (**self).infer(frame)
    }

    fn render(
        &self,
        frame: &RgbImage,
        detections: &[DetectionBox],
        target_label: u16,
    ) -> RgbImage {
        (**self).render(frame, detections, target_label)
    }
}

/// RF-DETR style detector: letterbox, run the backend, decode queries.
pub struct ModelDetector<B: InferenceBackend> {
    backend: B,
    preprocessor: CpuPreProcessor,
    postprocessor: PostProcessor,
}

impl<B: InferenceBackend> ModelDetector<B> {
    pub fn new(backend: B, config: &DetectorConfig) -> Self {
        Self {
            backend,
            preprocessor: CpuPreProcessor::new(config.input_size()),
            postprocessor: PostProcessor::new(config.confidence_threshold),
        }
    }
}

impl<B: InferenceBackend> DetectionService for ModelDetector<B> {
    fn infer(&mut self, frame: &RgbImage) -> anyhow::Result<Vec<DetectionBox>> {
        let _s = span_debug!("detect_objects");
        let (width, height) = frame.dimensions();

        let pre = self.preprocessor.preprocess(frame.as_raw(), width, height)?;

        let output = {
            let _s = span!("model_inference");
            self.backend.infer(&pre.data)?
        };

        let (input_width, input_height) = self.preprocessor.input_size();
        let transform = TransformParams {
            orig_width: width,
            orig_height: height,
            input_width,
            input_height,
            scale: pre.scale,
            offset_x: pre.offset_x,
            offset_y: pre.offset_y,
        };

        self.postprocessor
            .parse_detections(&output.dets.view(), &output.logits.view(), &transform)
    }
}
