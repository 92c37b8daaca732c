use crate::{
    config::PipelineConfig,
    detection::{DetectionBox, DetectionResult},
    detector::DetectionService,
    error::PipelineError,
};
use common::span_debug;
use image::{ImageReader, RgbImage};
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

struct PipelineMetrics {
    requests: Counter<u64>,
    vehicles: Counter<u64>,
    duration: Histogram<f64>,
}

fn init_metrics(meter_name: &'static str) -> PipelineMetrics {
    let meter = global::meter(meter_name);
    let latency_buckets = [
        0.01, 0.025, 0.05, 0.1, 0.2, 0.3, 0.5, 0.75, 1.0, 1.5, 2.0, 3.0, 5.0, 10.0,
    ];

    PipelineMetrics {
        requests: meter
            .u64_counter("detection_requests_total")
            .with_description("Images submitted to the detection pipeline")
            .build(),
        vehicles: meter
            .u64_counter("detection_vehicles_total")
            .with_description("Target-label objects counted across all images")
            .build(),
        duration: meter
            .f64_histogram("detection_duration_seconds")
            .with_description("Wall-clock time for decode, inference, render and write")
            .with_unit("s")
            .with_boundaries(latency_buckets.to_vec())
            .build(),
    }
}

/// Number of boxes whose class is `target_label`.
pub fn count_target_boxes(detections: &[DetectionBox], target_label: u16) -> usize {
    detections
        .iter()
        .filter(|d| d.class_id == target_label)
        .count()
}

/// Reported processing time. A fixed cost per counted object, not a measurement.
pub fn synthetic_duration(count: usize, seconds_per_object: u64) -> u64 {
    count as u64 * seconds_per_object
}

pub struct DetectionPipeline<S: DetectionService> {
    service: Mutex<S>,
    config: PipelineConfig,
    metrics: PipelineMetrics,
}

impl<S: DetectionService> DetectionPipeline<S> {
    pub fn new(service: S, config: PipelineConfig) -> Self {
        Self {
            service: Mutex::new(service),
            config,
            metrics: init_metrics("detection_pipeline"),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Decode, detect, annotate and persist a single stored image.
    ///
    /// The annotated copy lands at `static_dir/<file name of image_path>`,
    /// replacing any earlier output with the same name.
    #[tracing::instrument(skip_all, fields(path = %image_path.display()))]
    pub fn detect(&self, image_path: &Path) -> Result<DetectionResult, PipelineError> {
        let start = Instant::now();
        let status = |outcome: &'static str| [KeyValue::new("outcome", outcome)];

        let result = self.run(image_path);
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(res) => {
                self.metrics.requests.add(1, &status("ok"));
                self.metrics.vehicles.add(res.count as u64, &[]);
                self.metrics.duration.record(elapsed, &status("ok"));
                tracing::info!(
                    count = res.count,
                    duration_secs = res.duration_secs,
                    elapsed_secs = elapsed,
                    output = %res.output_image_path.display(),
                    "Detection complete"
                );
            }
            Err(e) => {
                self.metrics.requests.add(1, &status("error"));
                self.metrics.duration.record(elapsed, &status("error"));
                tracing::warn!(error = %e, "Detection failed");
            }
        }

        result
    }

    fn run(&self, image_path: &Path) -> Result<DetectionResult, PipelineError> {
        let output_image_path = self.output_path(image_path)?;
        let frame = decode(image_path)?;

        let (detections, annotated) = {
            let mut service = self.service.lock().map_err(|_| {
                PipelineError::Inference(anyhow::anyhow!("Detection service lock poisoned"))
            })?;
            let detections = service.infer(&frame).map_err(PipelineError::Inference)?;
            let annotated = service.render(&frame, &detections, self.config.target_label);
            (detections, annotated)
        };

        let count = count_target_boxes(&detections, self.config.target_label);
        tracing::debug!(total = detections.len(), count, "Detections filtered by label");

        std::fs::create_dir_all(&self.config.static_dir)
            .map_err(|e| PipelineError::storage(&self.config.static_dir, e))?;
        annotated
            .save(&output_image_path)
            .map_err(|e| PipelineError::storage(&output_image_path, e))?;

        Ok(DetectionResult {
            count,
            output_image_path,
            duration_secs: synthetic_duration(count, self.config.seconds_per_object),
        })
    }

    fn output_path(&self, image_path: &Path) -> Result<PathBuf, PipelineError> {
        let name = image_path
            .file_name()
            .ok_or_else(|| PipelineError::InvalidPath(image_path.to_path_buf()))?;
        Ok(self.config.static_dir.join(name))
    }
}

fn decode(path: &Path) -> Result<RgbImage, PipelineError> {
    let _s = span_debug!("decode_image");

    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| PipelineError::storage(path, e))?;

    let image = reader.decode().map_err(|source| PipelineError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(image.to_rgb8())
}
