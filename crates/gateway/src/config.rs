use common::{Environment, LogLevel};
use inference::{DetectorConfig, PipelineConfig};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_MAX_UPLOAD_BYTES: i64 = 16 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub log_level: LogLevel,
    pub environment: Environment,
    pub bind_addr: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Upper bound on a single detection request; unbounded when unset
    pub inference_timeout_ms: Option<u64>,
    /// OTLP collector; plain logging only when unset
    pub otel_endpoint: Option<String>,
    pub pipeline: PipelineConfig,
    pub detector: DetectorConfig,
}

impl Config {
    pub fn inference_timeout(&self) -> Option<Duration> {
        self.inference_timeout_ms.map(Duration::from_millis)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        let (width, height) = self.detector.input_size();
        if width == 0 || height == 0 {
            return Err(config::ConfigError::Message(format!(
                "detector input size must be non-zero, got {width}x{height}"
            )));
        }
        Ok(())
    }
}

pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let pipeline = PipelineConfig::default();
    let detector = DetectorConfig::default();

    let config = config::Config::builder()
        .set_default("log_level", "info")?
        .set_default("environment", "development")?
        .set_default("bind_addr", "0.0.0.0:5000")?
        .set_default("upload_dir", "uploads")?
        .set_default("max_upload_bytes", DEFAULT_MAX_UPLOAD_BYTES)?
        .set_default(
            "pipeline.static_dir",
            pipeline.static_dir.to_string_lossy().into_owned(),
        )?
        .set_default("pipeline.target_label", i64::from(pipeline.target_label))?
        .set_default(
            "pipeline.seconds_per_object",
            pipeline.seconds_per_object as i64,
        )?
        .set_default("detector.model_path", detector.model_path)?
        .set_default("detector.input_width", i64::from(detector.input_width))?
        .set_default("detector.input_height", i64::from(detector.input_height))?
        .set_default(
            "detector.confidence_threshold",
            f64::from(detector.confidence_threshold),
        )?
        .set_default("detector.execution_provider", "cpu")?
        .add_source(
            config::Environment::with_prefix("GATEWAY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: Config = config.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}
