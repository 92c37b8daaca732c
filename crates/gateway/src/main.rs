use gateway::{
    config::get_configuration,
    logging::setup_logging,
    server::{create_app, run_server},
    state::AppState,
    upload::{UploadConfig, UploadHandler},
};
use inference::{DetectionPipeline, DetectionService, ModelDetector};

#[cfg(not(feature = "ort-backend"))]
compile_error!("The gateway needs an inference backend. Enable the `ort-backend` feature.");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = get_configuration()?;
    let _telemetry = setup_logging(&config)?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        model_path = %config.detector.model_path,
        provider = ?config.detector.execution_provider,
        "Gateway starting"
    );

    let backend = inference::OrtBackend::load_model_with_provider(
        &config.detector.model_path,
        config.detector.execution_provider,
    )?;
    let detector: Box<dyn DetectionService> =
        Box::new(ModelDetector::new(backend, &config.detector));

    let pipeline = DetectionPipeline::new(detector, config.pipeline.clone());
    let uploads = UploadHandler::new(UploadConfig {
        upload_dir: config.upload_dir.clone(),
        ..UploadConfig::default()
    });
    let state = AppState::new(pipeline, uploads, config.inference_timeout());

    let app = create_app(state, config.max_upload_bytes);
    run_server(&config.bind_addr, app).await
}
