use crate::config::Config;
use common::TelemetryGuard;

const SERVICE_NAME: &str = "gateway";

/// Install the tracing subscriber, exporting over OTLP when an endpoint is configured.
///
/// The returned guard must be held for the lifetime of the process.
pub fn setup_logging(config: &Config) -> anyhow::Result<Option<TelemetryGuard>> {
    match &config.otel_endpoint {
        Some(endpoint) => TelemetryGuard::init(
            SERVICE_NAME,
            endpoint,
            config.environment,
            config.log_level,
        )
        .map(Some),
        None => {
            common::setup_logging(config.environment, config.log_level);
            Ok(None)
        }
    }
}
