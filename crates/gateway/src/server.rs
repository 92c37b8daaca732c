use crate::error::AppError;
use crate::state::AppState;
use crate::views::{self, ResultView};
use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, State},
    response::Html,
    routing::get,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

const FILE_FIELD: &str = "file";

pub fn create_app(state: AppState, max_upload_bytes: usize) -> Router {
    let static_dir = state.pipeline.config().static_dir.clone();

    Router::new()
        .route("/", get(index).post(upload))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(bind_addr: &str, app: Router) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("HTTP server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

async fn index() -> Html<String> {
    views::index()
}

struct FilePart {
    name: String,
    bytes: Vec<u8>,
}

/// First `file` part that carries a filename. Parts without one are plain
/// form fields, not uploads.
async fn read_file_part(multipart: &mut Multipart) -> Result<Option<FilePart>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(name) = field.file_name().map(str::to_owned) else {
            continue;
        };
        let bytes = field.bytes().await?;
        return Ok(Some(FilePart {
            name,
            bytes: bytes.to_vec(),
        }));
    }
    Ok(None)
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let part = read_file_part(&mut multipart)
        .await?
        .ok_or(AppError::NoFilePart)?;

    tracing::debug!(filename = %part.name, size = part.bytes.len(), "Received upload");

    let AppState {
        pipeline,
        uploads,
        inference_timeout,
    } = state;

    let work = tokio::task::spawn_blocking(move || -> Result<ResultView, AppError> {
        let stored = uploads.store(&part.name, &part.bytes)?;
        let result = pipeline.detect(&stored.path)?;
        Ok(ResultView {
            count: result.count,
            duration_secs: result.duration_secs,
            image_name: stored.filename,
        })
    });

    // On timeout the blocking task is detached and still runs to completion.
    let view = match inference_timeout {
        Some(limit) => tokio::time::timeout(limit, work)
            .await
            .map_err(|_| AppError::Timeout(limit))???,
        None => work.await??,
    };

    Ok(view.render())
}
