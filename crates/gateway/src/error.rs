use crate::upload::UploadError;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use inference::PipelineError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No file part")]
    NoFilePart,

    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Detection did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Detection task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NoFilePart => StatusCode::BAD_REQUEST,
            AppError::Multipart(e) => e.status(),
            AppError::Upload(e) => match e {
                UploadError::EmptyFilename
                | UploadError::DisallowedExtension(_)
                | UploadError::InvalidFilename(_) => StatusCode::BAD_REQUEST,
                UploadError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Pipeline(e) => match e {
                PipelineError::Decode { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                PipelineError::Inference(_)
                | PipelineError::Storage { .. }
                | PipelineError::InvalidPath(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown to the client. Server-side detail stays in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::Upload(UploadError::EmptyFilename) => "No selected file".to_string(),
            AppError::Upload(UploadError::DisallowedExtension(_)) => {
                "File type not allowed".to_string()
            }
            AppError::Upload(UploadError::InvalidFilename(_)) => "Invalid file name".to_string(),
            AppError::Pipeline(PipelineError::Decode { .. }) => {
                "Uploaded file is not a readable image".to_string()
            }
            AppError::Timeout(_) => "Detection timed out".to_string(),
            e if e.status().is_server_error() => "Detection failed".to_string(),
            e => e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, self.public_message()).into_response()
    }
}
