use std::path::PathBuf;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Detection service failed: {0}")]
    Inference(#[source] anyhow::Error),

    #[error("Storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("Image path has no file name: {0}")]
    InvalidPath(PathBuf),
}

impl PipelineError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        PipelineError::Storage {
            path: path.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display_formatting() {
        let err = PipelineError::Inference(anyhow::anyhow!("session crashed"));
        assert_eq!(err.to_string(), "Detection service failed: session crashed");

        let err = PipelineError::InvalidPath(PathBuf::from("/"));
        assert_eq!(err.to_string(), "Image path has no file name: /");

        let err = PipelineError::storage(
            "static/car.jpg",
            io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
        );
        assert_eq!(err.to_string(), "Storage error at static/car.jpg: read-only");
    }

    #[test]
    fn test_storage_keeps_source_chain() {
        let err = PipelineError::storage("static", io::Error::other("disk full"));
        let source = std::error::Error::source(&err).expect("storage error should carry a source");
        assert_eq!(source.to_string(), "disk full");
    }
}
