use crate::filename::secure_filename;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("No selected file")]
    EmptyFilename,

    #[error("File type not allowed: {0}")]
    DisallowedExtension(String),

    #[error("Invalid file name: {0}")]
    InvalidFilename(String),

    #[error("Failed to store upload at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub upload_dir: PathBuf,
    /// Lowercase, without the leading dot
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub filename: String,
    pub path: PathBuf,
}

pub struct UploadHandler {
    config: UploadConfig,
}

impl UploadHandler {
    pub fn new(config: UploadConfig) -> Self {
        Self { config }
    }

    pub fn upload_dir(&self) -> &PathBuf {
        &self.config.upload_dir
    }

    /// True when the text after the last `.` is an allowed extension, ignoring case.
    pub fn allowed_file(&self, name: &str) -> bool {
        name.rsplit_once('.').is_some_and(|(_, ext)| {
            let ext = ext.to_ascii_lowercase();
            self.config.allowed_extensions.iter().any(|a| *a == ext)
        })
    }

    /// Persist an upload under its sanitised name.
    ///
    /// Nothing touches the filesystem until the name has passed every check.
    /// An existing file with the same sanitised name is overwritten.
    pub fn store(&self, name: &str, bytes: &[u8]) -> Result<StoredUpload, UploadError> {
        if name.is_empty() {
            return Err(UploadError::EmptyFilename);
        }
        if !self.allowed_file(name) {
            return Err(UploadError::DisallowedExtension(name.to_string()));
        }

        let filename = secure_filename(name);
        if filename.is_empty() {
            return Err(UploadError::InvalidFilename(name.to_string()));
        }

        let path = self.config.upload_dir.join(&filename);
        fs::create_dir_all(&self.config.upload_dir)
            .and_then(|_| fs::write(&path, bytes))
            .map_err(|source| UploadError::Storage {
                path: path.clone(),
                source,
            })?;

        tracing::info!(
            filename = %filename,
            size = bytes.len(),
            path = %path.display(),
            "Upload stored"
        );

        Ok(StoredUpload { filename, path })
    }
}
