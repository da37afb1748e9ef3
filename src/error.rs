//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror,
//! plus the user-facing alert mapping for file selection and upload failures.

use std::time::Duration;
use thiserror::Error;

/// How long a UI layer should keep an alert on screen before dismissing it.
pub const ALERT_DISPLAY_DURATION: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Upload(#[from] UploadError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Rejections raised while selecting a local package file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FileError {
    #[error("'{name}' is not an .apk file")]
    InvalidExtension { name: String },

    #[error("file is {size} bytes, limit is {max} bytes")]
    FileTooLarge { size: u64, max: u64 },
}

/// Failures of a single submission. None of them are retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("no file selected")]
    NoFileSelected,

    #[error("configuration incomplete, missing: {}", missing.join(", "))]
    ConfigurationInvalid { missing: Vec<&'static str> },

    #[error("remote write rejected (status {status}): {message}")]
    RemoteWriteRejected { status: u16, message: String },

    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("could not read selected file: {0}")]
    FileRead(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Success,
}

/// Transient notification surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub severity: Severity,
    pub message: String,
}

impl Alert {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    pub fn display_duration(&self) -> Duration {
        ALERT_DISPLAY_DURATION
    }
}

impl FileError {
    pub fn alert(&self) -> Alert {
        match self {
            FileError::InvalidExtension { .. } => {
                Alert::new(Severity::Error, "Please select an .apk file")
            }
            FileError::FileTooLarge { max, .. } => Alert::new(
                Severity::Error,
                format!(
                    "File size must not exceed {}",
                    crate::format::format_size(*max)
                ),
            ),
        }
    }
}

impl UploadError {
    pub fn alert(&self) -> Alert {
        match self {
            UploadError::NoFileSelected => {
                Alert::new(Severity::Error, "Please select an APK file first")
            }
            UploadError::ConfigurationInvalid { .. } => Alert::new(
                Severity::Warning,
                "Configuration incomplete! Please check your .env file and ensure all required variables are set.",
            ),
            UploadError::RemoteWriteRejected { status, message } => {
                let text = match status {
                    401 => "Invalid or expired GitHub token. Please check your configuration."
                        .to_string(),
                    404 => "Repository not found. Please check the repository name and permissions."
                        .to_string(),
                    413 => "File too large for GitHub. Please use a smaller file.".to_string(),
                    _ => format!("Upload failed: {}", message),
                };
                Alert::new(Severity::Error, text)
            }
            UploadError::NetworkFailure(message) => {
                Alert::new(Severity::Error, format!("Upload failed: {}", message))
            }
            UploadError::FileRead(message) => Alert::new(
                Severity::Error,
                format!("Could not read the selected file: {}", message),
            ),
        }
    }
}
