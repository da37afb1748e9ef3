//! Data models and structures
//!
//! Defines the selected file, the contents API request/response bodies and
//! the result handed back to the caller after a successful upload.

use crate::Result;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where the bytes of a selected file live until they are uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    Memory(Arc<[u8]>),
    Disk(PathBuf),
}

/// A user-chosen package. Name and size are known at selection time; the
/// bytes are only read when the upload starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub size_bytes: u64,
    pub source: FileSource,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size_bytes: bytes.len() as u64,
            source: FileSource::Memory(bytes.into()),
        }
    }

    /// Describe a file on disk from its metadata, without reading it.
    /// The name is the final path component.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            )
            .into());
        }

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            name,
            size_bytes: metadata.len(),
            source: FileSource::Disk(path.to_path_buf()),
        })
    }
}

impl FileSource {
    /// Standard padded base64 of the bytes, without a data-URL prefix.
    pub async fn read_base64(&self) -> std::io::Result<String> {
        let engine = base64::engine::general_purpose::STANDARD;
        match self {
            FileSource::Memory(bytes) => Ok(engine.encode(bytes)),
            FileSource::Disk(path) => {
                let bytes = tokio::fs::read(path).await?;
                Ok(engine.encode(bytes))
            }
        }
    }
}

// GitHub contents API request/response models
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UploadRequest {
    #[serde(skip)]
    pub storage_path: String,
    pub message: String,
    pub content: String,
    pub branch: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PutContentsResponse {
    pub content: Option<ContentInfo>,
    pub commit: Option<CommitInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ContentInfo {
    pub path: Option<String>,
    pub sha: Option<String>,
    pub html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommitInfo {
    pub sha: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoteErrorBody {
    pub message: Option<String>,
}

/// Links and rendered artifacts for one successful upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadResult {
    pub direct_download_url: String,
    pub repository_view_url: String,
    pub embeddable_html: String,
    pub summary: String,
    pub storage_path: String,
    pub display_name: String,
    pub formatted_size: String,
    pub uploaded_at: String,
    pub commit_sha: Option<String>,
}
