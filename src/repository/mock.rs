use super::RepositoryService;
use crate::config::Config;
use crate::error::UploadError;
use crate::models::{CommitInfo, PutContentsResponse, UploadRequest};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory repository that records every write.
#[derive(Clone)]
pub struct MockRepositoryClient {
    files: Arc<Mutex<HashMap<String, String>>>,
    requests: Arc<Mutex<Vec<UploadRequest>>>,
    failure: Arc<Mutex<Option<UploadError>>>,
}

impl MockRepositoryClient {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            failure: Arc::new(Mutex::new(None)),
        }
    }

    /// Make every subsequent write fail with `error`.
    pub fn with_failure(self, error: UploadError) -> Self {
        *self.failure.lock().unwrap() = Some(error);
        self
    }

    pub fn with_rejection(self, status: u16, message: &str) -> Self {
        self.with_failure(UploadError::RemoteWriteRejected {
            status,
            message: message.to_string(),
        })
    }

    pub fn clear_failure(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn get_put_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn get_requests(&self) -> Vec<UploadRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Stored base64 content keyed by storage path.
    pub fn get_files(&self) -> HashMap<String, String> {
        self.files.lock().unwrap().clone()
    }
}

impl Default for MockRepositoryClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RepositoryService for MockRepositoryClient {
    async fn put_contents(
        &self,
        _config: &Config,
        request: &UploadRequest,
    ) -> std::result::Result<PutContentsResponse, UploadError> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }

        self.files
            .lock()
            .unwrap()
            .insert(request.storage_path.clone(), request.content.clone());
        Ok(PutContentsResponse {
            content: None,
            commit: Some(CommitInfo {
                sha: Some(format!("mock-{}", self.get_put_count())),
            }),
        })
    }
}
