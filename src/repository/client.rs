use super::RepositoryService;
use crate::config::Config;
use crate::error::UploadError;
use crate::models::{PutContentsResponse, RemoteErrorBody, UploadRequest};
use async_trait::async_trait;
use reqwest::Client;

const GENERIC_REMOTE_MESSAGE: &str = "Upload failed";

/// Writes files with `PUT /repos/{owner}/{repo}/contents/{path}`.
pub struct GithubContentsClient {
    client: Client,
}

impl GithubContentsClient {
    pub fn new() -> Self {
        Self::new_with_client(Client::new())
    }

    pub fn new_with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for GithubContentsClient {
    fn default() -> Self {
        Self::new()
    }
}

fn remote_message(body: &str) -> String {
    serde_json::from_str::<RemoteErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| GENERIC_REMOTE_MESSAGE.to_string())
}

#[async_trait]
impl RepositoryService for GithubContentsClient {
    async fn put_contents(
        &self,
        config: &Config,
        request: &UploadRequest,
    ) -> std::result::Result<PutContentsResponse, UploadError> {
        let url = config.api_write_url(&request.storage_path);
        let response = self
            .client
            .put(&url)
            .headers(config.auth_headers())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to GitHub: {}", e);
                UploadError::NetworkFailure(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UploadError::NetworkFailure(e.to_string()))?;

        if !status.is_success() {
            let message = remote_message(&body);
            tracing::error!("GitHub API error (status {}): {}", status, message);
            return Err(UploadError::RemoteWriteRejected {
                status: status.as_u16(),
                message,
            });
        }

        if body.trim().is_empty() {
            return Ok(PutContentsResponse::default());
        }
        Ok(serde_json::from_str(&body).unwrap_or_else(|e| {
            tracing::warn!("Unexpected GitHub response body ({}): {}", e, body);
            PutContentsResponse::default()
        }))
    }
}
