//! Remote repository integration for storing uploaded packages
//!
//! Writes files through the GitHub contents API. The workflow only talks to
//! the network through [`RepositoryService`], so tests can swap in the mock.

pub mod client;
pub mod mock;

pub use client::GithubContentsClient;
pub use mock::MockRepositoryClient;

use crate::config::Config;
use crate::error::UploadError;
use crate::models::{PutContentsResponse, UploadRequest};
use async_trait::async_trait;

#[async_trait]
pub trait RepositoryService: Send + Sync {
    /// Create or update one file at `request.storage_path`.
    async fn put_contents(
        &self,
        config: &Config,
        request: &UploadRequest,
    ) -> std::result::Result<PutContentsResponse, UploadError>;
}
