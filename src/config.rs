//! Repository configuration
//!
//! Holds the immutable settings for the target GitHub repository and builds
//! every URL and header the upload workflow needs from them.

use crate::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};

pub const DEFAULT_ACCOUNT: &str = "Webgamerstudio";
pub const DEFAULT_REPOSITORY: &str = "Download-link-generator-AR";
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_RAW_BASE_URL: &str = "https://raw.githubusercontent.com";
pub const DEFAULT_WEB_BASE_URL: &str = "https://github.com";
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;
pub const DEFAULT_UPLOAD_PATH: &str = "apks";

/// Uploads always target this branch; its existence is not checked.
pub const BRANCH: &str = "main";

pub const CLIENT_USER_AGENT: &str = "APK-Generator-v2.0";
pub const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub account: String,
    pub repository: String,
    pub access_token: String,
    pub api_base_url: String,
    pub raw_base_url: String,
    pub web_base_url: String,
    pub max_file_size: u64,
    pub upload_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account: DEFAULT_ACCOUNT.to_string(),
            repository: DEFAULT_REPOSITORY.to_string(),
            access_token: String::new(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            raw_base_url: DEFAULT_RAW_BASE_URL.to_string(),
            web_base_url: DEFAULT_WEB_BASE_URL.to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            upload_path: DEFAULT_UPLOAD_PATH.to_string(),
        }
    }
}

impl Config {
    /// Load from the process environment, reading `.env` first if present.
    /// A missing `.env` is fine; a malformed one is an error.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e.into());
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Merge defaults with whatever `lookup` returns. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let max_file_size = match var("MAX_FILE_SIZE") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!("MAX_FILE_SIZE must be a byte count, got '{}'", raw))
            })?,
            None => defaults.max_file_size,
        };

        Ok(Self {
            account: var("GITHUB_USERNAME").unwrap_or(defaults.account),
            repository: var("GITHUB_REPO").unwrap_or(defaults.repository),
            access_token: var("GITHUB_TOKEN").unwrap_or(defaults.access_token),
            api_base_url: var("GITHUB_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            raw_base_url: var("GITHUB_RAW_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.raw_base_url),
            web_base_url: var("GITHUB_WEB_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.web_base_url),
            max_file_size,
            upload_path: var("UPLOAD_PATH")
                .map(|path| path.trim_matches('/').to_string())
                .filter(|path| !path.is_empty())
                .unwrap_or(defaults.upload_path),
        })
    }

    /// Names of the required variables that are currently empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("GITHUB_USERNAME", &self.account),
            ("GITHUB_REPO", &self.repository),
            ("GITHUB_TOKEN", &self.access_token),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_valid(&self) -> bool {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            tracing::warn!("Missing configuration: {}", missing.join(", "));
            return false;
        }
        true
    }

    pub fn repository_slug(&self) -> String {
        format!("{}/{}", self.account, self.repository)
    }

    pub fn api_write_url(&self, storage_path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base_url, self.account, self.repository, storage_path
        )
    }

    pub fn direct_download_url(&self, storage_path: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.raw_base_url, self.account, self.repository, BRANCH, storage_path
        )
    }

    pub fn repository_view_url(&self, storage_path: &str) -> String {
        format!(
            "{}/{}/{}/blob/{}/{}",
            self.web_base_url, self.account, self.repository, BRANCH, storage_path
        )
    }

    /// Headers for every contents API request. An empty token still produces
    /// `Authorization: token `; callers check [`Config::is_valid`] first.
    pub fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        match HeaderValue::from_str(&format!("token {}", self.access_token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(e) => tracing::error!("GITHUB_TOKEN is not a valid header value: {}", e),
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        headers
    }
}
