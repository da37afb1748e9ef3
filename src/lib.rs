//! APK download link generator
//!
//! Uploads an Android package to a GitHub repository through the contents
//! API, then derives a direct-download link, a repository link and an
//! embeddable download page for it.

pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod repository;
pub mod templates;
pub mod workflow;

pub use error::{Error, Result};
