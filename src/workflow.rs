//! Upload workflow: file selection, one contents write, link generation.

use crate::config::{Config, BRANCH};
use crate::error::{Alert, FileError, Severity, UploadError};
use crate::format::{
    default_display_name, format_size, iso_timestamp, storage_timestamp, PACKAGE_EXTENSION,
};
use crate::models::{FileSource, SelectedFile, UploadRequest, UploadResult};
use crate::repository::RepositoryService;
use crate::templates::{render_download_page, render_summary, LinkDetails};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    FileSelected,
    Uploading,
    Succeeded,
    Failed,
}

/// Notifications for whatever UI drives the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    StateChanged(WorkflowState),
    Progress { percent: u8, message: String },
    Alert(Alert),
}

/// Everything `submit` needs, captured before the state moves to `Uploading`.
struct PreparedUpload {
    source: FileSource,
    request: UploadRequest,
    display_name: String,
    file_name: String,
    formatted_size: String,
    uploaded_at: String,
}

pub struct UploadWorkflow<'a> {
    config: &'a Config,
    repository: Box<dyn RepositoryService>,
    state: WorkflowState,
    selected: Option<SelectedFile>,
    formatted_size: Option<String>,
    display_name: Option<String>,
    clock: fn() -> DateTime<Utc>,
    events: Option<UnboundedSender<WorkflowEvent>>,
}

impl<'a> UploadWorkflow<'a> {
    pub fn new(config: &'a Config, repository: Box<dyn RepositoryService>) -> Self {
        Self {
            config,
            repository,
            state: WorkflowState::Idle,
            selected: None,
            formatted_size: None,
            display_name: None,
            clock: Utc::now,
            events: None,
        }
    }

    /// Replace the time source used for storage paths and commit messages.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_events(mut self, events: UnboundedSender<WorkflowEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn formatted_size(&self) -> Option<&str> {
        self.formatted_size.as_deref()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Set the display name typed by the user. Blank input clears it.
    pub fn set_display_name(&mut self, name: &str) {
        let name = name.trim();
        self.display_name = (!name.is_empty()).then(|| name.to_string());
    }

    /// Validate and take `file` as the current selection.
    ///
    /// A rejected file leaves any earlier selection in place.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<&SelectedFile, FileError> {
        if !file.name.ends_with(PACKAGE_EXTENSION) {
            let err = FileError::InvalidExtension { name: file.name };
            self.emit(WorkflowEvent::Alert(err.alert()));
            return Err(err);
        }

        if file.size_bytes > self.config.max_file_size {
            let err = FileError::FileTooLarge {
                size: file.size_bytes,
                max: self.config.max_file_size,
            };
            self.emit(WorkflowEvent::Alert(err.alert()));
            return Err(err);
        }

        let formatted_size = format_size(file.size_bytes);
        info!("Selected {} ({})", file.name, formatted_size);

        if self.display_name.is_none() {
            let default_name = default_display_name(&file.name);
            if !default_name.is_empty() {
                self.display_name = Some(default_name);
            }
        }
        self.formatted_size = Some(formatted_size);
        self.transition(WorkflowState::FileSelected);

        Ok(&*self.selected.insert(file))
    }

    pub fn can_submit(&self) -> bool {
        self.selected.is_some() && self.config.missing_fields().is_empty()
    }

    /// Upload the selected file once and build its links.
    ///
    /// On any failure the workflow settles back in `FileSelected` with the
    /// same file, ready for another attempt.
    pub async fn submit(&mut self) -> Result<UploadResult, UploadError> {
        let mut prepared = match self.prepare() {
            Ok(prepared) => prepared,
            Err(err) => {
                self.emit(WorkflowEvent::Alert(err.alert()));
                return Err(err);
            }
        };

        self.transition(WorkflowState::Uploading);
        self.progress(10, "Preparing upload...");
        self.progress(30, "Encoding file...");
        prepared.request.content = match prepared.source.read_base64().await {
            Ok(content) => content,
            Err(e) => return Err(self.fail(UploadError::FileRead(e.to_string()))),
        };
        self.progress(60, "Uploading to GitHub...");

        info!(
            "Uploading {} to {} as {}",
            prepared.file_name,
            self.config.repository_slug(),
            prepared.request.storage_path
        );

        let response = match self
            .repository
            .put_contents(self.config, &prepared.request)
            .await
        {
            Ok(response) => response,
            Err(err) => return Err(self.fail(err)),
        };

        let storage_path = &prepared.request.storage_path;
        let direct_download_url = self.config.direct_download_url(storage_path);
        let repository_view_url = self.config.repository_view_url(storage_path);
        let repository = self.config.repository_slug();

        let details = LinkDetails {
            app_name: &prepared.display_name,
            file_name: &prepared.file_name,
            file_size: &prepared.formatted_size,
            uploaded_at: &prepared.uploaded_at,
            repository: &repository,
            storage_path,
            download_url: &direct_download_url,
            view_url: &repository_view_url,
        };
        let embeddable_html = render_download_page(&details);
        let summary = render_summary(&details);

        let commit_sha = response.commit.and_then(|commit| commit.sha);
        if let Some(html_url) = response.content.and_then(|content| content.html_url) {
            info!("GitHub reports file at {}", html_url);
        }

        self.progress(100, "Upload complete!");
        self.transition(WorkflowState::Succeeded);
        self.emit(WorkflowEvent::Alert(Alert::new(
            Severity::Success,
            "APK uploaded successfully! Download link generated.",
        )));

        Ok(UploadResult {
            direct_download_url,
            repository_view_url,
            embeddable_html,
            summary,
            storage_path: prepared.request.storage_path,
            display_name: prepared.display_name,
            formatted_size: prepared.formatted_size,
            uploaded_at: prepared.uploaded_at,
            commit_sha,
        })
    }

    fn prepare(&self) -> Result<PreparedUpload, UploadError> {
        let file = self.selected.as_ref().ok_or(UploadError::NoFileSelected)?;

        if !self.config.is_valid() {
            return Err(UploadError::ConfigurationInvalid {
                missing: self.config.missing_fields(),
            });
        }

        let now = (self.clock)();
        let storage_path = format!(
            "{}/{}-{}",
            self.config.upload_path,
            storage_timestamp(now),
            file.name
        );
        let display_name = self
            .display_name
            .clone()
            .unwrap_or_else(|| file.name.clone());

        Ok(PreparedUpload {
            source: file.source.clone(),
            request: UploadRequest {
                storage_path,
                message: format!("Upload {} - {}", display_name, iso_timestamp(now)),
                content: String::new(),
                branch: BRANCH.to_string(),
            },
            display_name,
            file_name: file.name.clone(),
            formatted_size: format_size(file.size_bytes),
            uploaded_at: now.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        })
    }

    /// Report a failed submission and settle back on the selected file.
    fn fail(&mut self, err: UploadError) -> UploadError {
        error!("Upload failed: {}", err);
        self.transition(WorkflowState::Failed);
        self.progress(0, "Upload failed");
        self.emit(WorkflowEvent::Alert(err.alert()));
        self.transition(WorkflowState::FileSelected);
        err
    }

    fn transition(&mut self, next: WorkflowState) {
        if self.state != next {
            info!("Workflow state {:?} -> {:?}", self.state, next);
            self.state = next;
            self.emit(WorkflowEvent::StateChanged(next));
        }
    }

    fn progress(&self, percent: u8, message: &str) {
        self.emit(WorkflowEvent::Progress {
            percent,
            message: message.to_string(),
        });
    }

    fn emit(&self, event: WorkflowEvent) {
        if let Some(events) = &self.events {
            if events.send(event).is_err() {
                warn!("Workflow event receiver dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockRepositoryClient;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()
    }

    fn valid_config() -> Config {
        Config {
            account: "octo".to_string(),
            repository: "files".to_string(),
            access_token: "ghp_test".to_string(),
            ..Config::default()
        }
    }

    fn apk(name: &str, len: usize) -> SelectedFile {
        SelectedFile::new(name, vec![7u8; len])
    }

    fn workflow<'a>(config: &'a Config, repo: &MockRepositoryClient) -> UploadWorkflow<'a> {
        UploadWorkflow::new(config, Box::new(repo.clone())).with_clock(fixed_now)
    }

    #[test]
    fn test_starts_idle_and_cannot_submit() {
        let config = valid_config();
        let wf = workflow(&config, &MockRepositoryClient::new());
        assert_eq!(wf.state(), WorkflowState::Idle);
        assert!(!wf.can_submit());
    }

    #[test]
    fn test_select_sets_default_display_name_and_size() {
        let config = valid_config();
        let mut wf = workflow(&config, &MockRepositoryClient::new());

        wf.select_file(apk("my-app.apk", 1536)).unwrap();

        assert_eq!(wf.state(), WorkflowState::FileSelected);
        assert_eq!(wf.display_name(), Some("My app"));
        assert_eq!(wf.formatted_size(), Some("1.5 KB"));
        assert!(wf.can_submit());
    }

    #[test]
    fn test_select_keeps_user_display_name() {
        let config = valid_config();
        let mut wf = workflow(&config, &MockRepositoryClient::new());

        wf.set_display_name("Super Game");
        wf.select_file(apk("my-app.apk", 10)).unwrap();
        assert_eq!(wf.display_name(), Some("Super Game"));
    }

    #[test]
    fn test_rejected_selection_keeps_previous_file() {
        let config = Config {
            max_file_size: 100,
            ..valid_config()
        };
        let mut wf = workflow(&config, &MockRepositoryClient::new());
        wf.select_file(apk("first.apk", 10)).unwrap();

        let err = wf.select_file(apk("big.apk", 101)).unwrap_err();
        assert_eq!(err, FileError::FileTooLarge { size: 101, max: 100 });

        let err = wf.select_file(apk("notes.txt", 1)).unwrap_err();
        assert!(matches!(err, FileError::InvalidExtension { .. }));

        assert_eq!(wf.selected_file().unwrap().name, "first.apk");
        assert_eq!(wf.state(), WorkflowState::FileSelected);
    }

    #[test]
    fn test_can_submit_false_with_invalid_config() {
        let config = Config::default();
        let mut wf = workflow(&config, &MockRepositoryClient::new());
        wf.select_file(apk("app.apk", 1)).unwrap();
        assert!(!wf.can_submit());
    }

    #[tokio::test]
    async fn test_submit_without_file() {
        let config = valid_config();
        let repo = MockRepositoryClient::new();
        let mut wf = workflow(&config, &repo);

        let err = wf.submit().await.unwrap_err();
        assert_eq!(err, UploadError::NoFileSelected);
        assert_eq!(repo.get_put_count(), 0);
        assert_eq!(wf.state(), WorkflowState::Idle);
    }

    #[tokio::test]
    async fn test_submit_with_invalid_config() {
        let config = Config::default();
        let repo = MockRepositoryClient::new();
        let mut wf = workflow(&config, &repo);
        wf.select_file(apk("app.apk", 1)).unwrap();

        let err = wf.submit().await.unwrap_err();
        assert_eq!(
            err,
            UploadError::ConfigurationInvalid {
                missing: vec!["GITHUB_TOKEN"]
            }
        );
        assert_eq!(repo.get_put_count(), 0);
        assert_eq!(wf.state(), WorkflowState::FileSelected);
    }

    #[tokio::test]
    async fn test_submit_success_builds_links() {
        let config = valid_config();
        let repo = MockRepositoryClient::new();
        let mut wf = workflow(&config, &repo);
        wf.select_file(SelectedFile::new("my-app.apk", vec![1, 2, 3]))
            .unwrap();

        let result = wf.submit().await.unwrap();

        assert_eq!(
            result.direct_download_url,
            "https://raw.githubusercontent.com/octo/files/main/apks/2024-03-05T14-07-09-my-app.apk"
        );
        assert_eq!(
            result.repository_view_url,
            "https://github.com/octo/files/blob/main/apks/2024-03-05T14-07-09-my-app.apk"
        );
        assert_eq!(result.display_name, "My app");
        assert_eq!(result.commit_sha.as_deref(), Some("mock-1"));
        assert!(result.embeddable_html.contains(&result.direct_download_url));
        assert!(result.summary.contains("Repository: octo/files"));
        assert_eq!(wf.state(), WorkflowState::Succeeded);

        let requests = repo.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].content, "AQID");
        assert_eq!(requests[0].branch, "main");
        assert_eq!(
            requests[0].message,
            "Upload My app - 2024-03-05T14:07:09.000Z"
        );
    }

    #[tokio::test]
    async fn test_unauthorized_returns_to_file_selected() {
        let config = valid_config();
        let repo = MockRepositoryClient::new().with_rejection(401, "Bad credentials");
        let mut wf = workflow(&config, &repo);
        wf.select_file(apk("app.apk", 4)).unwrap();

        let err = wf.submit().await.unwrap_err();

        assert!(err.alert().message.contains("Invalid or expired GitHub token"));
        assert_eq!(wf.state(), WorkflowState::FileSelected);
        assert_eq!(wf.selected_file().unwrap().name, "app.apk");
        assert!(wf.can_submit());

        repo.clear_failure();
        assert!(wf.submit().await.is_ok());
        assert_eq!(repo.get_put_count(), 2);
    }

    #[tokio::test]
    async fn test_oversized_disk_file_rejected_from_metadata() {
        let config = Config {
            max_file_size: 16,
            ..valid_config()
        };
        let mut wf = workflow(&config, &MockRepositoryClient::new());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.apk");
        std::fs::write(&path, vec![0u8; 4096]).unwrap();
        let file = SelectedFile::from_path(&path).await.unwrap();

        // Removing the file proves selection never needs its contents.
        std::fs::remove_file(&path).unwrap();

        let err = wf.select_file(file).unwrap_err();
        assert_eq!(err, FileError::FileTooLarge { size: 4096, max: 16 });
        assert!(wf.selected_file().is_none());
    }

    #[tokio::test]
    async fn test_disk_file_is_read_at_submit() {
        let config = valid_config();
        let repo = MockRepositoryClient::new();
        let mut wf = workflow(&config, &repo);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("my-app.apk");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();
        wf.select_file(SelectedFile::from_path(&path).await.unwrap())
            .unwrap();

        wf.submit().await.unwrap();
        assert_eq!(repo.get_requests()[0].content, "AQID");
    }

    #[tokio::test]
    async fn test_unreadable_file_fails_submit_and_keeps_selection() {
        let config = valid_config();
        let repo = MockRepositoryClient::new();
        let mut wf = workflow(&config, &repo);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.apk");
        std::fs::write(&path, [1u8]).unwrap();
        wf.select_file(SelectedFile::from_path(&path).await.unwrap())
            .unwrap();
        std::fs::remove_file(&path).unwrap();

        let err = wf.submit().await.unwrap_err();
        assert!(matches!(err, UploadError::FileRead(_)));
        assert_eq!(repo.get_put_count(), 0);
        assert_eq!(wf.state(), WorkflowState::FileSelected);
        assert_eq!(wf.selected_file().unwrap().name, "gone.apk");
    }

    #[tokio::test]
    async fn test_storage_path_differs_only_by_filename() {
        let config = valid_config();
        let repo = MockRepositoryClient::new();
        let mut wf = workflow(&config, &repo);

        wf.select_file(apk("a.apk", 1)).unwrap();
        let first = wf.submit().await.unwrap();
        wf.select_file(apk("a.apk", 1)).unwrap();
        let same = wf.submit().await.unwrap();
        wf.select_file(apk("b.apk", 1)).unwrap();
        let other = wf.submit().await.unwrap();

        assert_eq!(first.storage_path, same.storage_path);
        assert_ne!(first.storage_path, other.storage_path);
    }

    #[tokio::test]
    async fn test_events_report_progress_and_outcome() {
        let config = valid_config();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut wf = workflow(&config, &MockRepositoryClient::new()).with_events(tx);

        wf.select_file(apk("app.apk", 1)).unwrap();
        wf.submit().await.unwrap();
        drop(wf);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert_eq!(
            events.first(),
            Some(&WorkflowEvent::StateChanged(WorkflowState::FileSelected))
        );
        assert!(events.contains(&WorkflowEvent::Progress {
            percent: 100,
            message: "Upload complete!".to_string()
        }));
        assert!(matches!(
            events.last(),
            Some(WorkflowEvent::Alert(Alert {
                severity: Severity::Success,
                ..
            }))
        ));
    }
}
