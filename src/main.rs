use anyhow::Result;
use apk_link_generator::config::Config;
use apk_link_generator::error::Severity;
use apk_link_generator::models::{SelectedFile, UploadResult};
use apk_link_generator::repository::GithubContentsClient;
use apk_link_generator::workflow::{UploadWorkflow, WorkflowEvent};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "apk-link-generator")]
#[command(about = "Upload an APK to GitHub and generate a direct download link")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Upload a package and print its links.
    Upload {
        /// Path to the .apk file.
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Display name; derived from the filename when omitted.
        #[arg(long)]
        name: Option<String>,

        /// Write the embeddable download page to this path.
        #[arg(long, value_name = "PATH")]
        html_out: Option<PathBuf>,

        /// Write the plain-text summary to this path.
        #[arg(long, value_name = "PATH")]
        summary_out: Option<PathBuf>,

        /// Print the full result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show the target repository and whether the token is configured.
    Status,
}

fn log_event(event: WorkflowEvent) {
    match event {
        WorkflowEvent::StateChanged(state) => debug!("State: {:?}", state),
        WorkflowEvent::Progress { percent, message } => info!("[{:>3}%] {}", percent, message),
        WorkflowEvent::Alert(alert) => match alert.severity {
            Severity::Error => error!("{}", alert.message),
            Severity::Warning => warn!("{}", alert.message),
            Severity::Success => info!("{}", alert.message),
        },
    }
}

fn print_status(config: &Config) {
    println!("Repository: {}", config.repository_slug());
    if config.is_valid() {
        println!("Token: Valid ✅");
    } else {
        println!("Token: Invalid ❌ - Check .env file");
        println!("Missing: {}", config.missing_fields().join(", "));
    }
}

async fn write_output(path: Option<&Path>, contents: &str, what: &str) -> Result<()> {
    if let Some(path) = path {
        tokio::fs::write(path, contents).await?;
        info!("Saved {} to {}", what, path.display());
    }
    Ok(())
}

fn print_result(result: &UploadResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        println!("Direct download: {}", result.direct_download_url);
        println!("GitHub view:     {}", result.repository_view_url);
        println!();
        print!("{}", result.summary);
    }
    Ok(())
}

/// Select the file at `file` and submit it once.
async fn select_and_submit(
    workflow: &mut UploadWorkflow<'_>,
    file: &Path,
) -> apk_link_generator::Result<UploadResult> {
    let selected = SelectedFile::from_path(file).await?;
    workflow.select_file(selected)?;
    Ok(workflow.submit().await?)
}

async fn upload(
    config: &Config,
    file: &Path,
    name: Option<&str>,
    html_out: Option<&Path>,
    summary_out: Option<&Path>,
    json: bool,
) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let logger = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            log_event(event);
        }
    });

    let mut workflow =
        UploadWorkflow::new(config, Box::new(GithubContentsClient::new())).with_events(tx);
    if let Some(name) = name {
        workflow.set_display_name(name);
    }

    let outcome = select_and_submit(&mut workflow, file).await;

    drop(workflow);
    logger.await?;

    let result = outcome?;
    write_output(html_out, &result.embeddable_html, "download page").await?;
    write_output(summary_out, &result.summary, "summary").await?;
    print_result(&result, json)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "apk_link_generator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    match args.command {
        Command::Status => {
            print_status(&config);
            Ok(())
        }
        Command::Upload {
            file,
            name,
            html_out,
            summary_out,
            json,
        } => {
            info!("Starting upload of {}", file.display());
            match upload(
                &config,
                &file,
                name.as_deref(),
                html_out.as_deref(),
                summary_out.as_deref(),
                json,
            )
            .await
            {
                Ok(()) => Ok(()),
                Err(e) => {
                    error!("Upload failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
