//! reelflow - browser-automation workflow runner with narrated recording.
//!
//! Main entry point for the reelflow CLI.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use reelflow_browser::BrowserController;
use reelflow_config::{RecordingConfig, GLOBAL_CONFIG_FILE};
use reelflow_engine::{storage, WorkflowRunner, WorkflowStore};
use reelflow_protocols::{ExecutionResult, RunOptions, ValidationFailure};

/// reelflow CLI.
#[derive(Parser)]
#[command(name = "reelflow")]
#[command(about = "Replay browser workflows into narrated video recordings")]
#[command(version)]
struct Cli {
    /// Project root holding workflows/, output/, and the recording config
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the directory layout, default config, and an example
    /// workflow
    Setup,

    /// Execute a workflow and record the browser session
    Record {
        /// Workflow name under workflows/
        name: String,

        /// Validate the workflow without executing it
        #[arg(long)]
        dry_run: bool,

        /// Load a saved browser session by name before the first action
        #[arg(long)]
        session: Option<String>,

        /// Save the browser session under this name after a successful run
        #[arg(long)]
        save_session: Option<String>,
    },

    /// Execute a workflow without video capture (timeline log only)
    Run {
        /// Workflow name under workflows/
        name: String,

        /// Load a saved browser session by name before the first action
        #[arg(long)]
        session: Option<String>,

        /// Save the browser session under this name after a successful run
        #[arg(long)]
        save_session: Option<String>,
    },

    /// Validate a workflow and report every issue found
    Validate {
        /// Workflow name under workflows/
        name: String,
    },

    /// List stored workflows
    List,

    /// Scaffold a new workflow template
    New {
        /// Name for the new workflow
        name: String,
    },
}

fn init_tracing(root: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender =
        RollingFileAppender::new(Rotation::DAILY, root.join("logs"), "reelflow.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();
    guard
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = init_tracing(&cli.root);

    let result = match cli.command {
        Commands::Setup => setup(&cli.root).await,
        Commands::Record {
            name,
            dry_run,
            session,
            save_session,
        } => {
            record(
                &cli.root,
                &name,
                dry_run,
                RunOptions {
                    record: true,
                    load_session: session,
                    save_session,
                },
            )
            .await
        }
        Commands::Run {
            name,
            session,
            save_session,
        } => {
            record(
                &cli.root,
                &name,
                false,
                RunOptions {
                    record: false,
                    load_session: session,
                    save_session,
                },
            )
            .await
        }
        Commands::Validate { name } => validate(&cli.root, &name),
        Commands::List => list(&cli.root),
        Commands::New { name } => new_workflow(&cli.root, &name),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn setup(root: &Path) -> anyhow::Result<()> {
    println!("Setting up reelflow...");

    storage::ensure_dir(&root.join("workflows"))?;
    storage::ensure_dir(&root.join("output"))?;
    storage::ensure_dir(&storage::temp_videos_dir(root))?;

    let config_path = root.join(GLOBAL_CONFIG_FILE);
    if !config_path.exists() {
        let defaults = serde_json::to_value(RecordingConfig::default())?;
        storage::write_json(&config_path, &defaults)?;
        println!("Wrote default configuration to {}", config_path.display());
    }

    let store = WorkflowStore::new(root);
    if !store.actions_path("example").exists() {
        store.create_template("example")?;
        println!("Created example workflow");
    }

    match BrowserController::find_browser() {
        Some(path) => println!("Browser found: {}", path.display()),
        None => println!("Warning: no Chromium-family browser found; install Chrome or Chromium"),
    }
    if ffmpeg_available().await {
        println!("ffmpeg is installed");
    } else {
        println!("Warning: ffmpeg not found in PATH; video encoding will be unavailable");
        println!("  macOS:  brew install ffmpeg");
        println!("  Ubuntu: sudo apt-get install ffmpeg");
    }

    println!("Setup complete");
    Ok(())
}

async fn ffmpeg_available() -> bool {
    tokio::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

async fn record(
    root: &Path,
    name: &str,
    dry_run: bool,
    options: RunOptions,
) -> anyhow::Result<()> {
    let runner = WorkflowRunner::new(root)?;

    println!("Loading workflow: {name}");
    let raw = runner.load_raw(name)?;

    let workflow = match runner.validate(&raw) {
        Ok(workflow) => workflow,
        Err(failure) => {
            print_validation_failure(&failure);
            anyhow::bail!("workflow '{name}' is invalid");
        }
    };
    println!("Workflow is valid ({} actions)", workflow.actions.len());

    if dry_run {
        println!("Dry run mode - workflow not executed");
        return Ok(());
    }

    println!("Executing workflow...");
    let result = runner.execute(&workflow, &options).await;
    report_result(&result);

    if result.success {
        Ok(())
    } else {
        anyhow::bail!("workflow '{name}' failed")
    }
}

fn report_result(result: &ExecutionResult) {
    if result.success {
        println!("\nWorkflow executed successfully");
    } else {
        println!("\nWorkflow failed");
        if let Some(error) = &result.error {
            println!("  Error: {error}");
        }
        if let Some(index) = result.failed_action {
            println!("  Failed action index: {index}");
        }
    }
    if let Some(video) = &result.video_path {
        println!("  Video: {}", video.display());
    }
    if let Some(dir) = &result.output_dir {
        println!("  Output directory: {}", dir.display());
    }
    println!("  Duration: {:.1}s", result.duration.as_secs_f64());
}

fn validate(root: &Path, name: &str) -> anyhow::Result<()> {
    let runner = WorkflowRunner::new(root)?;
    let raw = runner.load_raw(name)?;

    match runner.validate(&raw) {
        Ok(workflow) => {
            println!(
                "Workflow '{name}' is valid ({} actions)",
                workflow.actions.len()
            );
            Ok(())
        }
        Err(failure) => {
            print_validation_failure(&failure);
            anyhow::bail!("workflow '{name}' is invalid")
        }
    }
}

fn print_validation_failure(failure: &ValidationFailure) {
    eprintln!("Workflow validation failed:");
    for issue in &failure.issues {
        eprintln!("  - {}", issue.message);
        if let Some(field) = &issue.field {
            if !field.is_empty() {
                eprintln!("    Field: {field}");
            }
        }
        if let Some(index) = issue.action_index {
            eprintln!("    Action index: {index}");
        }
    }
}

fn list(root: &Path) -> anyhow::Result<()> {
    let store = WorkflowStore::new(root);
    let workflows = store.list()?;
    if workflows.is_empty() {
        println!("No workflows found. Create one with `reelflow new <name>`.");
        return Ok(());
    }
    println!("Available workflows:");
    for name in workflows {
        println!("  {name}");
    }
    Ok(())
}

fn new_workflow(root: &Path, name: &str) -> anyhow::Result<()> {
    let store = WorkflowStore::new(root);
    if store.actions_path(name).exists() {
        warn!("workflow '{name}' already exists");
        anyhow::bail!("workflow '{name}' already exists");
    }
    let dir = store.create_template(name)?;
    println!("Created workflow template at {}", dir.display());
    Ok(())
}
