use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;

use sensebridge::adapters::{ModelFetcher, ReqwestFetcher, TomlConfigStore};
use sensebridge::domain::ArtifactStatus;
use sensebridge::infrastructure::init_logging;
use sensebridge::ports::ConfigStore;
use sensebridge::setup::{self, WorkspacePaths};
use sensebridge::{RunOptions, SenseBridge};

/// SenseBridge assistive technology system.
#[derive(Parser, Debug)]
#[command(name = "sensebridge")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Run in headless mode (no dashboard)
    #[arg(long)]
    headless: bool,

    /// Run in simulation mode (simulated hardware)
    #[arg(long)]
    simulation: bool,

    /// Exit after the specified number of seconds
    #[arg(long)]
    timeout: Option<f64>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose (trace-level) logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prepare the workspace: create directories and fetch the audio-event model
    Setup {
        /// Skip the model download
        #[arg(long)]
        skip_model: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level_override = if cli.verbose {
        Some("trace".to_string())
    } else if cli.debug {
        Some("debug".to_string())
    } else {
        None
    };

    match cli.command {
        Some(Command::Setup { skip_model }) => run_setup(skip_model, log_level_override).await,
        None => {
            let options = RunOptions {
                headless: cli.headless,
                simulation: cli.simulation,
                timeout: cli.timeout.map(Duration::from_secs_f64),
                log_level_override,
            };
            let app = SenseBridge::new(options)?;
            app.run().await?;
            Ok(())
        }
    }
}

async fn run_setup(skip_model: bool, log_level_override: Option<String>) -> anyhow::Result<()> {
    let store = TomlConfigStore::new()?;
    let config = store.load()?;

    let level = log_level_override.unwrap_or_else(|| config.logging.level.clone());
    let _guard = init_logging(&store.logs_dir(), &level, config.logging.file_logging)?;

    setup::prepare_workspace(&WorkspacePaths::from_store(&store))?;
    info!(home = %store.home_dir().display(), "Workspace prepared");

    if skip_model {
        info!("Skipping model download");
        return Ok(());
    }

    let fetcher = ModelFetcher::new(Arc::new(ReqwestFetcher::new()?), store.models_dir());
    match setup::ensure_model(&fetcher).await? {
        ArtifactStatus::Installed { path, size_bytes } => {
            info!(path = %path.display(), size_bytes, "Audio-event model ready");
        }
        ArtifactStatus::Placeholder { path } => {
            info!(
                path = %path.display(),
                "Model download failed; placeholder written, fallback classification will be used"
            );
        }
        ArtifactStatus::Missing => {}
    }

    Ok(())
}
