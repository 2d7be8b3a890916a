//! omnisift command-line interface.
//!
//! `omnisift detect <file>` prints the detected content type as JSON and
//! `omnisift extract <file>...` prints the assembled metadata envelope for
//! every file, one JSON document per line, in argument order.

#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use omnisift::{MetadataOrchestrator, PipelineConfig, ProcessorRegistry, UniversalMetadata};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "omnisift", version)]
#[command(about = "Content type detection and metadata extraction", long_about = None)]
struct Cli {
    /// Configuration file (.toml or .json); omnisift.toml is searched for otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Pretty-print JSON output
    #[arg(short, long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the content type of a file
    Detect {
        /// File to inspect
        file: PathBuf,
    },

    /// Extract metadata from one or more files
    Extract {
        /// Files to process
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Detect { file } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let result = omnisift::detect(&bytes, &file_name(&file));
            print_json(&result, cli.pretty)?;
        }

        Commands::Extract { files } => {
            let config = load_config(cli.config.as_deref())?;
            for metadata in extract(config, files).await? {
                if cli.pretty {
                    print_json(&metadata, true)?;
                } else {
                    println!("{}", metadata.to_json()?);
                }
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Ignore the error if a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => Ok(PipelineConfig::discover()
            .context("failed to discover configuration")?
            .unwrap_or_default()),
    }
}

async fn extract(config: PipelineConfig, files: Vec<PathBuf>) -> Result<Vec<UniversalMetadata>> {
    let registry = Arc::new(ProcessorRegistry::with_defaults().with_lifecycle_timeout(config.lifecycle_timeout()));
    registry
        .initialize()
        .await
        .context("failed to initialize processors")?;

    let orchestrator = MetadataOrchestrator::new(Arc::clone(&registry), config);
    let results = orchestrator.extract_metadata_batch(files).await;

    let report = registry.cleanup().await;
    for (name, error) in &report.failed {
        tracing::warn!(processor = %name, error = %error, "processor cleanup failed");
    }

    Ok(results)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}
