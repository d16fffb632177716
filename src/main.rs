use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kinesis2s3::Handler;
use kinesis2s3_config::{RuntimeConfig, StorageBackend};
use kinesis2s3_writer::{initialize_storage, ObjectStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Archive Kinesis JSON records to hour-partitioned object storage
#[derive(Parser)]
#[command(name = "kinesis2s3")]
#[command(version)]
#[command(about = "Replay captured Kinesis events through the archive handlers", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one captured Lambda event through a handler
    Replay {
        /// Event JSON file (an object with a `Records` array)
        #[arg(short, long, value_name = "FILE")]
        event: PathBuf,

        /// Handler to run: archive, aggregate, decode-log
        #[arg(long, value_name = "NAME", default_value = "archive")]
        handler: Handler,

        /// Output directory (switches storage to the filesystem backend)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    // Step 1: file and environment layers
    let config = RuntimeConfig::load_unvalidated(cli.config.as_deref())
        .context("Failed to load configuration")?;

    let Command::Replay {
        event,
        handler,
        output,
    } = cli.command;

    // Step 2: CLI overrides (highest priority), then validation
    let config = kinesis2s3::apply_overrides(
        config,
        handler,
        output.as_deref(),
        cli.log_level.as_deref(),
    )?;
    kinesis2s3_lambda::init_tracing(&config.logging);

    let store = match handler {
        Handler::Archive => {
            if config.storage.backend == StorageBackend::Fs {
                create_output_dir(&config)?;
            }
            let operator = initialize_storage(&config.storage)?;
            Some(Arc::new(operator) as Arc<dyn ObjectStore>)
        }
        Handler::Aggregate | Handler::DecodeLog => None,
    };

    let event = kinesis2s3::load_event(&event).await?;
    tracing::info!(
        handler = handler.name(),
        records = event.len(),
        "Replaying Kinesis event"
    );

    let report = kinesis2s3::replay_event(handler, &config, store, &event).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn create_output_dir(config: &RuntimeConfig) -> Result<()> {
    let fs_config = config
        .storage
        .fs
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("filesystem backend requires storage.fs configuration"))?;

    let output_path = PathBuf::from(&fs_config.path);
    if !output_path.exists() {
        std::fs::create_dir_all(&output_path)
            .with_context(|| format!("Failed to create output directory: {}", fs_config.path))?;
    }
    Ok(())
}
