use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pickups2deepar_config::{EnvSource, RuntimeConfig, StdEnvSource, StorageBackend};
use std::path::PathBuf;
use tracing::info;

/// Build DeepAR training and test datasets from streamed taxi pickups
#[derive(Parser)]
#[command(name = "pickups2deepar")]
#[command(version)]
#[command(about = "Build DeepAR training and test datasets from streamed taxi pickups", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Remote prefix holding the raw pickup records (overrides config file)
    #[arg(long, value_name = "PREFIX", global = true)]
    source_prefix: Option<String>,

    /// Local file the raw records are staged into
    #[arg(long, value_name = "FILE", global = true)]
    staging_file: Option<PathBuf>,

    /// Directory for the train/test JSON-lines files
    #[arg(short, long, value_name = "DIR", global = true)]
    output_dir: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage, build and upload the datasets (default if no subcommand given)
    Run,
    /// Build local dataset files from an already staged source file
    Build,
    /// Stage the raw records locally without building anything
    Fetch,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Stages run one after another on a single thread
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    // Steps 1-2: file and env layers, then CLI overrides, validated once at the end
    let config = resolve_config(&cli, &StdEnvSource)?;

    // Step 3: Initialize tracing before anything logs
    pickups2deepar::init_tracing(&config.logging);

    display_startup_info(&config);

    match cli.command {
        Some(Commands::Build) => {
            let files = pickups2deepar::build_datasets(&config)?;
            info!(
                "Wrote {} ({} series) and {} ({} series)",
                files.train.path.display(),
                files.train.records,
                files.test.path.display(),
                files.test.records
            );
        }
        Some(Commands::Fetch) => {
            let store = pickups2deepar::init_store(&config)?;
            let outcome = pickups2deepar::stage_source(&config, &store).await?;
            info!("Fetch finished: {:?}", outcome);
        }
        Some(Commands::Run) | None => {
            let store = pickups2deepar::init_store(&config)?;
            let report = pickups2deepar::run_pipeline(&config, &store).await?;
            for key in &report.uploaded {
                info!("Uploaded {}", key);
            }
        }
    }

    Ok(())
}

fn resolve_config<E: EnvSource>(cli: &Cli, env: &E) -> Result<RuntimeConfig> {
    let mut config = match &cli.config {
        // Explicit config file path provided
        Some(config_path) => RuntimeConfig::load_layers_with(Some(config_path.as_path()), env)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?,
        // Try PICKUPS2DEEPAR_CONFIG and default locations, fall back to defaults
        None => RuntimeConfig::load_layers_with(None, env)
            .context("Failed to load configuration")?,
    };

    apply_cli_overrides(&mut config, cli);
    config.normalize();
    config.validate()?;
    Ok(config)
}

fn apply_cli_overrides(config: &mut RuntimeConfig, cli: &Cli) {
    if let Some(prefix) = &cli.source_prefix {
        config.source.prefix = prefix.clone();
    }

    if let Some(staging) = &cli.staging_file {
        config.source.staging_file = staging.to_string_lossy().to_string();
    }

    if let Some(output) = &cli.output_dir {
        config.dataset.output_dir = output.to_string_lossy().to_string();
    }

    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
}

fn display_startup_info(config: &RuntimeConfig) {
    info!("╭─────────────────────────────────────────────────");
    info!("│ pickups2deepar v{}", env!("CARGO_PKG_VERSION"));
    info!("├─────────────────────────────────────────────────");
    info!("│ Storage backend: {}", config.storage.backend);

    match config.storage.backend {
        StorageBackend::Fs => {
            if let Some(fs) = &config.storage.fs {
                info!("│ Storage root: {}", fs.path);
            }
        }
        StorageBackend::S3 => {
            if let Some(s3) = &config.storage.s3 {
                info!("│ S3 bucket: {}", s3.bucket);
                info!("│ S3 region: {}", s3.region);
            }
        }
    }

    info!("│ Source prefix: {}", config.source.prefix);
    info!("│ Staging file: {}", config.source.staging_file);
    info!("│ Dataset prefix: {}", config.dataset.prefix);
    info!("│ Output directory: {}", config.dataset.output_dir);
    info!(
        "│ Resample: every {}s ({} policy)",
        config.resample.step_secs, config.resample.policy
    );
    info!(
        "│ Prediction length: {} intervals",
        config.dataset.prediction_length
    );
    info!("│ Log level: {}", config.logging.level);
    info!("╰─────────────────────────────────────────────────");
}
