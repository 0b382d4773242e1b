// pickups2deepar - DeepAR datasets from streamed taxi pickup counts
//
// A run stages raw geohashed pickup counts from an object store prefix into
// one local CSV, resamples every pickup zone onto a shared 10 minute grid,
// writes train/test JSON-lines files and uploads them back.
//
// The heavy lifting lives in the workspace crates:
// - pickups2deepar-config: layered RuntimeConfig
// - pickups2deepar-core: CSV loading, resampling, splitting, JSON lines
// - pickups2deepar-storage: OpenDAL fetch and upload

use anyhow::{Context, Result};
use pickups2deepar_config::RuntimeConfig;

mod init;
mod pipeline;

pub use init::{init_store, init_tracing};
pub use pipeline::{
    build_datasets, run_pipeline, stage_source, upload_datasets, DatasetFiles, PipelineReport,
};

/// Entry point with configuration loaded from the environment and default files
pub async fn run() -> Result<PipelineReport> {
    let config = RuntimeConfig::load().context("Failed to load configuration")?;
    run_with_config(config).await
}

/// Entry point with pre-loaded configuration (for CLI usage)
pub async fn run_with_config(config: RuntimeConfig) -> Result<PipelineReport> {
    init_tracing(&config.logging);
    let store = init_store(&config)?;
    run_pipeline(&config, &store).await
}
