// Configuration validation
//
// Validates that required fields are present and values are sensible

use super::*;
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_source_config(&config.source)?;
    validate_dataset_config(&config.dataset)?;
    validate_resample_config(&config.resample, config.dataset.prediction_length)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

fn validate_file_name(field: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("{} must not be empty", field);
    }
    if name.contains('/') {
        bail!("{} must be a bare file name, got '{}'", field, name);
    }
    Ok(())
}

fn validate_source_config(config: &SourceConfig) -> Result<()> {
    if config.prefix.is_empty() {
        bail!(
            "Source prefix is required\n\n\
            How to fix:\n\
              • Environment: export {}SOURCE_PREFIX=kinesis-output/20211213/\n\
              • TOML: [source]\n              prefix = \"kinesis-output/20211213/\"\n",
            ENV_PREFIX
        );
    }

    if config.staging_file.is_empty() {
        bail!("source.staging_file must not be empty");
    }

    if config.chunk_bytes == 0 {
        bail!("source.chunk_bytes must be greater than 0");
    }

    Ok(())
}

fn validate_dataset_config(config: &DatasetConfig) -> Result<()> {
    validate_file_name("dataset.train_file", &config.train_file)?;
    validate_file_name("dataset.test_file", &config.test_file)?;

    if config.train_file == config.test_file {
        bail!(
            "dataset.train_file and dataset.test_file must differ (both '{}')",
            config.train_file
        );
    }

    if config.output_dir.is_empty() {
        bail!("dataset.output_dir must not be empty");
    }

    if config.prediction_length == 0 {
        bail!("dataset.prediction_length must be greater than 0");
    }

    Ok(())
}

fn validate_resample_config(config: &ResampleConfig, prediction_length: usize) -> Result<()> {
    if config.step_secs == 0 {
        bail!(
            "resample.step_secs must be greater than 0\n\n\
            How to fix:\n\
              • Environment: export {}RESAMPLE_STEP_SECS=600\n\
              • TOML: [resample]\n              step_secs = 600\n",
            ENV_PREFIX
        );
    }

    if config.step_secs % 60 != 0 {
        warn!(
            step_secs = config.step_secs,
            "resample.step_secs is not a whole number of minutes; source timestamps are usually minute-aligned"
        );
    }

    // Horizons longer than a week rarely fit in a single staged day of data
    let horizon_secs = config.step_secs.saturating_mul(prediction_length as u64);
    if horizon_secs > 7 * 24 * 60 * 60 {
        warn!(
            horizon_secs,
            prediction_length, "prediction horizon is longer than a week"
        );
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<()> {
    match config.backend {
        StorageBackend::Fs => {
            let fs = config
                .fs
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("fs storage backend requires 'fs' configuration"))?;

            if fs.path.is_empty() {
                bail!(
                    "Filesystem path is required\n\n\
                    How to fix:\n\
                      • Environment: export {}STORAGE_PATH=/data/pickups\n\
                      • TOML: [storage.fs]\n              path = \"/data/pickups\"\n",
                    ENV_PREFIX
                );
            }
        }
        StorageBackend::S3 => {
            let s3 = config
                .s3
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("s3 storage backend requires 's3' configuration"))?;

            if s3.bucket.is_empty() {
                bail!(
                    "S3 bucket name is required\n\n\
                    How to fix:\n\
                      • Environment: export {}S3_BUCKET=my-bucket\n\
                      • TOML: [storage.s3]\n              bucket = \"my-bucket\"\n",
                    ENV_PREFIX
                );
            }

            if s3.region.is_empty() {
                bail!(
                    "S3 region is required\n\n\
                    How to fix:\n\
                      • Environment: export {}S3_REGION=us-west-2\n\
                      • TOML: [storage.s3]\n              region = \"us-west-2\"\n",
                    ENV_PREFIX
                );
            }
        }
    }

    Ok(())
}
