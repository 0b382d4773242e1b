use super::{FsConfig, LogFormat, ResamplePolicyKind, RuntimeConfig, S3Config, StorageBackend};
use anyhow::{anyhow, Context, Result};

pub const ENV_PREFIX: &str = "PICKUPS2DEEPAR_";

/// Abstraction over environment-variable lookups so tests can supply their
/// own source of overrides.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Get an environment variable WITHOUT the PICKUPS2DEEPAR_ prefix
    /// Used for AWS standard variables (AWS_REGION)
    fn get_raw(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority) to the runtime config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Source staging
    if let Some(prefix) = get_env_string(env, "SOURCE_PREFIX")? {
        config.source.prefix = normalize_source_prefix(&prefix);
    }
    if let Some(file) = get_env_string(env, "STAGING_FILE")? {
        config.source.staging_file = file;
    }
    if let Some(val) = get_env_usize(env, "SOURCE_CHUNK_BYTES")? {
        config.source.chunk_bytes = val;
    }

    // Dataset output
    if let Some(prefix) = get_env_string(env, "DATASET_PREFIX")? {
        config.dataset.prefix = normalize_dataset_prefix(&prefix);
    }
    if let Some(file) = get_env_string(env, "TRAIN_FILE")? {
        config.dataset.train_file = file;
    }
    if let Some(file) = get_env_string(env, "TEST_FILE")? {
        config.dataset.test_file = file;
    }
    if let Some(dir) = get_env_string(env, "OUTPUT_DIR")? {
        config.dataset.output_dir = dir;
    }
    if let Some(val) = get_env_usize(env, "PREDICTION_LENGTH")? {
        config.dataset.prediction_length = val;
    }
    if let Some(val) = get_env_bool(env, "EMIT_CATEGORIES")? {
        config.dataset.emit_categories = val;
    }

    // Resampling
    if let Some(val) = get_env_u64(env, "RESAMPLE_STEP_SECS")? {
        config.resample.step_secs = val;
    }
    if let Some(policy) = get_env_string(env, "RESAMPLE_POLICY")? {
        config.resample.policy = policy
            .parse::<ResamplePolicyKind>()
            .context("Invalid PICKUPS2DEEPAR_RESAMPLE_POLICY value")?;
    }

    // Storage backend
    if let Some(backend) = get_env_string(env, "STORAGE_BACKEND")? {
        config.storage.backend = backend
            .parse::<StorageBackend>()
            .context("Invalid PICKUPS2DEEPAR_STORAGE_BACKEND value")?;
    }
    // Filesystem storage
    if let Some(path) = get_env_string(env, "STORAGE_PATH")? {
        config.storage.fs.get_or_insert_with(FsConfig::default).path = path;
    }

    // S3 storage
    if let Some(bucket) = get_env_string(env, "S3_BUCKET")? {
        ensure_s3(config).bucket = bucket;
    }
    if let Some(region) = get_env_string(env, "S3_REGION")? {
        ensure_s3(config).region = region;
    } else if let Some(region) = get_raw_env_string(env, "AWS_REGION")? {
        // Only fill the region in when S3 is actually in play
        if config.storage.backend == StorageBackend::S3 || config.storage.s3.is_some() {
            let s3 = ensure_s3(config);
            if s3.region.is_empty() {
                s3.region = region;
            }
        }
    }
    if let Some(endpoint) = get_env_string(env, "S3_ENDPOINT")? {
        ensure_s3(config).endpoint = Some(endpoint);
    }

    // Logging
    if let Some(level) = get_env_string(env, "LOG_LEVEL")? {
        config.logging.level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT")? {
        config.logging.format = format
            .parse::<LogFormat>()
            .context("Invalid PICKUPS2DEEPAR_LOG_FORMAT value")?;
    }

    Ok(())
}

fn ensure_s3(config: &mut RuntimeConfig) -> &mut S3Config {
    config.storage.s3.get_or_insert_with(|| S3Config {
        bucket: String::new(),
        region: String::new(),
        endpoint: None,
    })
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Result<Option<String>> {
    Ok(env.get(key))
}

/// Get a raw environment variable without the PICKUPS2DEEPAR_ prefix
fn get_raw_env_string<E: EnvSource>(env: &E, key: &str) -> Result<Option<String>> {
    Ok(env.get_raw(key))
}

fn get_env_usize<E: EnvSource>(env: &E, key: &str) -> Result<Option<usize>> {
    match get_env_string(env, key)? {
        Some(val) => {
            let parsed = val
                .parse::<usize>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn get_env_u64<E: EnvSource>(env: &E, key: &str) -> Result<Option<u64>> {
    match get_env_string(env, key)? {
        Some(val) => {
            let parsed = val
                .parse::<u64>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn get_env_bool<E: EnvSource>(env: &E, key: &str) -> Result<Option<bool>> {
    match get_env_string(env, key)? {
        Some(val) => {
            let parsed = val.parse::<bool>().map_err(|e| {
                anyhow!(
                    "Failed to parse {}{} (expected bool): {}",
                    ENV_PREFIX,
                    key,
                    e
                )
            })?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Source prefixes are listed as directories, so they always end with "/".
pub fn normalize_source_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_start_matches('/');
    if trimmed.is_empty() || trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    }
}

/// Dataset prefixes are joined with "/" into object keys, so they carry no
/// leading or trailing separator.
pub fn normalize_dataset_prefix(prefix: &str) -> String {
    prefix.trim_matches('/').to_string()
}
