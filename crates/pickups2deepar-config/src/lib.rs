// pickups2deepar-config - Runtime configuration for the dataset pipeline
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority)
// 2. Config file path from PICKUPS2DEEPAR_CONFIG env var
// 3. Config file contents from PICKUPS2DEEPAR_CONFIG_CONTENT env var
// 4. Default config file locations (./config.toml, ./.pickups2deepar.toml)
// 5. Built-in defaults (lowest priority)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{normalize_dataset_prefix, normalize_source_prefix, EnvSource, ENV_PREFIX};
pub use sources::StdEnvSource;

/// Main runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub dataset: DatasetConfig,

    #[serde(default)]
    pub resample: ResampleConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where raw pickup records live remotely and where they are staged locally
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Key prefix listed in the object store (always ends with "/")
    pub prefix: String,
    /// Local file every remote object is appended into
    pub staging_file: String,
    /// Size of each ranged read while downloading
    pub chunk_bytes: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            prefix: "kinesis-output/".to_string(),
            staging_file: "source.csv".to_string(),
            chunk_bytes: 8 * 1024 * 1024,
        }
    }
}

/// Training/test dataset output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Remote key prefix; files land at `<prefix>/train/..` and `<prefix>/test/..`
    pub prefix: String,
    pub train_file: String,
    pub test_file: String,
    /// Local directory the JSON-lines files are written into before upload
    pub output_dir: String,
    /// Trailing intervals held out of the training series (144 = 1 day of 10 minute steps)
    pub prediction_length: usize,
    /// Attach `cat: [entity index]` to every record
    pub emit_categories: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            prefix: "sagemaker/nyctlc".to_string(),
            train_file: "train.json".to_string(),
            test_file: "test.json".to_string(),
            output_dir: ".".to_string(),
            prediction_length: 144,
            emit_categories: false,
        }
    }
}

/// Resampling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResampleConfig {
    pub step_secs: u64,
    pub policy: ResamplePolicyKind,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            step_secs: 600,
            policy: ResamplePolicyKind::Exact,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResamplePolicyKind {
    /// Only events sitting exactly on an interval boundary are kept
    #[default]
    Exact,
    /// Events are summed into the interval containing them
    Bucket,
}

impl std::fmt::Display for ResamplePolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResamplePolicyKind::Exact => write!(f, "exact"),
            ResamplePolicyKind::Bucket => write!(f, "bucket"),
        }
    }
}

impl std::str::FromStr for ResamplePolicyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "exact" | "reindex" => Ok(ResamplePolicyKind::Exact),
            "bucket" | "bucketed" => Ok(ResamplePolicyKind::Bucket),
            _ => anyhow::bail!("Unsupported resample policy: {}. Supported: exact, bucket", s),
        }
    }
}

/// Storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<FsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Config>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Fs,
            fs: Some(FsConfig::default()),
            s3: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Fs,
    S3,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Fs => write!(f, "fs"),
            StorageBackend::S3 => write!(f, "s3"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fs" | "filesystem" => Ok(StorageBackend::Fs),
            "s3" | "aws" => Ok(StorageBackend::S3),
            _ => anyhow::bail!("Unsupported storage backend: {}. Supported: fs, s3", s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsConfig {
    pub path: String,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            path: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Unsupported log format: {}. Supported: text, json", s),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from all sources with priority
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Load configuration from a specific file path (for CLI usage).
    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Load configuration with graceful fallback to defaults.
    /// Does not fail if no config file exists - uses built-in defaults instead.
    /// A config file or inline content that is named but unreadable still fails.
    pub fn load_or_default() -> Result<Self> {
        sources::load_or_default()
    }

    /// Defaults, config file and env overrides, normalized but not validated.
    ///
    /// `path` replaces the PICKUPS2DEEPAR_CONFIG / default file lookup. Call
    /// [`RuntimeConfig::validate`] once any further overrides are applied.
    pub fn load_layers(path: Option<&std::path::Path>) -> Result<Self> {
        sources::load_layers(path, &sources::StdEnvSource)
    }

    /// [`RuntimeConfig::load_layers`] with a custom environment source.
    pub fn load_layers_with<E: EnvSource>(path: Option<&std::path::Path>, env: &E) -> Result<Self> {
        sources::load_layers(path, env)
    }

    /// Parse a TOML document on top of the built-in defaults, without env overrides.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config = RuntimeConfig::default();
        let file_config: RuntimeConfig =
            toml::from_str(content).context("Failed to parse inline config content")?;
        config.merge(file_config);
        config.normalize();
        Ok(config)
    }

    /// Merge another config into this one (used for TOML layering).
    pub fn merge(&mut self, other: RuntimeConfig) {
        self.source = other.source;
        self.dataset = other.dataset;
        self.resample = other.resample;
        self.storage = other.storage;
        self.logging = other.logging;
    }

    /// Apply environment overrides from a custom source.
    pub fn apply_env_overrides_from<E: EnvSource>(&mut self, env: &E) -> Result<()> {
        env_overrides::apply_env_overrides(self, env)
    }

    /// Bring prefixes into their canonical shape.
    pub fn normalize(&mut self) {
        self.source.prefix = normalize_source_prefix(&self.source.prefix);
        self.dataset.prefix = normalize_dataset_prefix(&self.dataset.prefix);
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_from_str() {
        assert_eq!("fs".parse::<StorageBackend>().unwrap(), StorageBackend::Fs);
        assert_eq!("s3".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
        assert_eq!(
            "filesystem".parse::<StorageBackend>().unwrap(),
            StorageBackend::Fs
        );
        assert_eq!("aws".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
        assert!("r2".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_resample_policy_from_str() {
        assert_eq!(
            "exact".parse::<ResamplePolicyKind>().unwrap(),
            ResamplePolicyKind::Exact
        );
        assert_eq!(
            "Bucketed".parse::<ResamplePolicyKind>().unwrap(),
            ResamplePolicyKind::Bucket
        );
        assert!("nearest".parse::<ResamplePolicyKind>().is_err());
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("pretty".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_default_configs() {
        let config = RuntimeConfig::default();
        assert_eq!(config.resample.step_secs, 600);
        assert_eq!(config.dataset.prediction_length, 144);
        assert_eq!(config.dataset.prefix, "sagemaker/nyctlc");
        assert_eq!(config.source.staging_file, "source.csv");
        assert_eq!(config.storage.backend, StorageBackend::Fs);
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_str_layers_over_defaults() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            [source]
            prefix = "kinesis-output/20211213"

            [dataset]
            prefix = "/sagemaker/nyctlc/"
            emit_categories = true

            [resample]
            policy = "bucket"

            [storage]
            backend = "s3"

            [storage.s3]
            bucket = "tlc-artifacts"
            region = "us-east-1"
            "#,
        )
        .unwrap();

        assert_eq!(config.source.prefix, "kinesis-output/20211213/");
        assert_eq!(config.source.staging_file, "source.csv");
        assert_eq!(config.dataset.prefix, "sagemaker/nyctlc");
        assert!(config.dataset.emit_categories);
        assert_eq!(config.dataset.prediction_length, 144);
        assert_eq!(config.resample.step_secs, 600);
        assert_eq!(config.resample.policy, ResamplePolicyKind::Bucket);
        assert_eq!(config.storage.backend, StorageBackend::S3);
        assert_eq!(config.storage.s3.unwrap().bucket, "tlc-artifacts");
    }
}
