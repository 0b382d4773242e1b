// Configuration source loading.
//
// Priority order:
// 1. Environment variables (PICKUPS2DEEPAR_* prefix)
// 2. Config file path from PICKUPS2DEEPAR_CONFIG
// 3. Inline config content from PICKUPS2DEEPAR_CONFIG_CONTENT
// 4. Default config files (./config.toml, ./.pickups2deepar.toml)
// 5. Built-in defaults

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::RuntimeConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

/// Load configuration using native environment/file access.
pub fn load_config() -> Result<RuntimeConfig> {
    finish(load_layers(None, &StdEnvSource)?)
}

/// Load configuration from a specific file path (for CLI --config flag).
/// Returns error if file doesn't exist or can't be parsed.
pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<RuntimeConfig> {
    finish(load_layers(Some(path.as_ref()), &StdEnvSource)?)
}

/// Load configuration with graceful fallback to defaults.
/// Only an absent config file falls back; a file named by
/// PICKUPS2DEEPAR_CONFIG or inline PICKUPS2DEEPAR_CONFIG_CONTENT that fails
/// to load is an error.
pub fn load_or_default() -> Result<RuntimeConfig> {
    load_config()
}

/// Defaults, then the config file, then env overrides, normalized but not
/// validated. Callers layering further overrides validate afterwards.
pub fn load_layers<E: EnvSource>(path: Option<&Path>, env: &E) -> Result<RuntimeConfig> {
    let mut config = RuntimeConfig::default();

    let file_config = match path {
        Some(path) => Some(read_toml(path)?),
        None => load_from_file(env)?,
    };
    if let Some(file_config) = file_config {
        config.merge(file_config);
    }

    env_overrides::apply_env_overrides(&mut config, env)?;
    config.normalize();
    Ok(config)
}

fn load_from_file<E: EnvSource>(env: &E) -> Result<Option<RuntimeConfig>> {
    if let Some(path) = env.get("CONFIG") {
        return read_toml(Path::new(&path)).map(Some);
    }

    if let Some(content) = env.get("CONFIG_CONTENT") {
        let config: RuntimeConfig = toml::from_str(&content)
            .context("Failed to parse inline config from PICKUPS2DEEPAR_CONFIG_CONTENT")?;
        return Ok(Some(config));
    }

    for path in &["./config.toml", "./.pickups2deepar.toml"] {
        let path = Path::new(path);
        if path.exists() {
            return read_toml(path).map(Some);
        }
    }

    Ok(None)
}

fn read_toml(path: &Path) -> Result<RuntimeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn finish(config: RuntimeConfig) -> Result<RuntimeConfig> {
    config.validate()?;
    Ok(config)
}

/// Reads `PICKUPS2DEEPAR_*` (and raw AWS) variables from the process environment.
pub struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env_overrides::tests::MapEnv;
    use crate::{ResamplePolicyKind, StorageBackend};
    use std::io::Write;

    #[test]
    fn load_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [dataset]
            prefix = "sagemaker/nyctlc/"
            train_file = "train-2021.json"

            [resample]
            policy = "exact"
            step_secs = 600

            [storage]
            backend = "fs"

            [storage.fs]
            path = "/tmp/pickups"
            "#
        )
        .unwrap();

        let config = load_from_file_path(file.path()).unwrap();
        assert_eq!(config.dataset.prefix, "sagemaker/nyctlc");
        assert_eq!(config.dataset.train_file, "train-2021.json");
        assert_eq!(config.dataset.test_file, "test.json");
        assert_eq!(config.resample.policy, ResamplePolicyKind::Exact);
        assert_eq!(config.storage.backend, StorageBackend::Fs);
        assert_eq!(config.storage.fs.unwrap().path, "/tmp/pickups");
    }

    #[test]
    fn env_named_config_with_bad_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[storage]\nbackend = \"s3\"\nbucket = tlc-artifacts").unwrap();
        let path = file.path().display().to_string();
        let env = MapEnv::new(&[("CONFIG", path.as_str())], &[]);

        let err = load_layers(None, &env).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn env_named_config_that_is_missing_is_an_error() {
        let env = MapEnv::new(&[("CONFIG", "/definitely/not/here.toml")], &[]);

        let err = load_layers(None, &env).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn bad_inline_content_is_an_error() {
        let env = MapEnv::new(&[("CONFIG_CONTENT", "[storage\nbackend = \"s3\"")], &[]);

        let err = load_layers(None, &env).unwrap_err();
        assert!(err.to_string().contains("PICKUPS2DEEPAR_CONFIG_CONTENT"));
    }

    #[test]
    fn inline_content_then_env_overrides() {
        let env = MapEnv::new(
            &[
                (
                    "CONFIG_CONTENT",
                    "[source]\nprefix = \"from-file\"\n[resample]\npolicy = \"bucket\"",
                ),
                ("SOURCE_PREFIX", "from-env"),
            ],
            &[],
        );

        let config = load_layers(None, &env).unwrap();
        assert_eq!(config.source.prefix, "from-env/");
        assert_eq!(config.resample.policy, ResamplePolicyKind::Bucket);
    }

    #[test]
    fn layers_are_not_validated() {
        let env = MapEnv::new(&[("SOURCE_PREFIX", "")], &[]);

        let config = load_layers(None, &env).unwrap();
        assert_eq!(config.source.prefix, "");
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = load_from_file_path("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
