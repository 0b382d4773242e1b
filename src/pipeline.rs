// Pipeline stages
//
// stage_source -> build_datasets -> upload_datasets. Each stage reads its
// inputs from RuntimeConfig so the CLI can run any of them on its own.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::TimeDelta;
use pickups2deepar_config::{ResamplePolicyKind, RuntimeConfig};
use pickups2deepar_core::{
    resample, split_train_test, write_jsonl, DatasetSplit, EntitySet, EventTable, JsonlSummary,
    ResamplePolicy, ResampleStats,
};
use pickups2deepar_storage::{
    dataset_key, fetch_source, upload_file, FetchOutcome, ObjectStore, ProgressCallback,
    ProgressEvent,
};
use tracing::{debug, info};

/// Local dataset files produced by [`build_datasets`]
#[derive(Debug, Clone)]
pub struct DatasetFiles {
    pub train: JsonlSummary,
    pub test: JsonlSummary,
    pub stats: ResampleStats,
}

impl DatasetFiles {
    pub fn summary(&self, split: DatasetSplit) -> &JsonlSummary {
        match split {
            DatasetSplit::Train => &self.train,
            DatasetSplit::Test => &self.test,
        }
    }
}

/// Everything a full run did
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub fetch: FetchOutcome,
    pub datasets: DatasetFiles,
    /// Remote keys written, train first
    pub uploaded: Vec<String>,
}

/// Stage every object under `source.prefix` into `source.staging_file`.
pub async fn stage_source(config: &RuntimeConfig, store: &ObjectStore) -> Result<FetchOutcome> {
    let dest = PathBuf::from(&config.source.staging_file);

    let mut log_progress = |event: ProgressEvent<'_>| match event {
        ProgressEvent::Started { .. } => {}
        ProgressEvent::Percent { key, percent } => debug!(key, percent, "download progress"),
        ProgressEvent::Finished { key, bytes } => debug!(key, bytes, "download finished"),
    };
    let progress: ProgressCallback<'_> = &mut log_progress;

    fetch_source(
        store,
        &config.source.prefix,
        &dest,
        config.source.chunk_bytes,
        Some(progress),
    )
    .await
    .with_context(|| {
        format!(
            "Failed to stage {} into {}",
            config.source.prefix,
            dest.display()
        )
    })
}

/// Load the staged CSV, resample it and write the train/test JSON-lines files.
pub fn build_datasets(config: &RuntimeConfig) -> Result<DatasetFiles> {
    let staging = Path::new(&config.source.staging_file);
    let table = EventTable::load(staging)
        .with_context(|| format!("Failed to load staged records from {}", staging.display()))?;

    let entities = EntitySet::enumerate(&table).context("Failed to enumerate geohashes")?;

    let step = resample_step(config.resample.step_secs)?;
    let policy = match config.resample.policy {
        ResamplePolicyKind::Exact => ResamplePolicy::ExactMatch,
        ResamplePolicyKind::Bucket => ResamplePolicy::Bucketed,
    };
    let (series, stats) = resample(&table, &entities, step, policy)?;

    let split = split_train_test(series, config.dataset.prediction_length)?;

    let out_dir = Path::new(&config.dataset.output_dir);
    let emit = config.dataset.emit_categories;
    let train = write_jsonl(
        &out_dir.join(&config.dataset.train_file),
        split.series(DatasetSplit::Train),
        emit,
    )?;
    let test = write_jsonl(
        &out_dir.join(&config.dataset.test_file),
        split.series(DatasetSplit::Test),
        emit,
    )?;

    Ok(DatasetFiles { train, test, stats })
}

/// Upload both dataset files under `<dataset.prefix>/<split>/<file>`.
pub async fn upload_datasets(
    config: &RuntimeConfig,
    store: &ObjectStore,
    files: &DatasetFiles,
) -> Result<Vec<String>> {
    let mut keys = Vec::with_capacity(2);
    for (split, file_name) in [
        (DatasetSplit::Train, &config.dataset.train_file),
        (DatasetSplit::Test, &config.dataset.test_file),
    ] {
        let key = dataset_key(&config.dataset.prefix, split, file_name);
        let local = &files.summary(split).path;
        upload_file(store, local, &key)
            .await
            .with_context(|| format!("Failed to upload {} dataset", split))?;
        keys.push(key);
    }
    Ok(keys)
}

/// Full run: stage, build, upload. Stops at the first failing stage.
pub async fn run_pipeline(config: &RuntimeConfig, store: &ObjectStore) -> Result<PipelineReport> {
    let fetch = stage_source(config, store).await?;
    let datasets = build_datasets(config)?;
    let uploaded = upload_datasets(config, store, &datasets).await?;

    info!(
        train = %datasets.train.path.display(),
        test = %datasets.test.path.display(),
        uploaded = uploaded.len(),
        "Pipeline complete"
    );

    Ok(PipelineReport {
        fetch,
        datasets,
        uploaded,
    })
}

fn resample_step(step_secs: u64) -> Result<TimeDelta> {
    i64::try_from(step_secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .filter(|step| *step > TimeDelta::zero())
        .ok_or_else(|| anyhow::anyhow!("resample.step_secs {} is not a usable step", step_secs))
}
