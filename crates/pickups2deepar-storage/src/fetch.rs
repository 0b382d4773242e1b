//! Source Fetcher: stage every object under a prefix into one local file.
//!
//! Objects are appended in key order to `<staging>.part`, which is renamed to
//! the staging path only after the last byte is written. A staging file that
//! already exists is trusted as-is and nothing is downloaded.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, StorageError};
use crate::store::ObjectStore;

/// Progress notifications emitted while downloading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent<'a> {
    Started { key: &'a str, size: u64 },
    /// Whole percentage of the current object, strictly increasing per object
    Percent { key: &'a str, percent: u8 },
    Finished { key: &'a str, bytes: u64 },
}

/// Observer invoked with each progress event; pass `None` to stay quiet.
pub type ProgressCallback<'cb> = &'cb mut dyn FnMut(ProgressEvent<'_>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Staging file was already present
    Skipped,
    Downloaded { objects: usize, bytes: u64 },
}

/// Tracks consumed bytes against a total and reports only when the whole
/// percentage increases.
#[derive(Debug)]
struct PercentTracker {
    total: u64,
    consumed: u64,
    percent: u8,
}

impl PercentTracker {
    fn new(total: u64) -> Self {
        Self {
            total,
            consumed: 0,
            percent: 0,
        }
    }

    fn advance(&mut self, bytes: u64) -> Option<u8> {
        if self.total == 0 {
            return None;
        }
        self.consumed = self.consumed.saturating_add(bytes);
        let percent = (self.consumed.min(self.total) * 100 / self.total) as u8;
        (percent > self.percent).then(|| {
            self.percent = percent;
            percent
        })
    }
}

/// Download every object under `prefix` into `dest` unless `dest` exists.
pub async fn fetch_source(
    store: &ObjectStore,
    prefix: &str,
    dest: &Path,
    chunk_bytes: usize,
    mut progress: Option<ProgressCallback<'_>>,
) -> Result<FetchOutcome> {
    if dest.exists() {
        info!("{} exists, download skipped", dest.display());
        return Ok(FetchOutcome::Skipped);
    }

    let keys = store.list_files(prefix).await?;
    if keys.is_empty() {
        return Err(StorageError::fetch_failure(
            prefix,
            "no objects found under prefix",
        ));
    }
    info!(prefix, objects = keys.len(), "Staging source objects");

    let part = part_path(dest);
    let result = download_all(store, &keys, &part, chunk_bytes.max(1) as u64, &mut progress)
        .await
        .and_then(|bytes| {
            fs::rename(&part, dest).map_err(|e| StorageError::local_io(dest, e))?;
            Ok(bytes)
        });

    match result {
        Ok(bytes) => {
            info!(path = %dest.display(), objects = keys.len(), bytes, "Source staged");
            Ok(FetchOutcome::Downloaded {
                objects: keys.len(),
                bytes,
            })
        }
        Err(e) => {
            let _ = fs::remove_file(&part);
            Err(e)
        }
    }
}

async fn download_all(
    store: &ObjectStore,
    keys: &[String],
    part: &Path,
    chunk: u64,
    progress: &mut Option<ProgressCallback<'_>>,
) -> Result<u64> {
    if let Some(parent) = part.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StorageError::local_io(parent, e))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(part)
        .map_err(|e| StorageError::local_io(part, e))?;
    let mut writer = BufWriter::new(file);
    let mut total = 0u64;

    for key in keys {
        total += download_one(store, key, &mut writer, part, chunk, progress).await?;
    }

    writer
        .flush()
        .and_then(|_| writer.get_ref().sync_all())
        .map_err(|e| StorageError::local_io(part, e))?;
    Ok(total)
}

async fn download_one(
    store: &ObjectStore,
    key: &str,
    writer: &mut BufWriter<File>,
    part: &Path,
    chunk: u64,
    progress: &mut Option<ProgressCallback<'_>>,
) -> Result<u64> {
    let size = store.size(key).await?;
    info!("downloading {} ... ({} bytes)", key, size);
    emit(progress, ProgressEvent::Started { key, size });

    let mut tracker = PercentTracker::new(size);
    let mut offset = 0u64;
    while offset < size {
        let end = offset.saturating_add(chunk).min(size);
        let bytes = store.read_range(key, offset, end).await?;
        if bytes.is_empty() {
            return Err(StorageError::fetch_failure(
                key,
                format!("object ended at byte {} of {}", offset, size),
            ));
        }
        writer
            .write_all(&bytes)
            .map_err(|e| StorageError::local_io(part, e))?;
        offset += bytes.len() as u64;

        if let Some(percent) = tracker.advance(bytes.len() as u64) {
            emit(progress, ProgressEvent::Percent { key, percent });
        }
    }

    emit(progress, ProgressEvent::Finished { key, bytes: offset });
    Ok(offset)
}

fn emit(progress: &mut Option<ProgressCallback<'_>>, event: ProgressEvent<'_>) {
    if let Some(cb) = progress.as_mut() {
        cb(event);
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}
