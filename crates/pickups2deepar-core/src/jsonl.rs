//! JSON-lines encoding of dense series.
//!
//! One object per line: `{"start": "YYYY-MM-DD HH:MM:SS", "target": [..], "cat": [..]}`
//! with `cat` present only when categories are requested.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CoreError, Result};
use crate::resample::DenseSeries;
use crate::timestamp::format_timestamp;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRecord {
    pub start: String,
    pub target: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cat: Option<Vec<u32>>,
}

impl SeriesRecord {
    pub fn from_series(series: &DenseSeries, cat: Option<u32>) -> Self {
        Self {
            start: format_timestamp(series.start),
            target: series.counts.clone(),
            cat: cat.map(|c| vec![c]),
        }
    }

    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// What ended up on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonlSummary {
    pub path: PathBuf,
    pub records: usize,
    pub bytes: u64,
}

/// Write one line per series, in order, to `path`.
///
/// Lines go to a sibling `.tmp` file that replaces `path` only once every
/// record is flushed; on failure the temp file is removed and any previous
/// `path` is left untouched. With `categories`, series `i` gets `cat: [i]`.
pub fn write_jsonl(path: &Path, series: &[DenseSeries], categories: bool) -> Result<JsonlSummary> {
    let tmp = temp_path(path);
    info!(path = %path.display(), series = series.len(), "Saving dataset file");

    let result = write_lines(&tmp, series, categories).and_then(|bytes| {
        fs::rename(&tmp, path).map_err(|e| CoreError::io(path, e))?;
        Ok(bytes)
    });

    match result {
        Ok(bytes) => Ok(JsonlSummary {
            path: path.to_path_buf(),
            records: series.len(),
            bytes,
        }),
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

fn write_lines(tmp: &Path, series: &[DenseSeries], categories: bool) -> Result<u64> {
    if let Some(parent) = tmp.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CoreError::io(parent, e))?;
    }

    let file = File::create(tmp).map_err(|e| CoreError::io(tmp, e))?;
    let mut writer = BufWriter::new(file);
    let mut bytes = 0u64;

    for (i, s) in series.iter().enumerate() {
        let cat = categories.then_some(i as u32);
        let line = SeriesRecord::from_series(s, cat).to_json_line()?;
        writer
            .write_all(line.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .map_err(|e| CoreError::io(tmp, e))?;
        bytes += line.len() as u64 + 1;
    }

    writer.flush().map_err(|e| CoreError::io(tmp, e))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| CoreError::io(tmp, e))?;
    Ok(bytes)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::parse_timestamp;
    use chrono::TimeDelta;

    fn series(geohash: &str, counts: Vec<u64>) -> DenseSeries {
        DenseSeries {
            geohash: geohash.to_string(),
            start: parse_timestamp("2021-12-13 00:00:00").unwrap(),
            step: TimeDelta::minutes(10),
            counts,
        }
    }

    #[test]
    fn record_without_cat_omits_field() {
        let line = SeriesRecord::from_series(&series("geoA", vec![3, 5]), None)
            .to_json_line()
            .unwrap();
        assert_eq!(line, r#"{"start":"2021-12-13 00:00:00","target":[3,5]}"#);
    }

    #[test]
    fn record_with_cat_carries_index() {
        let line = SeriesRecord::from_series(&series("geoA", vec![0]), Some(4))
            .to_json_line()
            .unwrap();
        assert_eq!(
            line,
            r#"{"start":"2021-12-13 00:00:00","target":[0],"cat":[4]}"#
        );
    }

    #[test]
    fn parsed_line_recovers_start_and_target() {
        let original = series("geoA", vec![0, 7, 0, 0, 12, 1]);
        let line = SeriesRecord::from_series(&original, None)
            .to_json_line()
            .unwrap();

        let parsed: SeriesRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(parse_timestamp(&parsed.start).unwrap(), original.start);
        assert_eq!(parsed.target, original.counts);
        assert_eq!(parsed.cat, None);
    }

    #[test]
    fn writes_one_line_per_series_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.json");
        let input = vec![series("a", vec![1, 2]), series("b", vec![3, 4])];

        let summary = write_jsonl(&path, &input, true).unwrap();
        assert_eq!(summary.records, 2);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.len() as u64, summary.bytes);
        assert!(content.ends_with('\n'));

        let lines: Vec<SeriesRecord> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[0].target, vec![1, 2]);
        assert_eq!(lines[0].cat, Some(vec![0]));
        assert_eq!(lines[1].target, vec![3, 4]);
        assert_eq!(lines[1].cat, Some(vec![1]));
        assert!(!dir.path().join("train.json.tmp").exists());
    }

    #[test]
    fn failed_write_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        // A directory squatting on the temp name makes File::create fail
        fs::create_dir(dir.path().join("test.json.tmp")).unwrap();
        let path = dir.path().join("test.json");

        let err = write_jsonl(&path, &[series("a", vec![1])], false).unwrap_err();
        assert!(matches!(err, CoreError::Io { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn creates_missing_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("test.json");
        write_jsonl(&path, &[series("a", vec![1])], false).unwrap();
        assert!(path.exists());
    }
}
