//! Event Table: the staged pickup records, parsed and sorted.
//!
//! The staged file is headerless CSV with exactly four columns:
//! `timestamp,geohash,pickup_count,location`. The location column is the
//! geohash centre written as `lat_lon` so it never contains a comma.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

use crate::error::{CoreError, Result};
use crate::timestamp::{format_timestamp, parse_timestamp};

const COLUMNS: [&str; 4] = ["timestamp", "geohash", "pickup_count", "location"];

/// Rows shown in the debug preview after loading and after sorting
const PREVIEW_ROWS: usize = 10;

/// One staged record: pickups counted for a geohash at a window end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickupEvent {
    pub timestamp: NaiveDateTime,
    pub geohash: String,
    pub pickup_count: u64,
    pub location: String,
}

impl PickupEvent {
    fn from_record(record: &StringRecord) -> Result<Self> {
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        if record.len() != COLUMNS.len() {
            return Err(CoreError::parse(
                line,
                "record",
                record.iter().collect::<Vec<_>>().join(","),
                format!("expected {} columns, found {}", COLUMNS.len(), record.len()),
            ));
        }

        let raw_ts = &record[0];
        let timestamp =
            parse_timestamp(raw_ts).map_err(|e| CoreError::parse(line, COLUMNS[0], raw_ts, e))?;

        let raw_count = &record[2];
        let pickup_count = raw_count
            .parse::<u64>()
            .map_err(|e| CoreError::parse(line, COLUMNS[2], raw_count, e))?;

        Ok(Self {
            timestamp,
            geohash: record[1].to_string(),
            pickup_count,
            location: record[3].to_string(),
        })
    }
}

/// Staged events ordered by (timestamp, geohash). Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    events: Vec<PickupEvent>,
}

impl EventTable {
    /// Read and sort the staged file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| CoreError::io(path, e))?;
        info!(path = %path.display(), "Loading staged pickup records");
        Self::from_reader(file)
    }

    /// Parse headerless CSV from any reader. Fails on the first bad row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut events = Vec::new();
        let mut record = StringRecord::new();
        while csv.read_record(&mut record)? {
            events.push(PickupEvent::from_record(&record)?);
        }

        info!(rows = events.len(), "Parsed staged records");
        preview("loaded", &events);

        Ok(Self::from_events(events))
    }

    /// Build a table from already-parsed events, applying the canonical sort.
    pub fn from_events(mut events: Vec<PickupEvent>) -> Self {
        // Stable sort keeps file order for identical (timestamp, geohash) pairs
        events.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.geohash.cmp(&b.geohash))
        });
        preview("sorted by timestamp, geohash", &events);
        Self { events }
    }

    pub fn events(&self) -> &[PickupEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PickupEvent> {
        self.events.iter()
    }
}

impl<'a> IntoIterator for &'a EventTable {
    type Item = &'a PickupEvent;
    type IntoIter = std::slice::Iter<'a, PickupEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

fn preview(stage: &str, events: &[PickupEvent]) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    debug!("---- {} ({} rows) ----", stage, events.len());
    for (i, e) in events.iter().take(PREVIEW_ROWS).enumerate() {
        debug!(
            "{:>4}  {}  {:<12} {:>5}  {}",
            i,
            format_timestamp(e.timestamp),
            e.geohash,
            e.pickup_count,
            e.location
        );
    }
}
