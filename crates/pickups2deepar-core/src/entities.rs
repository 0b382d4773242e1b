//! Entity enumeration and the global time range.

use std::collections::HashSet;

use chrono::{NaiveDateTime, TimeDelta};
use tracing::info;

use crate::error::{CoreError, Result};
use crate::events::EventTable;
use crate::timestamp::format_timestamp;

/// Inclusive `[start, end]` span covered by the whole table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    /// Number of boundaries `start, start + step, ...` that are `<= end`.
    pub fn interval_count(&self, step: TimeDelta) -> Result<usize> {
        let step_secs = step.num_seconds();
        if step_secs <= 0 {
            return Err(CoreError::InvalidStep { step_secs });
        }
        let span = (self.end - self.start).num_seconds();
        Ok((span / step_secs) as usize + 1)
    }
}

/// Distinct geohashes in first-seen order, plus the global range.
///
/// Output files follow this order, so an entity's position here is also its
/// category index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySet {
    geohashes: Vec<String>,
    range: TimeRange,
}

impl EntitySet {
    pub fn enumerate(table: &EventTable) -> Result<Self> {
        let first = table.events().first().ok_or(CoreError::EmptyTable)?;

        let mut seen = HashSet::new();
        let mut geohashes = Vec::new();
        let mut range = TimeRange {
            start: first.timestamp,
            end: first.timestamp,
        };

        for event in table {
            if seen.insert(event.geohash.as_str()) {
                geohashes.push(event.geohash.clone());
            }
            range.start = range.start.min(event.timestamp);
            range.end = range.end.max(event.timestamp);
        }

        info!(
            unique_geohash = geohashes.len(),
            min = %format_timestamp(range.start),
            max = %format_timestamp(range.end),
            "Enumerated pickup zones"
        );

        Ok(Self { geohashes, range })
    }

    pub fn geohashes(&self) -> &[String] {
        &self.geohashes
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn len(&self) -> usize {
        self.geohashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geohashes.is_empty()
    }
}
