//! Series Resampler: sparse per-geohash events to dense, zero-filled series.
//!
//! Every entity shares the global range, so all series have the same length
//! and the same first interval. Under [`ResamplePolicy::ExactMatch`] an event
//! only counts when its timestamp sits exactly on a boundary
//! `start + k * step`; anything in between is dropped. This matches a
//! reindex-to-boundaries resample. [`ResamplePolicy::Bucketed`] instead adds
//! each event to the interval that contains it.
//!
//! Rows that land on the same (geohash, interval) are summed under both
//! policies.

use std::collections::HashMap;

use chrono::{NaiveDateTime, TimeDelta};
use tracing::{debug, info};

use crate::entities::{EntitySet, TimeRange};
use crate::error::{CoreError, Result};
use crate::events::{EventTable, PickupEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResamplePolicy {
    /// Keep only events that align exactly with an interval boundary
    #[default]
    ExactMatch,
    /// Sum events into the interval `floor((t - start) / step)`
    Bucketed,
}

/// Fixed-interval pickup counts for one geohash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenseSeries {
    pub geohash: String,
    pub start: NaiveDateTime,
    pub step: TimeDelta,
    pub counts: Vec<u64>,
}

impl DenseSeries {
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Start of interval `index`, or `None` when it falls outside the
    /// representable datetime range.
    pub fn interval_start(&self, index: usize) -> Option<NaiveDateTime> {
        let index = i64::try_from(index).ok()?;
        let offset = self.step.num_seconds().checked_mul(index)?;
        self.start.checked_add_signed(TimeDelta::try_seconds(offset)?)
    }

    /// Start of the last interval.
    pub fn end(&self) -> Option<NaiveDateTime> {
        self.len()
            .checked_sub(1)
            .and_then(|last| self.interval_start(last))
    }

    /// Copy without the last `n` intervals. Saturates at an empty series.
    pub fn without_tail(&self, n: usize) -> DenseSeries {
        let keep = self.counts.len().saturating_sub(n);
        DenseSeries {
            geohash: self.geohash.clone(),
            start: self.start,
            step: self.step,
            counts: self.counts[..keep].to_vec(),
        }
    }
}

/// Per-run resampling totals, for operator visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResampleStats {
    pub series: usize,
    pub intervals_per_series: usize,
    pub events_used: usize,
    pub events_dropped: usize,
}

/// Build one dense series per entity, in enumeration order.
pub fn resample(
    table: &EventTable,
    entities: &EntitySet,
    step: TimeDelta,
    policy: ResamplePolicy,
) -> Result<(Vec<DenseSeries>, ResampleStats)> {
    if table.is_empty() {
        return Err(CoreError::EmptyTable);
    }

    let range = entities.range();
    let len = range.interval_count(step)?;
    let step_secs = step.num_seconds();

    let mut by_geohash: HashMap<&str, Vec<&PickupEvent>> = HashMap::new();
    for event in table {
        by_geohash
            .entry(event.geohash.as_str())
            .or_default()
            .push(event);
    }

    let mut stats = ResampleStats {
        series: entities.len(),
        intervals_per_series: len,
        ..ResampleStats::default()
    };

    let mut series = Vec::with_capacity(entities.len());
    for geohash in entities.geohashes() {
        let events = by_geohash
            .get(geohash.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut counts = vec![0u64; len];
        let mut dropped = 0usize;
        for event in events {
            match slot(&range, step_secs, len, event.timestamp, policy) {
                Some(idx) => counts[idx] = counts[idx].saturating_add(event.pickup_count),
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            debug!(
                geohash = %geohash,
                dropped,
                "Events not aligned to an interval boundary were dropped"
            );
        }
        stats.events_used += events.len() - dropped;
        stats.events_dropped += dropped;

        series.push(DenseSeries {
            geohash: geohash.clone(),
            start: range.start,
            step,
            counts,
        });
    }

    info!(
        series = stats.series,
        intervals = stats.intervals_per_series,
        events_used = stats.events_used,
        events_dropped = stats.events_dropped,
        ?policy,
        "Resampled pickup series"
    );

    Ok((series, stats))
}

/// Interval index for a timestamp, or `None` when the policy drops it.
fn slot(
    range: &TimeRange,
    step_secs: i64,
    len: usize,
    ts: NaiveDateTime,
    policy: ResamplePolicy,
) -> Option<usize> {
    if ts < range.start || ts > range.end {
        return None;
    }
    let offset = (ts - range.start).num_seconds();
    if policy == ResamplePolicy::ExactMatch && offset % step_secs != 0 {
        return None;
    }
    let idx = (offset / step_secs) as usize;
    (idx < len).then_some(idx)
}
