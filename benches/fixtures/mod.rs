// Synthetic pickup data generators for benchmarking
//
// Builds EventTables shaped like a week of staged stream output:
// - every zone reports on the 10 minute grid, sparse zones skip most slots
// - a small share of events land off the grid, which exact matching drops

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use pickups2deepar_core::{EventTable, PickupEvent};

/// Workload size presets
#[derive(Debug, Clone, Copy)]
#[allow(dead_code)]
pub enum WorkloadSize {
    Small,  // 50 zones, 1 day
    Medium, // 500 zones, 7 days
    Large,  // 2000 zones, 7 days
}

impl WorkloadSize {
    pub fn zones(&self) -> usize {
        match self {
            WorkloadSize::Small => 50,
            WorkloadSize::Medium => 500,
            WorkloadSize::Large => 2_000,
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            WorkloadSize::Small => 1,
            WorkloadSize::Medium | WorkloadSize::Large => 7,
        }
    }
}

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2021, 12, 13)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
}

/// Generate a synthetic, already sorted event table
pub fn generate_events(size: WorkloadSize) -> EventTable {
    let slots = size.days() * 144;
    let mut events = Vec::new();

    for slot in 0..slots {
        let ts = start() + TimeDelta::minutes(10 * slot);
        for zone in 0..size.zones() {
            // Every third zone only reports once an hour
            if zone % 3 == 2 && slot % 6 != 0 {
                continue;
            }
            // Roughly 1 in 50 events arrives a few minutes late
            let ts = if (slot as usize + zone) % 50 == 0 {
                ts + TimeDelta::minutes(3)
            } else {
                ts
            };
            events.push(PickupEvent {
                timestamp: ts,
                geohash: format!("dr5{:04}", zone),
                pickup_count: (zone as u64 % 7) + 1,
                location: "40.7250366211_-73.9874267578".to_string(),
            });
        }
    }

    EventTable::from_events(events)
}

/// Render a table back to the staged CSV layout
#[allow(dead_code)]
pub fn to_csv(table: &EventTable) -> String {
    let mut out = String::new();
    for e in table {
        out.push_str(&format!(
            "{},{},{},{}\n",
            e.timestamp.format("%Y-%m-%d %H:%M:%S"),
            e.geohash,
            e.pickup_count,
            e.location
        ));
    }
    out
}
