// pickups2deepar-core - Pure dataset transforms
//
// Turns sparse, geohashed pickup counts into dense, equal-interval series and
// encodes them as JSON lines. No network access happens here; the only file
// I/O is reading the staged CSV and writing the local dataset files.
//
// Stages, in pipeline order:
//   EventTable::load -> EntitySet::enumerate -> resample -> split_train_test -> write_jsonl

pub mod entities;
pub mod error;
pub mod events;
pub mod jsonl;
pub mod resample;
pub mod split;
pub mod timestamp;

pub use entities::{EntitySet, TimeRange};
pub use error::{CoreError, Result};
pub use events::{EventTable, PickupEvent};
pub use jsonl::{write_jsonl, JsonlSummary, SeriesRecord};
pub use resample::{resample, DenseSeries, ResamplePolicy, ResampleStats};
pub use split::{split_train_test, DatasetSplit, TrainTestSplit};
pub use timestamp::{format_timestamp, parse_timestamp, TIMESTAMP_FORMAT};
