//! Object store access for pickups2deepar.
//!
//! Stages raw pickup records from a bucket prefix into a local file and
//! uploads the finished dataset files back, all through one OpenDAL operator.

mod error;
mod fetch;
mod store;
mod upload;

pub use error::{ErrorCode, Result, StorageError};
pub use fetch::{fetch_source, FetchOutcome, ProgressCallback, ProgressEvent};
pub use store::ObjectStore;
pub use upload::{dataset_key, upload_file};
