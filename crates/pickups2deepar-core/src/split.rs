//! Train/Test Splitter.
//!
//! The test set is every dense series unchanged. The training set is the same
//! list with the last `prediction_length` intervals cut off each series, so the
//! model never sees the horizon it is evaluated on.

use tracing::info;

use crate::error::{CoreError, Result};
use crate::resample::DenseSeries;
use crate::timestamp::format_timestamp;

/// Which half of the dataset a file holds. Also the key segment it uploads under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetSplit {
    Train,
    Test,
}

impl DatasetSplit {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetSplit::Train => "train",
            DatasetSplit::Test => "test",
        }
    }
}

impl std::fmt::Display for DatasetSplit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub train: Vec<DenseSeries>,
    pub test: Vec<DenseSeries>,
    pub prediction_length: usize,
}

impl TrainTestSplit {
    pub fn series(&self, split: DatasetSplit) -> &[DenseSeries] {
        match split {
            DatasetSplit::Train => &self.train,
            DatasetSplit::Test => &self.test,
        }
    }
}

/// Cut the same trailing window from every series.
///
/// A series of `prediction_length` intervals or fewer would leave an empty
/// training series with no `start`, so it fails the whole split.
pub fn split_train_test(series: Vec<DenseSeries>, prediction_length: usize) -> Result<TrainTestSplit> {
    if let Some(short) = series.iter().find(|s| s.len() <= prediction_length) {
        return Err(CoreError::SeriesTooShort {
            geohash: short.geohash.clone(),
            len: short.len(),
            prediction_length,
        });
    }

    let train: Vec<DenseSeries> = series
        .iter()
        .map(|s| s.without_tail(prediction_length))
        .collect();

    info!(
        series = series.len(),
        train_len = train.first().map(DenseSeries::len).unwrap_or(0),
        test_len = series.first().map(DenseSeries::len).unwrap_or(0),
        train_end = ?train.first().and_then(DenseSeries::end).map(format_timestamp),
        prediction_length,
        "Split series into train and test sets"
    );

    Ok(TrainTestSplit {
        train,
        test: series,
        prediction_length,
    })
}
