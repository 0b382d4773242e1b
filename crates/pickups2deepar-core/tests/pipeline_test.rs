// Integration tests for pickups2deepar-core
//
// Runs a staged CSV file through every transform and checks the dataset files

use chrono::TimeDelta;
use pickups2deepar_core::{
    resample, split_train_test, write_jsonl, CoreError, EntitySet, EventTable, ResamplePolicy,
    SeriesRecord,
};
use std::fmt::Write as _;
use std::fs;

/// One day of 10 minute intervals
const PREDICTION_LENGTH: usize = 144;

/// Two days of 10 minute windows for three zones; zone "dr5rus" only reports
/// on the second day and every 7th window of "dr5ru7" is missing.
fn staged_csv() -> String {
    let mut csv = String::new();
    for i in 0..(2 * 144) {
        let minutes = i * 10;
        let ts = format!(
            "2021-12-{:02} {:02}:{:02}:00",
            13 + minutes / (24 * 60),
            (minutes / 60) % 24,
            minutes % 60
        );
        if i % 7 != 0 {
            writeln!(csv, "{ts},dr5ru7,{},40.7250366211_-73.9874267578", i % 5 + 1).unwrap();
        }
        writeln!(csv, "{ts},dr5ruk,2,40.7470092773_-73.9874267578").unwrap();
        if i >= 144 {
            writeln!(csv, "{ts},dr5rus,1,40.7470092773_-73.9654541016").unwrap();
        }
    }
    csv
}

#[test]
fn test_staged_file_to_dataset_files() {
    let dir = tempfile::tempdir().unwrap();
    let staged = dir.path().join("source.csv");
    fs::write(&staged, staged_csv()).unwrap();

    let table = EventTable::load(&staged).expect("Failed to load staged file");
    let entities = EntitySet::enumerate(&table).expect("Failed to enumerate entities");
    assert_eq!(entities.geohashes(), ["dr5ruk", "dr5ru7", "dr5rus"]);

    let (series, stats) = resample(
        &table,
        &entities,
        TimeDelta::minutes(10),
        ResamplePolicy::ExactMatch,
    )
    .expect("Failed to resample");
    assert_eq!(stats.events_dropped, 0);
    assert_eq!(series.len(), 3);
    for s in &series {
        assert_eq!(s.len(), 288, "series {} has wrong length", s.geohash);
    }

    // Missing windows are zero, late starter is zero for the whole first day
    let ru7 = &series[1];
    assert_eq!(ru7.counts[0], 0);
    assert_eq!(ru7.counts[1], 2);
    let rus = &series[2];
    assert!(rus.counts[..144].iter().all(|&c| c == 0));
    assert!(rus.counts[144..].iter().all(|&c| c == 1));

    let split = split_train_test(series, PREDICTION_LENGTH).expect("Failed to split");
    let train_path = dir.path().join("train.json");
    let test_path = dir.path().join("test.json");
    write_jsonl(&train_path, &split.train, true).unwrap();
    write_jsonl(&test_path, &split.test, true).unwrap();

    let read = |path: &std::path::Path| -> Vec<SeriesRecord> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    };
    let train = read(&train_path);
    let test = read(&test_path);

    assert_eq!(train.len(), 3);
    assert_eq!(test.len(), 3);
    for (i, (tr, te)) in train.iter().zip(&test).enumerate() {
        assert_eq!(tr.start, "2021-12-13 00:00:00");
        assert_eq!(te.start, tr.start);
        assert_eq!(tr.target.len(), 144);
        assert_eq!(te.target.len(), 288);
        assert_eq!(te.target[..144], tr.target[..]);
        // Category labels line up across files
        assert_eq!(tr.cat, Some(vec![i as u32]));
        assert_eq!(te.cat, tr.cat);
    }
}

#[test]
fn test_one_day_of_data_is_too_short_for_a_one_day_horizon() {
    let mut csv = String::new();
    for i in 0..144 {
        writeln!(csv, "2021-12-13 {:02}:{:02}:00,dr5ruk,1,l", i / 6, (i % 6) * 10).unwrap();
    }

    let table = EventTable::from_reader(csv.as_bytes()).unwrap();
    let entities = EntitySet::enumerate(&table).unwrap();
    let (series, _) = resample(
        &table,
        &entities,
        TimeDelta::minutes(10),
        ResamplePolicy::ExactMatch,
    )
    .unwrap();
    assert_eq!(series[0].len(), 144);

    let err = split_train_test(series, PREDICTION_LENGTH).unwrap_err();
    assert!(matches!(err, CoreError::SeriesTooShort { len: 144, .. }));
}
