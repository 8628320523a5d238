//! Corpus screening with the dataset validator.

mod common;

use common::{session_corpus, FixedLengthWindower};
use cropped_decoding::prelude::*;

#[test]
fn a_windowed_corpus_passes_screening() {
    let dataset = ConcatenatedWindowsDataset::from_recordings(
        &session_corpus(),
        &FixedLengthWindower::new(10, 10),
    )
    .unwrap();

    let result = DatasetValidator::default().validate_concat(&dataset);
    assert!(result.is_valid(), "{result}");
    assert!(!result.has_warnings());
}

#[test]
fn recording_shorter_than_the_window_is_flagged_not_fatal() {
    // 5 samples cannot fit a 10-sample window: zero windows emitted.
    let recordings = vec![common::make_recording(0, 2, 5, "train", false)];
    let dataset = ConcatenatedWindowsDataset::from_recordings(
        &recordings,
        &FixedLengthWindower::new(10, 10),
    )
    .unwrap();

    assert_eq!(dataset.len(), 0);
    let result = DatasetValidator::default().validate_concat(&dataset);
    assert!(result.has_warnings());
    assert!(!result.has_errors());
    assert!(result.warnings()[0].contains("zero windows"));
}

#[test]
fn screening_can_be_narrowed_by_configuration() {
    let recordings = vec![common::make_recording(0, 2, 5, "train", false)];
    let dataset = ConcatenatedWindowsDataset::from_recordings(
        &recordings,
        &FixedLengthWindower::new(10, 10),
    )
    .unwrap();

    let config = ValidationConfig {
        warn_empty_recordings: false,
        ..ValidationConfig::default()
    };
    let result = DatasetValidator::new(config).validate_concat(&dataset);
    assert!(result.is_valid(), "{result}");
}
