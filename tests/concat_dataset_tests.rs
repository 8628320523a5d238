//! Concatenation and flat-index translation over windowed recordings.

mod common;

use common::{make_recording, FixedLengthWindower};
use cropped_decoding::prelude::*;

fn two_recording_dataset() -> ConcatenatedWindowsDataset {
    // 50 and 30 samples, window 10 / stride 10: 5 and 3 windows.
    let recordings = vec![
        make_recording(0, 2, 50, "train", false),
        make_recording(1, 2, 30, "train", true),
    ];
    ConcatenatedWindowsDataset::from_recordings(&recordings, &FixedLengthWindower::new(10, 10))
        .unwrap()
}

#[test]
fn windowing_produces_the_expected_counts() {
    let dataset = two_recording_dataset();
    assert_eq!(dataset.n_recordings(), 2);
    assert_eq!(dataset.cumulative_sizes(), &[5, 8]);
    assert_eq!(dataset.len(), 8);
}

#[test]
fn resolution_table_matches_the_window_layout() {
    let dataset = two_recording_dataset();
    assert_eq!(dataset.resolve(0).unwrap(), (0, 0));
    assert_eq!(dataset.resolve(4).unwrap(), (0, 4));
    assert_eq!(dataset.resolve(5).unwrap(), (1, 0));
    assert_eq!(dataset.resolve(7).unwrap(), (1, 2));
    assert!(dataset.resolve(8).is_err());
}

#[test]
fn flat_lookup_returns_the_right_signal_slice() {
    let dataset = two_recording_dataset();

    // Flat index 6 = recording 1, window 1, samples [10, 20).
    let sample = dataset.get(6).unwrap();
    assert_eq!(sample.provenance.i_window_in_trial, 1);
    assert_eq!(sample.provenance.i_start_in_trial, 10);
    assert_eq!(sample.provenance.i_stop_in_trial, 20);
    // Signal encodes (id, channel, sample): recording 1, channel 0, t=10.
    assert_eq!(sample.x[[0, 0]], 1000.0 + 10.0);
    assert_eq!(sample.x[[1, 9]], 1000.0 + 100.0 + 19.0);
    // Label comes from the recording's target field.
    assert_eq!(sample.y, 1);
}

#[test]
fn round_trip_holds_across_many_recordings() {
    let recordings: Vec<RecordingSource> = (0..17)
        .map(|id| make_recording(id, 1, 10 + (id as usize % 5) * 10, "train", false))
        .collect();
    let dataset = ConcatenatedWindowsDataset::from_recordings(
        &recordings,
        &FixedLengthWindower::new(10, 10),
    )
    .unwrap();

    let total: usize = dataset.cumulative_sizes().last().copied().unwrap();
    assert_eq!(dataset.len(), total);
    for g in 0..total {
        let (k, local) = dataset.resolve(g).unwrap();
        assert_eq!(dataset.flat_index(k, local).unwrap(), g);
    }
}

#[test]
fn parallel_construction_preserves_recording_order() {
    let recordings: Vec<RecordingSource> = (0..8)
        .map(|id| make_recording(id, 1, 40, "train", false))
        .collect();
    let dataset = ConcatenatedWindowsDataset::from_recordings(
        &recordings,
        &FixedLengthWindower::new(10, 10),
    )
    .unwrap();

    // Row k of the metadata table belongs to recording k.
    for k in 0..8 {
        assert_eq!(
            dataset.info().row(k).unwrap().get("subject"),
            Some(&MetaValue::Int(k as i64))
        );
    }
    // The first window of each recording carries that recording's signal.
    for k in 0..8 {
        let g = dataset.recording_range(k).unwrap().start;
        let sample = dataset.get(g).unwrap();
        assert_eq!(sample.x[[0, 0]], k as f64 * 1000.0);
    }
}

#[test]
fn overlapping_windows_keep_their_provenance() {
    // Stride smaller than size: overlapping supercrops.
    let recordings = vec![make_recording(0, 1, 30, "train", false)];
    let dataset = ConcatenatedWindowsDataset::from_recordings(
        &recordings,
        &FixedLengthWindower::new(10, 5),
    )
    .unwrap();

    // Starts 0, 5, 10, 15, 20: five windows.
    assert_eq!(dataset.len(), 5);
    let sample = dataset.get(1).unwrap();
    assert_eq!(sample.provenance.i_start_in_trial, 5);
    assert_eq!(sample.provenance.i_stop_in_trial, 15);
}
