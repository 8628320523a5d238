//! The provenance-preserving loader and the stash/consume handshake.

mod common;

use common::{make_recording, FixedLengthWindower};
use cropped_decoding::prelude::*;
use ndarray::{Array1, Array3};

fn windowed(recordings: &[RecordingSource]) -> ConcatenatedWindowsDataset {
    ConcatenatedWindowsDataset::from_recordings(recordings, &FixedLengthWindower::new(10, 10))
        .unwrap()
}

#[test]
fn discard_mode_never_emits_a_third_element() {
    let dataset = windowed(&[make_recording(0, 2, 60, "train", false)]);
    let harness = ScoringHarness::new();
    let raw = BatchLoader::new(&dataset, 4).unwrap();
    let loader = harness.loader(raw.iter(), ProvenanceMode::Discard);

    for batch in loader {
        let batch = batch.unwrap();
        assert!(matches!(batch, Batch::Pair { .. }));
        assert!(batch.provenance().is_none());
    }
}

#[test]
fn retain_mode_always_emits_matching_triples() {
    let dataset = windowed(&[make_recording(0, 2, 60, "train", false)]);
    let harness = ScoringHarness::new();
    let raw = BatchLoader::new(&dataset, 4).unwrap();
    let loader = harness.loader(raw.iter(), ProvenanceMode::Retain);

    let mut seen = 0usize;
    for batch in loader {
        let batch = batch.unwrap();
        let provenance = batch.provenance().expect("triple");
        assert_eq!(provenance.len(), batch.len());
        // Stops advance by the stride within each recording.
        for (i, &stop) in provenance.i_stop_in_trial.iter().enumerate() {
            let start = provenance.i_start_in_trial[i];
            assert_eq!(stop - start, 10);
        }
        seen += batch.len();
    }
    assert_eq!(seen, dataset.len());
}

#[test]
fn stash_then_consume_keeps_batch_correspondence() {
    // 12 windows in 3 batches of 4: each evaluation batch stashes once and
    // the post-batch hook consumes once.
    let dataset = windowed(&[make_recording(0, 2, 120, "train", false)]);
    let mut harness = ScoringHarness::new();
    let idx = harness.register(Box::new(CroppedTrialScorer::new("cropped")));

    let raw = BatchLoader::new(&dataset, 4).unwrap();
    let mut loader = harness.loader(raw.iter(), ProvenanceMode::Discard);
    // One stash, one consume per batch, interleaved the way a trainer
    // drives it. Collecting batches first would overwrite the single slot.
    while let Some(batch) = loader.next() {
        batch.unwrap();
        harness.on_batch_end(false).unwrap();
    }

    let log = harness.scorer(idx).unwrap().provenance_log();
    assert_eq!(log.len(), 3);
    let windows: Vec<i64> = log
        .iter()
        .flat_map(|p| p.i_window_in_trial.to_vec())
        .collect();
    assert_eq!(windows, (0..12).collect::<Vec<_>>());
}

#[test]
fn mixed_pair_and_triple_batch_stream_matches_the_protocol() {
    // Batch stream [(x0, y0, p0), (x1, y1)]: the pair batch has nothing to
    // stash, so a second consume must fail loudly.
    let x0 = Array3::zeros((2, 1, 4));
    let y0 = Array1::zeros(2);
    let p0 = ProvenanceBatch {
        i_window_in_trial: Array1::from_vec(vec![0, 1]),
        i_start_in_trial: Array1::from_vec(vec![0, 4]),
        i_stop_in_trial: Array1::from_vec(vec![4, 8]),
    };
    let x1 = Array3::zeros((2, 1, 4));
    let y1 = Array1::zeros(2);
    let stream = vec![
        Ok(RawBatch::triple(x0, y0, p0.clone())),
        Ok(RawBatch::pair(x1, y1)),
    ];

    let mut harness = ScoringHarness::new();
    let idx = harness.register(Box::new(CroppedTrialScorer::new("cropped")));
    let mut loader = harness.loader(stream.into_iter(), ProvenanceMode::Discard);

    // Batch 0: emitted as a pair, provenance stashed and consumed.
    let b0 = loader.next().unwrap().unwrap();
    assert!(matches!(b0, Batch::Pair { .. }));
    harness.on_batch_end(false).unwrap();
    let log = harness.scorer(idx).unwrap().provenance_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0], p0);

    // Batch 1: emitted as a pair, nothing stashed.
    let b1 = loader.next().unwrap().unwrap();
    assert!(matches!(b1, Batch::Pair { .. }));
    assert!(matches!(
        harness.on_batch_end(false).unwrap_err(),
        DecodingError::EmptyMailbox
    ));
}

#[test]
fn training_batches_do_not_consume_the_stash() {
    let dataset = windowed(&[make_recording(0, 2, 40, "train", false)]);
    let mut harness = ScoringHarness::new();
    let idx = harness.register(Box::new(CroppedTrialScorer::new("cropped")));

    let raw = BatchLoader::new(&dataset, 4).unwrap();
    let mut loader = harness.loader(raw.iter(), ProvenanceMode::Discard);
    loader.next().unwrap().unwrap();
    // A training batch leaves the mailbox armed and the log empty.
    harness.on_batch_end(true).unwrap();
    assert!(harness.scorer(idx).unwrap().provenance_log().is_empty());
    assert!(harness.mailbox().borrow().is_armed());
}

#[test]
fn shuffled_training_order_keeps_window_target_pairs_intact() {
    // Labels differ per recording; shuffling must permute (x, y) rows
    // together.
    let dataset = windowed(&[
        make_recording(0, 1, 40, "train", false),
        make_recording(1, 1, 40, "train", true),
    ]);
    let raw = BatchLoader::new(&dataset, 8)
        .unwrap()
        .with_order(IterationOrder::Shuffled { seed: Some(9) });

    let batch = raw.iter().next().unwrap().unwrap();
    for i in 0..batch.len() {
        let recording_id = (batch.inputs[[i, 0, 0]] / 1000.0).floor() as i64;
        assert_eq!(batch.targets[i], recording_id);
    }
}
