//! Shared test fixtures: a deterministic fixed-length windower and
//! synthetic recordings.
#![allow(dead_code)]

use cropped_decoding::prelude::*;
use ndarray::{Array1, Array2, Array3};

/// Fixed-length, fixed-stride windower for tests.
///
/// Emits every window whose `[start, start + window_size)` range fits the
/// recording, labels each window with the recording-level target field
/// (0 when absent), and numbers windows in emission order.
pub struct FixedLengthWindower {
    pub window_size: usize,
    pub stride: usize,
}

impl FixedLengthWindower {
    pub fn new(window_size: usize, stride: usize) -> Self {
        assert!(window_size > 0 && stride > 0);
        Self {
            window_size,
            stride,
        }
    }
}

impl Windower for FixedLengthWindower {
    fn window(&self, recording: &RecordingSource) -> Result<WindowCollection> {
        let n_channels = recording.n_channels();
        let n_samples = recording.n_samples();

        let label = recording
            .target_field()
            .and_then(|field| recording.info().get(field))
            .map(|value| match value {
                MetaValue::Int(i) => *i,
                MetaValue::Bool(b) => i64::from(*b),
                _ => 0,
            })
            .unwrap_or(0);

        let starts: Vec<usize> = (0..)
            .map(|j| j * self.stride)
            .take_while(|s| s + self.window_size <= n_samples)
            .collect();

        let mut data = Array3::zeros((starts.len(), n_channels, self.window_size));
        let mut provenance = Vec::with_capacity(starts.len());
        for (j, &start) in starts.iter().enumerate() {
            let stop = start + self.window_size;
            data.index_axis_mut(ndarray::Axis(0), j)
                .assign(&recording.signal().slice(ndarray::s![.., start..stop]));
            provenance.push(Provenance::new(j as i64, start as i64, stop as i64));
        }
        let targets = Array1::from_vec(vec![label; starts.len()]);

        WindowCollection::new(data, targets, provenance)
    }
}

/// Synthetic recording whose signal encodes `(recording id, sample index)`
/// so any window can be traced back to its source slice.
pub fn make_recording(
    id: i64,
    n_channels: usize,
    n_samples: usize,
    session: &str,
    pathological: bool,
) -> RecordingSource {
    let signal = Array2::from_shape_fn((n_channels, n_samples), |(c, t)| {
        id as f64 * 1000.0 + c as f64 * 100.0 + t as f64
    });
    let info = InfoRow::new()
        .with("subject", id)
        .with("session", session)
        .with("pathological", pathological);
    RecordingSource::new(signal, info, Some("pathological".to_string())).unwrap()
}

/// Three-recording corpus: two "train" sessions, one "eval" session.
pub fn session_corpus() -> Vec<RecordingSource> {
    vec![
        make_recording(0, 2, 50, "train", false),
        make_recording(1, 2, 30, "train", true),
        make_recording(2, 2, 20, "eval", true),
    ]
}
