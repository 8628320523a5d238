//! Window collections and provenance.
//!
//! A windower slices one continuous recording into fixed-length windows
//! ("supercrops"). This crate does not implement the slicing itself; the
//! [`Windower`] trait is the contract an external windowing algorithm
//! fulfills. What this crate owns is the storage and the positional
//! bookkeeping: every window carries a [`Provenance`] triple locating it
//! inside its recording, and that triple travels untouched through
//! concatenation, splitting, batching and inference.
//!
//! # Invariants
//!
//! For every window in a [`WindowCollection`]:
//! - `i_start_in_trial < i_stop_in_trial`
//! - `i_window_in_trial` is zero-based and increases monotonically in the
//!   order the windower emitted the windows
//!
//! Both are checked at construction; a collection that violates them never
//! enters the pipeline.

use ndarray::{Array1, Array2, Array3, Axis};

use crate::dataset::RecordingSource;
use crate::error::{DecodingError, Result};

// ============================================================================
// Provenance
// ============================================================================

/// Positional identity of one window within its recording.
///
/// Read and relayed, never mutated: the loader and the scoring hook pass
/// copies of this value around, and the predictor reports it back alongside
/// each prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provenance {
    /// Zero-based position of the window in its recording's emission order.
    pub i_window_in_trial: i64,
    /// First sample of the window within the recording.
    pub i_start_in_trial: i64,
    /// One past the last sample of the window within the recording.
    pub i_stop_in_trial: i64,
}

impl Provenance {
    pub fn new(i_window_in_trial: i64, i_start_in_trial: i64, i_stop_in_trial: i64) -> Self {
        Self {
            i_window_in_trial,
            i_start_in_trial,
            i_stop_in_trial,
        }
    }

    /// Window length in samples.
    pub fn n_samples(&self) -> i64 {
        self.i_stop_in_trial - self.i_start_in_trial
    }
}

// ============================================================================
// WindowSample
// ============================================================================

/// One window as handed to the batching layer: signal slice, label and
/// provenance.
#[derive(Debug, Clone)]
pub struct WindowSample {
    /// Signal slice, `[n_channels, n_samples]`.
    pub x: Array2<f64>,
    /// Class label for this window.
    pub y: i64,
    /// Position of this window within its recording.
    pub provenance: Provenance,
}

// ============================================================================
// WindowCollection
// ============================================================================

/// Ordered sequence of windows for one recording.
///
/// Produced by a [`Windower`], consumed by
/// [`WindowsDataset`](crate::dataset::WindowsDataset). Signal windows are
/// stored as one contiguous `[n_windows, n_channels, n_samples]` block.
#[derive(Debug, Clone)]
pub struct WindowCollection {
    data: Array3<f64>,
    targets: Array1<i64>,
    provenance: Vec<Provenance>,
}

impl WindowCollection {
    /// Build a collection, validating shape agreement and the provenance
    /// invariants.
    pub fn new(
        data: Array3<f64>,
        targets: Array1<i64>,
        provenance: Vec<Provenance>,
    ) -> Result<Self> {
        let n = data.len_of(Axis(0));
        if targets.len() != n || provenance.len() != n {
            return Err(DecodingError::InvalidConfig(format!(
                "window collection length mismatch: {} windows, {} targets, {} provenance rows",
                n,
                targets.len(),
                provenance.len()
            )));
        }
        for (j, p) in provenance.iter().enumerate() {
            if p.i_start_in_trial >= p.i_stop_in_trial {
                return Err(DecodingError::InvalidConfig(format!(
                    "window {j}: i_start_in_trial {} not before i_stop_in_trial {}",
                    p.i_start_in_trial, p.i_stop_in_trial
                )));
            }
            if p.i_window_in_trial != j as i64 {
                return Err(DecodingError::InvalidConfig(format!(
                    "window {j}: i_window_in_trial is {}, expected {j}",
                    p.i_window_in_trial
                )));
            }
        }
        Ok(Self {
            data,
            targets,
            provenance,
        })
    }

    /// Number of windows.
    pub fn len(&self) -> usize {
        self.provenance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.provenance.is_empty()
    }

    /// Channel count of each window.
    pub fn n_channels(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    /// Sample count of each window.
    pub fn n_samples(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// Window at flat local index `j`.
    pub fn window(&self, j: usize) -> Result<WindowSample> {
        if j >= self.len() {
            return Err(DecodingError::window_index(j, self.len()));
        }
        Ok(WindowSample {
            x: self.data.index_axis(Axis(0), j).to_owned(),
            y: self.targets[j],
            provenance: self.provenance[j],
        })
    }

    /// Provenance rows in emission order.
    pub fn provenance(&self) -> &[Provenance] {
        &self.provenance
    }

    /// Targets in emission order.
    pub fn targets(&self) -> &Array1<i64> {
        &self.targets
    }
}

// ============================================================================
// Windower contract
// ============================================================================

/// External windowing algorithm: slices one recording into an ordered
/// [`WindowCollection`] with positional metadata.
///
/// Implementations decide window size, stride and label extraction; this
/// crate only requires that the emitted collection satisfies the provenance
/// invariants (checked by [`WindowCollection::new`]).
pub trait Windower {
    fn window(&self, recording: &RecordingSource) -> Result<WindowCollection>;
}
