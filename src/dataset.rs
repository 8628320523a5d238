//! Recordings, per-recording window datasets and their concatenation.
//!
//! Three index spaces have to stay in exact alignment throughout the
//! pipeline:
//!
//! ```text
//! local index   position of a window inside one recording's sequence
//! flat index    position inside the concatenation of all recordings
//! batch row     position a provenance-blind trainer sees
//! ```
//!
//! This module owns the first two. [`WindowsDataset`] exposes flat local
//! indexing over one recording's windows; [`ConcatenatedWindowsDataset`]
//! chains many of them behind a single flat index, using a cumulative-size
//! table to translate `flat -> (recording, local)` and back. The translation
//! is a binary search over a monotone table, so it stays correct (and cheap)
//! for arbitrarily many recordings.
//!
//! Windowing many recordings is embarrassingly parallel, each recording
//! being windowed independently, so construction fans out over rayon while
//! consumption stays strictly sequential.

use std::sync::Arc;

use ndarray::Array2;
use rayon::prelude::*;

use crate::error::{DecodingError, Result};
use crate::metadata::{InfoRow, InfoTable};
use crate::windowing::{WindowCollection, WindowSample, Windower};

// ============================================================================
// WindowAccess
// ============================================================================

/// Flat-indexed read access to a window sequence.
///
/// Implemented by [`WindowsDataset`], [`ConcatenatedWindowsDataset`] and
/// split views, so the batching layer does not care whether it iterates a
/// whole corpus or a subset.
pub trait WindowAccess {
    /// Total number of windows.
    fn len(&self) -> usize;

    /// Window at flat index `index`; fails outside `[0, len)`.
    fn get(&self, index: usize) -> Result<WindowSample>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// RecordingSource
// ============================================================================

/// One continuous multi-channel recording plus its metadata row.
///
/// Created once per raw recording and immutable afterwards. The metadata row
/// is shared (not copied) with the [`WindowsDataset`] derived from it.
#[derive(Debug, Clone)]
pub struct RecordingSource {
    signal: Array2<f64>,
    info: Arc<InfoRow>,
    target_field: Option<String>,
}

impl RecordingSource {
    /// Wrap a `[n_channels, n_samples]` signal and its metadata row.
    ///
    /// If `target_field` is given it must name an existing field of `info`.
    pub fn new(
        signal: Array2<f64>,
        info: InfoRow,
        target_field: Option<String>,
    ) -> Result<Self> {
        if let Some(field) = &target_field {
            if !info.contains(field) {
                return Err(DecodingError::MissingField(field.clone()));
            }
        }
        Ok(Self {
            signal,
            info: Arc::new(info),
            target_field,
        })
    }

    /// Continuous signal, `[n_channels, n_samples]`.
    pub fn signal(&self) -> &Array2<f64> {
        &self.signal
    }

    /// Recording-level metadata row.
    pub fn info(&self) -> &Arc<InfoRow> {
        &self.info
    }

    /// Name of the metadata field holding the recording-level target, if any.
    pub fn target_field(&self) -> Option<&str> {
        self.target_field.as_deref()
    }

    /// Number of samples in the continuous signal.
    pub fn n_samples(&self) -> usize {
        self.signal.ncols()
    }

    /// Number of channels.
    pub fn n_channels(&self) -> usize {
        self.signal.nrows()
    }
}

// ============================================================================
// WindowsDataset
// ============================================================================

/// All windows of one recording, with flat local indexing `0..len`.
#[derive(Debug, Clone)]
pub struct WindowsDataset {
    windows: WindowCollection,
    info: Arc<InfoRow>,
}

impl WindowsDataset {
    /// Pair a window collection with its recording's metadata row.
    pub fn new(windows: WindowCollection, info: Arc<InfoRow>) -> Self {
        Self { windows, info }
    }

    /// Window a recording with the given windower.
    pub fn from_recording<W: Windower + ?Sized>(
        recording: &RecordingSource,
        windower: &W,
    ) -> Result<Self> {
        let windows = windower.window(recording)?;
        Ok(Self::new(windows, Arc::clone(recording.info())))
    }

    /// The recording's metadata row (shared, not copied).
    pub fn info(&self) -> &Arc<InfoRow> {
        &self.info
    }

    /// The underlying window collection.
    pub fn windows(&self) -> &WindowCollection {
        &self.windows
    }
}

impl WindowAccess for WindowsDataset {
    fn len(&self) -> usize {
        self.windows.len()
    }

    fn get(&self, index: usize) -> Result<WindowSample> {
        self.windows.window(index)
    }
}

// ============================================================================
// ConcatenatedWindowsDataset
// ============================================================================

/// Many per-recording datasets behind one flat index.
///
/// `cumulative_sizes[k]` is the total window count across the first `k + 1`
/// datasets; for any flat index `g` there is exactly one `k` with
/// `cumulative_sizes[k - 1] <= g < cumulative_sizes[k]` (taking
/// `cumulative_sizes[-1]` as 0), and `g - cumulative_sizes[k - 1]` is the
/// local index inside dataset `k`.
#[derive(Debug, Clone)]
pub struct ConcatenatedWindowsDataset {
    datasets: Vec<WindowsDataset>,
    cumulative_sizes: Vec<usize>,
    info: InfoTable,
}

impl ConcatenatedWindowsDataset {
    /// Concatenate per-recording datasets in the given order.
    pub fn concat(datasets: Vec<WindowsDataset>) -> Self {
        let mut cumulative_sizes = Vec::with_capacity(datasets.len());
        let mut running = 0usize;
        for ds in &datasets {
            running += WindowAccess::len(ds);
            cumulative_sizes.push(running);
        }
        let info = InfoTable::from_rows(
            datasets.iter().map(|ds| (**ds.info()).clone()).collect(),
        );
        log::info!(
            "concatenated {} recordings, {} windows total",
            datasets.len(),
            running
        );
        Self {
            datasets,
            cumulative_sizes,
            info,
        }
    }

    /// Window every recording and concatenate, preserving recording order.
    ///
    /// Windowing is independent per recording, so it runs on the rayon pool;
    /// the resulting dataset order still matches the input order.
    pub fn from_recordings<W: Windower + Sync>(
        recordings: &[RecordingSource],
        windower: &W,
    ) -> Result<Self> {
        let datasets: Result<Vec<WindowsDataset>> = recordings
            .par_iter()
            .map(|rec| WindowsDataset::from_recording(rec, windower))
            .collect();
        Ok(Self::concat(datasets?))
    }

    /// Number of concatenated recordings.
    pub fn n_recordings(&self) -> usize {
        self.datasets.len()
    }

    /// Running window counts, one entry per recording.
    pub fn cumulative_sizes(&self) -> &[usize] {
        &self.cumulative_sizes
    }

    /// Aggregated metadata table, one row per recording in dataset order.
    pub fn info(&self) -> &InfoTable {
        &self.info
    }

    /// The `k`-th per-recording dataset.
    pub fn dataset(&self, k: usize) -> Result<&WindowsDataset> {
        self.datasets
            .get(k)
            .ok_or_else(|| DecodingError::recording_index(k, self.datasets.len()))
    }

    /// Translate a flat index into `(recording index, local index)`.
    ///
    /// Binary search over the monotone cumulative table.
    pub fn resolve(&self, g: usize) -> Result<(usize, usize)> {
        let total = self.len();
        if g >= total {
            return Err(DecodingError::window_index(g, total));
        }
        // First k whose cumulative size exceeds g.
        let k = self.cumulative_sizes.partition_point(|&c| c <= g);
        let offset = if k == 0 { 0 } else { self.cumulative_sizes[k - 1] };
        Ok((k, g - offset))
    }

    /// Flat index of `(recording index, local index)`, the inverse of
    /// [`resolve`](Self::resolve).
    pub fn flat_index(&self, k: usize, local: usize) -> Result<usize> {
        let ds = self.dataset(k)?;
        let n = WindowAccess::len(ds);
        if local >= n {
            return Err(DecodingError::window_index(local, n));
        }
        let offset = if k == 0 { 0 } else { self.cumulative_sizes[k - 1] };
        Ok(offset + local)
    }

    /// Global flat index range `[start, stop)` covered by recording `k`.
    pub fn recording_range(&self, k: usize) -> Result<std::ops::Range<usize>> {
        if k >= self.datasets.len() {
            return Err(DecodingError::recording_index(k, self.datasets.len()));
        }
        let start = if k == 0 { 0 } else { self.cumulative_sizes[k - 1] };
        Ok(start..self.cumulative_sizes[k])
    }
}

impl WindowAccess for ConcatenatedWindowsDataset {
    fn len(&self) -> usize {
        self.cumulative_sizes.last().copied().unwrap_or(0)
    }

    fn get(&self, index: usize) -> Result<WindowSample> {
        let (k, local) = self.resolve(index)?;
        self.datasets[k].get(local)
    }
}
