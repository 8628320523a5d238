//! Batch assembly and the provenance-preserving loader wrapper.
//!
//! A generic trainer only understands `(input, target)` pairs, but every
//! window in this pipeline carries a provenance triple that must survive
//! batching. The two layers here keep those concerns apart:
//!
//! - [`BatchLoader`] walks a [`WindowAccess`] in sequential or shuffled
//!   order and assembles [`RawBatch`]es: inputs, targets and (when the
//!   source provides it) a [`ProvenanceBatch`] column block.
//! - [`ProvenancePreservingLoader`] wraps any raw-batch iterator and
//!   performs the single narrowing step: in discard mode it stashes the
//!   provenance in the trainer's mailbox and emits [`Batch::Pair`]; in
//!   retain mode it emits [`Batch::Triple`] with the provenance untouched.
//!
//! Batches are a tagged variant ([`Batch::Pair`] or [`Batch::Triple`]),
//! so nothing downstream ever inspects a tuple length at runtime. Inputs
//! are coerced `f64 -> f32` and targets fixed at `i64` at the emission
//! boundary; whatever parallel prefetching the underlying iterator does is
//! opaque here, only consumption order matters.

use ndarray::{Array1, Array3, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::dataset::WindowAccess;
use crate::error::{DecodingError, Result};
use crate::scoring::SharedMailbox;
use crate::windowing::WindowSample;

// ============================================================================
// ProvenanceBatch
// ============================================================================

/// Per-window provenance of one batch, column-wise.
///
/// Row `i` of each column describes the window in batch row `i`. The columns
/// are read and relayed, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvenanceBatch {
    pub i_window_in_trial: Array1<i64>,
    pub i_start_in_trial: Array1<i64>,
    pub i_stop_in_trial: Array1<i64>,
}

impl ProvenanceBatch {
    /// Collect the provenance column block of a batch of samples.
    pub fn from_samples(samples: &[WindowSample]) -> Self {
        Self {
            i_window_in_trial: samples
                .iter()
                .map(|s| s.provenance.i_window_in_trial)
                .collect(),
            i_start_in_trial: samples
                .iter()
                .map(|s| s.provenance.i_start_in_trial)
                .collect(),
            i_stop_in_trial: samples
                .iter()
                .map(|s| s.provenance.i_stop_in_trial)
                .collect(),
        }
    }

    /// Number of windows described.
    pub fn len(&self) -> usize {
        self.i_window_in_trial.len()
    }

    pub fn is_empty(&self) -> bool {
        self.i_window_in_trial.is_empty()
    }
}

// ============================================================================
// RawBatch
// ============================================================================

/// What the underlying batch iterator yields: `f64` inputs, `i64` targets
/// and an optional provenance block.
///
/// Sources that window recordings always fill the provenance; trial-wise
/// sources that know nothing about windows leave it `None`.
#[derive(Debug, Clone)]
pub struct RawBatch {
    /// `[batch, n_channels, n_samples]`.
    pub inputs: Array3<f64>,
    /// `[batch]`.
    pub targets: Array1<i64>,
    /// Provenance columns, present for windowed sources.
    pub provenance: Option<ProvenanceBatch>,
}

impl RawBatch {
    /// A two-element batch (no provenance).
    pub fn pair(inputs: Array3<f64>, targets: Array1<i64>) -> Self {
        Self {
            inputs,
            targets,
            provenance: None,
        }
    }

    /// A three-element batch.
    pub fn triple(inputs: Array3<f64>, targets: Array1<i64>, provenance: ProvenanceBatch) -> Self {
        Self {
            inputs,
            targets,
            provenance: Some(provenance),
        }
    }

    /// Batch size.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

// ============================================================================
// Batch (narrowed)
// ============================================================================

/// What the provenance-preserving loader emits: an explicit two-variant
/// batch, already coerced to the trainer's element types.
#[derive(Debug, Clone)]
pub enum Batch {
    /// `(input, target)`: what a provenance-blind trainer consumes.
    Pair {
        inputs: Array3<f32>,
        targets: Array1<i64>,
    },
    /// `(input, target, provenance)`: inference mode.
    Triple {
        inputs: Array3<f32>,
        targets: Array1<i64>,
        provenance: ProvenanceBatch,
    },
}

impl Batch {
    pub fn inputs(&self) -> &Array3<f32> {
        match self {
            Batch::Pair { inputs, .. } | Batch::Triple { inputs, .. } => inputs,
        }
    }

    pub fn targets(&self) -> &Array1<i64> {
        match self {
            Batch::Pair { targets, .. } | Batch::Triple { targets, .. } => targets,
        }
    }

    /// Provenance block, present only on [`Batch::Triple`].
    pub fn provenance(&self) -> Option<&ProvenanceBatch> {
        match self {
            Batch::Pair { .. } => None,
            Batch::Triple { provenance, .. } => Some(provenance),
        }
    }

    pub fn len(&self) -> usize {
        self.targets().len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets().is_empty()
    }
}

// ============================================================================
// BatchLoader
// ============================================================================

/// Iteration order of the underlying batch producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOrder {
    /// Natural flat-index order; required for cropped inference.
    Sequential,
    /// Uniform shuffle, reseeded per iteration pass when a seed is given.
    Shuffled { seed: Option<u64> },
}

/// Assembles fixed-size batches from a [`WindowAccess`].
///
/// The last batch of a pass may be short. Shuffling permutes window order
/// across the whole dataset, not within batches only.
#[derive(Debug)]
pub struct BatchLoader<'a, D: WindowAccess + ?Sized> {
    dataset: &'a D,
    batch_size: usize,
    order: IterationOrder,
}

impl<'a, D: WindowAccess + ?Sized> BatchLoader<'a, D> {
    pub fn new(dataset: &'a D, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(DecodingError::InvalidConfig(
                "batch_size must be positive".to_string(),
            ));
        }
        Ok(Self {
            dataset,
            batch_size,
            order: IterationOrder::Sequential,
        })
    }

    pub fn with_order(mut self, order: IterationOrder) -> Self {
        self.order = order;
        self
    }

    pub fn order(&self) -> IterationOrder {
        self.order
    }

    /// Start one pass over the dataset.
    pub fn iter(&self) -> RawBatchIter<'a, D> {
        let mut indices: Vec<usize> = (0..self.dataset.len()).collect();
        if let IterationOrder::Shuffled { seed } = self.order {
            let mut rng = match seed {
                Some(s) => StdRng::seed_from_u64(s),
                None => StdRng::from_entropy(),
            };
            indices.shuffle(&mut rng);
        }
        RawBatchIter {
            dataset: self.dataset,
            indices,
            cursor: 0,
            batch_size: self.batch_size,
        }
    }
}

/// One pass of raw batches over a dataset.
pub struct RawBatchIter<'a, D: WindowAccess + ?Sized> {
    dataset: &'a D,
    indices: Vec<usize>,
    cursor: usize,
    batch_size: usize,
}

impl<D: WindowAccess + ?Sized> RawBatchIter<'_, D> {
    fn assemble(&self, indices: &[usize]) -> Result<RawBatch> {
        let mut samples = Vec::with_capacity(indices.len());
        for &g in indices {
            samples.push(self.dataset.get(g)?);
        }

        let (n_channels, n_samples) = samples[0].x.dim();
        let mut inputs = Array3::zeros((samples.len(), n_channels, n_samples));
        for (i, sample) in samples.iter().enumerate() {
            if sample.x.dim() != (n_channels, n_samples) {
                return Err(DecodingError::InvalidConfig(format!(
                    "window shape {:?} differs from {:?} within one batch",
                    sample.x.dim(),
                    (n_channels, n_samples)
                )));
            }
            inputs.index_axis_mut(Axis(0), i).assign(&sample.x);
        }
        let targets: Array1<i64> = samples.iter().map(|s| s.y).collect();
        let provenance = ProvenanceBatch::from_samples(&samples);
        Ok(RawBatch::triple(inputs, targets, provenance))
    }
}

impl<D: WindowAccess + ?Sized> Iterator for RawBatchIter<'_, D> {
    type Item = Result<RawBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.indices.len() {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.indices.len());
        let batch_indices = &self.indices[self.cursor..end];
        self.cursor = end;
        Some(self.assemble(batch_indices))
    }
}

// ============================================================================
// ProvenancePreservingLoader
// ============================================================================

/// What happens to the provenance element at the narrowing boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvenanceMode {
    /// Stash provenance in the trainer's mailbox, emit pairs (training and
    /// evaluation through a pair-only trainer).
    Discard,
    /// Emit triples with the provenance untouched (cropped inference).
    Retain,
}

/// Wraps a raw-batch iterator and narrows each batch for its consumer.
///
/// Holds a shared handle to the trainer's provenance mailbox: in
/// [`ProvenanceMode::Discard`] every provenance-carrying batch is stashed
/// there (one slot, overwritten per batch) before the trainer sees the
/// pair. The stash/consume handshake assumes exactly one batch in flight;
/// see [`ProvenanceMailbox`](crate::scoring::ProvenanceMailbox).
pub struct ProvenancePreservingLoader<I> {
    inner: I,
    mailbox: SharedMailbox,
    mode: ProvenanceMode,
}

impl<I> ProvenancePreservingLoader<I>
where
    I: Iterator<Item = Result<RawBatch>>,
{
    pub fn new(inner: I, mailbox: SharedMailbox, mode: ProvenanceMode) -> Self {
        Self {
            inner,
            mailbox,
            mode,
        }
    }

    pub fn mode(&self) -> ProvenanceMode {
        self.mode
    }

    /// The single narrowing step: coerce element types, route provenance.
    fn narrow(&mut self, raw: RawBatch) -> Result<Batch> {
        let inputs = raw.inputs.mapv(|v| v as f32);
        let targets = raw.targets;
        match self.mode {
            ProvenanceMode::Discard => {
                if let Some(provenance) = raw.provenance {
                    self.mailbox.borrow_mut().stash(provenance);
                }
                Ok(Batch::Pair { inputs, targets })
            }
            ProvenanceMode::Retain => {
                let provenance = raw.provenance.ok_or(DecodingError::MissingProvenance)?;
                Ok(Batch::Triple {
                    inputs,
                    targets,
                    provenance,
                })
            }
        }
    }
}

impl<I> Iterator for ProvenancePreservingLoader<I>
where
    I: Iterator<Item = Result<RawBatch>>,
{
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.inner.next()?;
        Some(raw.and_then(|b| self.narrow(b)))
    }
}
