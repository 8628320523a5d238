//! Cropped inference: full-dataset prediction with provenance retained.
//!
//! The predictor drives a retain-mode loader over a dataset in its natural
//! flat order, feeds every batch to a [`ProbabilisticClassifier`], and
//! reassembles the per-batch outputs into four aligned arrays: class
//! probabilities, window-in-trial indices, window stop indices and targets.
//! Row `i` of each array describes the same window, and, because the
//! iterator never reorders, that window sits at flat index `i` of the input
//! dataset.
//!
//! Shuffled iteration would silently misalign predictions and windows, so
//! it is rejected outright rather than left to caller discipline.

use std::cell::RefCell;
use std::rc::Rc;

use ndarray::{concatenate, Array1, Array2, Array3, Axis};

use crate::config::LoaderConfig;
use crate::dataset::WindowAccess;
use crate::error::{DecodingError, Result};
use crate::loader::{Batch, BatchLoader, ProvenanceMode, ProvenancePreservingLoader};
use crate::scoring::{ProvenanceMailbox, SharedMailbox};

// ============================================================================
// Trainer contract
// ============================================================================

/// The only thing the predictor needs from a trained model.
pub trait ProbabilisticClassifier {
    /// Class probabilities for a batch: `[batch, n_channels, n_samples]`
    /// in, `[batch, n_classes]` out.
    fn predict_proba(&self, inputs: &Array3<f32>) -> Result<Array2<f32>>;
}

// ============================================================================
// CroppedPredictions
// ============================================================================

/// Aligned outputs of one full inference pass.
///
/// All four arrays have the same length, the dataset's total window count,
/// and row `i` of each describes the window at flat index `i`.
#[derive(Debug, Clone)]
pub struct CroppedPredictions {
    /// Class probabilities, `[n_windows, n_classes]`.
    pub preds: Array2<f32>,
    /// `i_window_in_trial` per window.
    pub i_window_in_trials: Array1<i64>,
    /// `i_stop_in_trial` per window.
    pub i_window_stops: Array1<i64>,
    /// Target label per window.
    pub window_ys: Array1<i64>,
}

impl CroppedPredictions {
    /// Number of windows described.
    pub fn len(&self) -> usize {
        self.window_ys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window_ys.is_empty()
    }

    /// Number of classes in the probability rows.
    pub fn n_classes(&self) -> usize {
        self.preds.ncols()
    }
}

// ============================================================================
// CroppedPredictor
// ============================================================================

/// Drives full-dataset inference with provenance retained.
pub struct CroppedPredictor<'a, M> {
    model: &'a M,
    batch_size: usize,
}

impl<'a, M: ProbabilisticClassifier> CroppedPredictor<'a, M> {
    pub fn new(model: &'a M, batch_size: usize) -> Self {
        Self { model, batch_size }
    }

    /// Predict from a loader configuration.
    ///
    /// Fails with [`DecodingError::ShuffledInference`] when the
    /// configuration asks for shuffled iteration; reordered batches would
    /// break the prediction/window correspondence.
    pub fn predict_with_config<D>(
        &self,
        dataset: &D,
        config: &LoaderConfig,
    ) -> Result<CroppedPredictions>
    where
        D: WindowAccess + ?Sized,
    {
        if config.shuffle {
            return Err(DecodingError::ShuffledInference);
        }
        Self::new(self.model, config.batch_size).predict_with_provenance(dataset)
    }

    /// One full pass over `dataset` in natural flat order.
    ///
    /// A dataset with zero windows is reported as
    /// [`DecodingError::EmptyResult`]; there is nothing to align.
    pub fn predict_with_provenance<D>(&self, dataset: &D) -> Result<CroppedPredictions>
    where
        D: WindowAccess + ?Sized,
    {
        if dataset.is_empty() {
            return Err(DecodingError::EmptyResult(
                "dataset contains no windows".to_string(),
            ));
        }

        // Inference keeps its own mailbox: retain mode never stashes, and a
        // training harness's slot must not be disturbed by a predict pass.
        let mailbox: SharedMailbox = Rc::new(RefCell::new(ProvenanceMailbox::new()));
        let raw = BatchLoader::new(dataset, self.batch_size)?;
        let loader = ProvenancePreservingLoader::new(raw.iter(), mailbox, ProvenanceMode::Retain);

        let mut preds: Vec<Array2<f32>> = Vec::new();
        let mut i_window_in_trials: Vec<Array1<i64>> = Vec::new();
        let mut i_window_stops: Vec<Array1<i64>> = Vec::new();
        let mut window_ys: Vec<Array1<i64>> = Vec::new();

        for batch in loader {
            let batch = batch?;
            let Batch::Triple {
                inputs,
                targets,
                provenance,
            } = batch
            else {
                // Retain mode only ever emits triples.
                return Err(DecodingError::MissingProvenance);
            };

            let p = self.model.predict_proba(&inputs)?;
            if p.nrows() != targets.len() {
                return Err(DecodingError::InvalidConfig(format!(
                    "model returned {} prediction rows for a batch of {}",
                    p.nrows(),
                    targets.len()
                )));
            }

            preds.push(p);
            i_window_in_trials.push(provenance.i_window_in_trial);
            i_window_stops.push(provenance.i_stop_in_trial);
            window_ys.push(targets);
        }

        let out = CroppedPredictions {
            preds: concat2(&preds)?,
            i_window_in_trials: concat1(&i_window_in_trials)?,
            i_window_stops: concat1(&i_window_stops)?,
            window_ys: concat1(&window_ys)?,
        };
        debug_assert_eq!(out.preds.nrows(), out.len());
        debug_assert_eq!(out.i_window_in_trials.len(), out.len());
        debug_assert_eq!(out.i_window_stops.len(), out.len());
        log::info!(
            "cropped inference: {} windows, {} classes",
            out.len(),
            out.n_classes()
        );
        Ok(out)
    }
}

fn concat1(parts: &[Array1<i64>]) -> Result<Array1<i64>> {
    let views: Vec<_> = parts.iter().map(|a| a.view()).collect();
    concatenate(Axis(0), &views)
        .map_err(|e| DecodingError::InvalidConfig(format!("batch concatenation failed: {e}")))
}

fn concat2(parts: &[Array2<f32>]) -> Result<Array2<f32>> {
    let views: Vec<_> = parts.iter().map(|a| a.view()).collect();
    concatenate(Axis(0), &views)
        .map_err(|e| DecodingError::InvalidConfig(format!("batch concatenation failed: {e}")))
}
