//! The provenance mailbox, scoring collaborators and the post-batch hook.
//!
//! A provenance-blind trainer consumes `(input, target)` pairs, yet
//! evaluation-time scorers need to know *which* windows each batch covered.
//! The handshake:
//!
//! ```text
//! loader (discard mode)            trainer                 scorers
//!   stash provenance  ──►  [ProvenanceMailbox]  ──take──►  record
//!        per batch            single slot           post-batch hook
//! ```
//!
//! The mailbox is a single slot with no queue: one stash per batch, one
//! consume per batch, exactly one batch in flight between them. Writing and
//! reading happen on the consuming side of the loader, single-threaded
//! relative to the trainer, so no locking is involved; the discipline is
//! enforced by failing loudly ([`DecodingError::EmptyMailbox`]) when a
//! consume finds the slot empty.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{DecodingError, Result};
use crate::loader::{ProvenanceBatch, ProvenanceMode, ProvenancePreservingLoader, RawBatch};

/// Shared handle to a trainer's mailbox, cloned into each loader.
pub type SharedMailbox = Rc<RefCell<ProvenanceMailbox>>;

// ============================================================================
// ProvenanceMailbox
// ============================================================================

/// Single-slot mailbox between the loader and the post-batch hook.
///
/// `stash` arms the slot, overwriting any pending value; `take` disarms it.
/// An armed-but-never-consumed value is an accepted hazard when no scorer is
/// registered; the next stash simply replaces it.
#[derive(Debug, Default)]
pub struct ProvenanceMailbox {
    slot: Option<ProvenanceBatch>,
}

impl ProvenanceMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a stashed value is pending.
    pub fn is_armed(&self) -> bool {
        self.slot.is_some()
    }

    /// Store the provenance of the batch currently in flight.
    pub fn stash(&mut self, provenance: ProvenanceBatch) {
        if self.slot.is_some() {
            log::debug!("overwriting unconsumed provenance of a previous batch");
        }
        self.slot = Some(provenance);
    }

    /// Read without consuming.
    pub fn peek(&self) -> Option<&ProvenanceBatch> {
        self.slot.as_ref()
    }

    /// Consume the pending value, clearing the slot.
    ///
    /// Fails when the slot is empty: a consumer asked for provenance no
    /// loader stashed, which means the two sides lost their 1:1 batch
    /// correspondence.
    pub fn take(&mut self) -> Result<ProvenanceBatch> {
        self.slot.take().ok_or(DecodingError::EmptyMailbox)
    }

    /// Drop any pending value.
    pub fn clear(&mut self) {
        self.slot = None;
    }
}

// ============================================================================
// EpochScorer
// ============================================================================

/// A scoring collaborator attached to the trainer.
///
/// Scorers scoped to evaluation that declare [`consumes_provenance`]
/// receive a copy of every evaluation batch's provenance through the
/// post-batch hook, in batch order.
///
/// [`consumes_provenance`]: EpochScorer::consumes_provenance
pub trait EpochScorer {
    /// Scorer name, for logs and lookup.
    fn name(&self) -> &str;

    /// Whether this scorer runs on training batches (true) or evaluation
    /// batches (false).
    fn on_train(&self) -> bool;

    /// Whether this scorer needs per-window provenance per batch.
    fn consumes_provenance(&self) -> bool {
        false
    }

    /// Append one batch's provenance to the scorer's running log.
    fn record_provenance(&mut self, provenance: ProvenanceBatch);

    /// The running per-batch provenance log, in batch order.
    fn provenance_log(&self) -> &[ProvenanceBatch];
}

/// Evaluation-scoped scorer collecting per-batch window provenance for
/// trial-wise reassembly of cropped predictions.
#[derive(Debug, Default)]
pub struct CroppedTrialScorer {
    name: String,
    log: Vec<ProvenanceBatch>,
}

impl CroppedTrialScorer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            log: Vec::new(),
        }
    }
}

impl EpochScorer for CroppedTrialScorer {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_train(&self) -> bool {
        false
    }

    fn consumes_provenance(&self) -> bool {
        true
    }

    fn record_provenance(&mut self, provenance: ProvenanceBatch) {
        self.log.push(provenance);
    }

    fn provenance_log(&self) -> &[ProvenanceBatch] {
        &self.log
    }
}

// ============================================================================
// ScoringHarness
// ============================================================================

/// Trainer-side glue: owns the provenance mailbox and the registered
/// scorers, builds loaders that share the mailbox, and runs the post-batch
/// hook.
#[derive(Default)]
pub struct ScoringHarness {
    mailbox: SharedMailbox,
    scorers: Vec<Box<dyn EpochScorer>>,
}

impl ScoringHarness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the mailbox, for loaders constructed elsewhere.
    pub fn mailbox(&self) -> SharedMailbox {
        Rc::clone(&self.mailbox)
    }

    /// Attach a scoring collaborator; returns its registration index.
    pub fn register(&mut self, scorer: Box<dyn EpochScorer>) -> usize {
        self.scorers.push(scorer);
        self.scorers.len() - 1
    }

    /// Scorer by registration index.
    pub fn scorer(&self, index: usize) -> Option<&dyn EpochScorer> {
        self.scorers.get(index).map(|s| s.as_ref())
    }

    pub fn n_scorers(&self) -> usize {
        self.scorers.len()
    }

    /// Wrap a raw-batch iterator in a loader sharing this harness's
    /// mailbox.
    pub fn loader<I>(&self, inner: I, mode: ProvenanceMode) -> ProvenancePreservingLoader<I>
    where
        I: Iterator<Item = Result<RawBatch>>,
    {
        ProvenancePreservingLoader::new(inner, self.mailbox(), mode)
    }

    /// Post-batch hook, invoked by the trainer after every batch.
    ///
    /// Training batches are a no-op. After an evaluation batch, if any
    /// registered scorer is evaluation-scoped and consumes provenance, the
    /// pending stash is taken (its absence is a consistency failure) and
    /// delivered to each such scorer; the slot ends cleared. With no such
    /// scorer the pending value is left untouched until the next batch
    /// overwrites it.
    pub fn on_batch_end(&mut self, training: bool) -> Result<()> {
        if training {
            return Ok(());
        }
        let consumers: Vec<usize> = self
            .scorers
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.on_train() && s.consumes_provenance())
            .map(|(i, _)| i)
            .collect();
        if consumers.is_empty() {
            return Ok(());
        }

        let provenance = self.mailbox.borrow_mut().take()?;
        for i in consumers {
            self.scorers[i].record_provenance(provenance.clone());
        }
        Ok(())
    }
}
