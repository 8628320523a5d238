//! Prelude module for convenient imports.
//!
//! Re-exports the most commonly used types and traits for ergonomic usage
//! of the cropped-decoding library.
//!
//! # Usage
//!
//! ```ignore
//! use cropped_decoding::prelude::*;
//!
//! let dataset = ConcatenatedWindowsDataset::from_recordings(&recordings, &windower)?;
//! let splits = dataset.split(Some("session"), None)?;
//! ```

// ============================================================================
// Error handling
// ============================================================================

pub use crate::error::{DecodingError, Result};

// ============================================================================
// Metadata
// ============================================================================

pub use crate::metadata::{InfoRow, InfoTable, MetaValue};

// ============================================================================
// Windowing
// ============================================================================

pub use crate::windowing::{Provenance, WindowCollection, WindowSample, Windower};

// ============================================================================
// Datasets and splits
// ============================================================================

pub use crate::dataset::{
    ConcatenatedWindowsDataset, RecordingSource, WindowAccess, WindowsDataset,
};
pub use crate::split::SplitView;

// ============================================================================
// Loading
// ============================================================================

pub use crate::loader::{
    Batch, BatchLoader, IterationOrder, ProvenanceBatch, ProvenanceMode,
    ProvenancePreservingLoader, RawBatch,
};

// ============================================================================
// Scoring
// ============================================================================

pub use crate::scoring::{
    CroppedTrialScorer, EpochScorer, ProvenanceMailbox, ScoringHarness, SharedMailbox,
};

// ============================================================================
// Prediction and export
// ============================================================================

pub use crate::predictor::{CroppedPredictions, CroppedPredictor, ProbabilisticClassifier};
pub use crate::export::{ExportMetadata, PredictionExporter};

// ============================================================================
// Configuration and validation
// ============================================================================

pub use crate::config::{DecodingConfig, ExperimentMetadata, LoaderConfig};
pub use crate::validation::{DatasetValidator, ValidationConfig, ValidationResult};
