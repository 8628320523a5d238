//! Cropped Decoding
//!
//! Window-indexed dataset management and cropped-inference pipeline for
//! multi-channel time-series decoding.
//!
//! # Overview
//!
//! This library decomposes long multi-channel recordings into fixed-length
//! analysis windows ("supercrops") and tracks each window's provenance
//! (which recording it came from and where it sits inside it) through
//! dataset concatenation, recording-level splitting, batched iteration and
//! model inference, then reassembles per-window predictions into
//! recording-aligned arrays.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Cropped Decoding                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  metadata/    - Recording-level info rows, table, group-by      │
//! │  windowing/   - Window collections, provenance, Windower trait  │
//! │  dataset/     - Per-recording datasets and flat concatenation   │
//! │  split/       - Recording-level splits as renumbered views      │
//! │  loader/      - Batch assembly, provenance-preserving wrapper   │
//! │  scoring/     - Provenance mailbox, post-batch hook, scorers    │
//! │  predictor/   - Cropped inference with aligned outputs          │
//! │  config/      - Experiment configuration (TOML/JSON)            │
//! │  validation/  - Invariant screening for corpora                 │
//! │  export/      - NumPy export of aligned predictions             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Three index spaces stay in exact alignment end to end: a window's local
//! position within its recording, its flat position within the
//! concatenation, and the batch row a provenance-blind trainer sees. The
//! loader threads provenance past the trainer through a single-slot
//! mailbox; the predictor keeps it inline and emits aligned arrays.
//!
//! # Example
//!
//! ```ignore
//! use cropped_decoding::prelude::*;
//!
//! // Window every recording (in parallel) and concatenate.
//! let dataset = ConcatenatedWindowsDataset::from_recordings(&recordings, &windower)?;
//!
//! // Recording-level split by a metadata field.
//! let splits = dataset.split(Some("session"), None)?;
//!
//! // Cropped inference over the evaluation split.
//! let predictor = CroppedPredictor::new(&model, 64);
//! let predictions = predictor.predict_with_provenance(&splits["eval"])?;
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod loader;
pub mod metadata;
pub mod predictor;
pub mod prelude;
pub mod scoring;
pub mod split;
pub mod validation;
pub mod windowing;

// Re-exports - Error handling
pub use error::{DecodingError, Result};

// Re-exports - Metadata
pub use metadata::{InfoRow, InfoTable, MetaValue};

// Re-exports - Windowing
pub use windowing::{Provenance, WindowCollection, WindowSample, Windower};

// Re-exports - Datasets
pub use dataset::{
    ConcatenatedWindowsDataset, RecordingSource, WindowAccess, WindowsDataset,
};
pub use split::SplitView;

// Re-exports - Loading
pub use loader::{
    Batch, BatchLoader, IterationOrder, ProvenanceBatch, ProvenanceMode,
    ProvenancePreservingLoader, RawBatch,
};

// Re-exports - Scoring
pub use scoring::{
    CroppedTrialScorer, EpochScorer, ProvenanceMailbox, ScoringHarness, SharedMailbox,
};

// Re-exports - Prediction
pub use predictor::{CroppedPredictions, CroppedPredictor, ProbabilisticClassifier};

// Re-exports - Configuration
pub use config::{DecodingConfig, ExperimentMetadata, LoaderConfig};

// Re-exports - Validation
pub use validation::{DatasetValidator, ValidationConfig, ValidationLevel, ValidationResult};

// Re-exports - Export
pub use export::{ExportMetadata, PredictionExporter};
