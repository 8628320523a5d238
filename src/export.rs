//! Prediction export.
//!
//! Writes the aligned output of a cropped-inference pass to NumPy `.npy`
//! files plus a JSON metadata sidecar, for downstream analysis in
//! Python/PyTorch tooling.
//!
//! # Guarantees
//!
//! - Every exported array has the same length (checked before anything is
//!   written; a partial export is worse than none)
//! - Row `i` of every file describes the same window
//! - `metadata.json` records counts, file names and an RFC 3339 export
//!   timestamp
//!
//! # Example
//!
//! ```ignore
//! use cropped_decoding::export::PredictionExporter;
//!
//! let exporter = PredictionExporter::new("runs/baseline");
//! let metadata = exporter.export(&predictions)?;
//! println!("exported {} windows", metadata.n_windows);
//! ```

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use ndarray_npy::WriteNpyExt;
use serde::{Deserialize, Serialize};

use crate::error::{DecodingError, Result};
use crate::predictor::CroppedPredictions;

/// Metadata sidecar written next to the exported arrays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// Number of windows described by each array
    pub n_windows: usize,

    /// Number of classes in the probability rows
    pub n_classes: usize,

    /// Exported file names, in write order
    pub files: Vec<String>,

    /// Export timestamp
    pub export_timestamp: String,
}

/// Exports [`CroppedPredictions`] to `.npy` files for Python.
pub struct PredictionExporter {
    output_dir: PathBuf,
}

impl PredictionExporter {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Export one inference pass.
    ///
    /// Creates:
    /// - `preds.npy`: `[n_windows, n_classes]` f32
    /// - `i_window_in_trials.npy`: `[n_windows]` i64
    /// - `i_window_stops.npy`: `[n_windows]` i64
    /// - `window_ys.npy`: `[n_windows]` i64
    /// - `metadata.json`
    pub fn export(&self, predictions: &CroppedPredictions) -> Result<ExportMetadata> {
        if predictions.is_empty() {
            return Err(DecodingError::EmptyResult(
                "no predictions to export".to_string(),
            ));
        }
        let n = predictions.len();
        if predictions.preds.nrows() != n
            || predictions.i_window_in_trials.len() != n
            || predictions.i_window_stops.len() != n
        {
            return Err(DecodingError::InvalidConfig(format!(
                "misaligned prediction arrays: {} preds, {} window indices, {} stops, {} targets",
                predictions.preds.nrows(),
                predictions.i_window_in_trials.len(),
                predictions.i_window_stops.len(),
                n
            )));
        }

        fs::create_dir_all(&self.output_dir)?;

        let mut files = Vec::new();
        files.push(self.write_npy("preds.npy", |f| predictions.preds.write_npy(f))?);
        files.push(self.write_npy("i_window_in_trials.npy", |f| {
            predictions.i_window_in_trials.write_npy(f)
        })?);
        files.push(self.write_npy("i_window_stops.npy", |f| {
            predictions.i_window_stops.write_npy(f)
        })?);
        files.push(self.write_npy("window_ys.npy", |f| predictions.window_ys.write_npy(f))?);

        let metadata = ExportMetadata {
            n_windows: n,
            n_classes: predictions.n_classes(),
            files,
            export_timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let json = serde_json::to_string_pretty(&metadata)?;
        fs::write(self.output_dir.join("metadata.json"), json)?;

        log::info!(
            "exported {} windows x {} classes to {}",
            n,
            metadata.n_classes,
            self.output_dir.display()
        );
        Ok(metadata)
    }

    fn write_npy<F>(&self, name: &str, write: F) -> Result<String>
    where
        F: FnOnce(&mut File) -> std::result::Result<(), ndarray_npy::WriteNpyError>,
    {
        let path = self.output_dir.join(name);
        let mut file = File::create(&path)?;
        write(&mut file)?;
        Ok(name.to_string())
    }
}
