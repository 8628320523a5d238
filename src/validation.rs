//! Dataset validation.
//!
//! Validation utilities for window collections and concatenated datasets, to
//! catch broken positional bookkeeping before it propagates into training or
//! inference.
//!
//! # Validation Categories
//!
//! 1. **Provenance ordering**: `i_start < i_stop`, zero-based monotone
//!    `i_window_in_trial`
//! 2. **Signal sanity**: NaN/Inf detection in window data
//! 3. **Concatenation consistency**: cumulative sizes are the exact running
//!    sum, metadata table row count matches recording count
//!
//! Unlike the hard errors raised by lookup and splitting, these checks
//! report: they aggregate warnings and errors without aborting, so a whole
//! corpus can be screened in one pass.
//!
//! # Usage
//!
//! ```ignore
//! use cropped_decoding::validation::DatasetValidator;
//!
//! let validator = DatasetValidator::default();
//! let result = validator.validate_concat(&dataset);
//! if result.has_errors() {
//!     for error in result.errors() {
//!         log::error!("{error}");
//!     }
//! }
//! ```

use std::fmt;

use crate::dataset::{ConcatenatedWindowsDataset, WindowAccess, WindowsDataset};
use crate::windowing::WindowCollection;

/// Validation result for a single check.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    /// Data is valid
    Valid,
    /// Data has minor issues (warnings)
    Warning(String),
    /// Data has serious issues (errors)
    Error(String),
}

impl ValidationLevel {
    /// Check if this result indicates valid data.
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationLevel::Valid)
    }

    /// Check if this result is a warning.
    pub fn is_warning(&self) -> bool {
        matches!(self, ValidationLevel::Warning(_))
    }

    /// Check if this result is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, ValidationLevel::Error(_))
    }
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationLevel::Valid => write!(f, "Valid"),
            ValidationLevel::Warning(msg) => write!(f, "Warning: {msg}"),
            ValidationLevel::Error(msg) => write!(f, "Error: {msg}"),
        }
    }
}

/// Aggregated validation result.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    results: Vec<(String, ValidationLevel)>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validation result.
    pub fn add(&mut self, check_name: &str, level: ValidationLevel) {
        self.results.push((check_name.to_string(), level));
    }

    /// Check if all validations passed (no errors or warnings).
    pub fn is_valid(&self) -> bool {
        self.results.iter().all(|(_, level)| level.is_valid())
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.results.iter().any(|(_, level)| level.is_error())
    }

    /// Check if there are any warnings.
    pub fn has_warnings(&self) -> bool {
        self.results.iter().any(|(_, level)| level.is_warning())
    }

    /// All warnings, formatted `check: message`.
    pub fn warnings(&self) -> Vec<String> {
        self.results
            .iter()
            .filter_map(|(name, level)| match level {
                ValidationLevel::Warning(msg) => Some(format!("{name}: {msg}")),
                _ => None,
            })
            .collect()
    }

    /// All errors, formatted `check: message`.
    pub fn errors(&self) -> Vec<String> {
        self.results
            .iter()
            .filter_map(|(name, level)| match level {
                ValidationLevel::Error(msg) => Some(format!("{name}: {msg}")),
                _ => None,
            })
            .collect()
    }

    /// All results.
    pub fn all_results(&self) -> &[(String, ValidationLevel)] {
        &self.results
    }

    /// Number of checks performed.
    pub fn check_count(&self) -> usize {
        self.results.len()
    }

    /// Number of passed checks.
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|(_, l)| l.is_valid()).count()
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let passed = self.passed_count();
        let total = self.check_count();
        writeln!(f, "Validation: {passed}/{total} checks passed")?;

        for (name, level) in &self.results {
            if !level.is_valid() {
                writeln!(f, "  - {name}: {level}")?;
            }
        }

        Ok(())
    }
}

/// Configuration for dataset validation.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Check for NaN/Inf values in window signals
    pub check_nan_inf: bool,

    /// Check provenance ordering invariants
    pub check_provenance: bool,

    /// Check cumulative-size consistency of concatenated datasets
    pub check_cumulative_sizes: bool,

    /// Warn on recordings that produced zero windows
    pub warn_empty_recordings: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            check_nan_inf: true,
            check_provenance: true,
            check_cumulative_sizes: true,
            warn_empty_recordings: true,
        }
    }
}

/// Validator for window collections and concatenated datasets.
#[derive(Debug, Clone, Default)]
pub struct DatasetValidator {
    config: ValidationConfig,
}

impl DatasetValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate one recording's window collection.
    pub fn validate_windows(&self, windows: &WindowCollection) -> ValidationResult {
        let mut result = ValidationResult::new();

        if self.config.check_provenance {
            self.check_provenance(windows, &mut result);
        }
        if self.config.check_nan_inf {
            self.check_nan_inf(windows, &mut result);
        }
        if self.config.warn_empty_recordings && windows.is_empty() {
            result.add(
                "non_empty",
                ValidationLevel::Warning("recording produced zero windows".to_string()),
            );
        }

        result
    }

    /// Validate a concatenated dataset: every member collection plus the
    /// cumulative-size table.
    pub fn validate_concat(&self, dataset: &ConcatenatedWindowsDataset) -> ValidationResult {
        let mut result = ValidationResult::new();

        for k in 0..dataset.n_recordings() {
            let ds: &WindowsDataset = dataset.dataset(k).expect("recording index in range");
            let member = self.validate_windows(ds.windows());
            for (name, level) in member.all_results() {
                result.add(&format!("recording {k}: {name}"), level.clone());
            }
        }

        if self.config.check_cumulative_sizes {
            self.check_cumulative_sizes(dataset, &mut result);
        }

        result
    }

    fn check_provenance(&self, windows: &WindowCollection, result: &mut ValidationResult) {
        let mut level = ValidationLevel::Valid;
        for (j, p) in windows.provenance().iter().enumerate() {
            if p.i_start_in_trial >= p.i_stop_in_trial {
                level = ValidationLevel::Error(format!(
                    "window {j}: start {} not before stop {}",
                    p.i_start_in_trial, p.i_stop_in_trial
                ));
                break;
            }
            if p.i_window_in_trial != j as i64 {
                level = ValidationLevel::Error(format!(
                    "window {j}: i_window_in_trial {} breaks monotone order",
                    p.i_window_in_trial
                ));
                break;
            }
        }
        result.add("provenance_ordering", level);
    }

    fn check_nan_inf(&self, windows: &WindowCollection, result: &mut ValidationResult) {
        let mut level = ValidationLevel::Valid;
        for j in 0..windows.len() {
            let sample = windows.window(j).expect("index in range");
            if let Some(v) = sample.x.iter().find(|v| !v.is_finite()) {
                level = if v.is_nan() {
                    ValidationLevel::Error(format!("NaN value in window {j}"))
                } else {
                    ValidationLevel::Error(format!("infinite value in window {j}"))
                };
                break;
            }
        }
        result.add("finite_signal", level);
    }

    fn check_cumulative_sizes(
        &self,
        dataset: &ConcatenatedWindowsDataset,
        result: &mut ValidationResult,
    ) {
        let mut running = 0usize;
        let mut level = ValidationLevel::Valid;
        for (k, &c) in dataset.cumulative_sizes().iter().enumerate() {
            let n = dataset
                .dataset(k)
                .map(|ds| WindowAccess::len(ds))
                .unwrap_or(0);
            running += n;
            if c != running {
                level = ValidationLevel::Error(format!(
                    "cumulative_sizes[{k}] is {c}, running sum is {running}"
                ));
                break;
            }
        }
        result.add("cumulative_sizes", level);

        let table_level = if dataset.info().len() == dataset.n_recordings() {
            ValidationLevel::Valid
        } else {
            ValidationLevel::Error(format!(
                "metadata table has {} rows for {} recordings",
                dataset.info().len(),
                dataset.n_recordings()
            ))
        };
        result.add("metadata_rows", table_level);
    }
}
