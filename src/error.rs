//! Error types for the cropped-decoding pipeline.
//!
//! A single crate-wide [`DecodingError`] enum covers the three hard failure
//! classes plus the soft empty-result case:
//!
//! 1. **Configuration**: contradictory split modes, missing metadata fields,
//!    invalid loader settings. Programmer/config mistakes, never retried.
//! 2. **Index**: flat or local index outside its valid range. Never clamped,
//!    no wraparound.
//! 3. **Consistency**: the provenance mailbox and the scoring hook are out of
//!    sync (a stash was missed or consumed twice).
//! 4. **Empty result**: a requested operation produced zero windows. Callers
//!    may treat this as a normal empty outcome.
//!
//! All failures surface synchronously to the caller; there are no retries
//! anywhere in this crate.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, DecodingError>;

/// Errors produced by dataset indexing, splitting, loading and export.
#[derive(Debug, Error)]
pub enum DecodingError {
    /// Both or neither of the two split modes were specified.
    #[error("exactly one of `by_field` and `explicit_groups` must be given")]
    SplitModeConflict,

    /// A requested metadata field does not exist in the recording info table.
    #[error("field '{0}' not present in recording metadata")]
    MissingField(String),

    /// A flat or local index fell outside its valid range.
    #[error("{what} index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// Which index space was violated ("window", "recording", ...).
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// The provenance mailbox was empty when a registered scorer needed it.
    ///
    /// Indicates a loader/consumer desynchronization: either a batch was
    /// consumed without a preceding stash, or the same stash was taken twice.
    #[error("provenance mailbox is empty: loader and scoring hook are out of sync")]
    EmptyMailbox,

    /// A batch that must carry provenance did not.
    #[error("batch carries no provenance but the loader was asked to retain it")]
    MissingProvenance,

    /// Cropped inference was requested over a shuffling iterator.
    ///
    /// Shuffled batches would silently break the correspondence between a
    /// prediction and the window it describes.
    #[error("cropped inference requires a non-shuffling iterator")]
    ShuffledInference,

    /// An operation yielded zero windows (soft failure).
    #[error("empty result: {0}")]
    EmptyResult(String),

    /// Window collection or configuration contents are invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Filesystem failure while reading or writing configs/exports.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("toml parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization failure.
    #[error("toml write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// NumPy export failure.
    #[error("npy write error: {0}")]
    Npy(#[from] ndarray_npy::WriteNpyError),
}

impl DecodingError {
    /// Shorthand for an out-of-range window index.
    pub(crate) fn window_index(index: usize, len: usize) -> Self {
        DecodingError::IndexOutOfRange {
            what: "window",
            index,
            len,
        }
    }

    /// Shorthand for an out-of-range recording index.
    pub(crate) fn recording_index(index: usize, len: usize) -> Self {
        DecodingError::IndexOutOfRange {
            what: "recording",
            index,
            len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_identify_the_offender() {
        let e = DecodingError::MissingField("session".to_string());
        assert!(e.to_string().contains("session"));

        let e = DecodingError::window_index(8, 8);
        assert!(e.to_string().contains('8'));
        assert!(e.to_string().contains("window"));
    }
}
