//! Recording-level splitting of a concatenated dataset.
//!
//! Splits operate on *recordings*, not on individual windows: a recording's
//! windows always move together. Two construction modes, mutually exclusive:
//!
//! - **by field**: group recordings by equality of a named metadata field,
//!   one split per distinct value, named after the value;
//! - **explicit**: caller supplies lists of recording indices, one split per
//!   list, named positionally `"0", "1", ...`.
//!
//! Each split is a [`SplitView`]: a renumbered window subset whose internal
//! indices run `0..m`, in the order windows appear within each listed
//! recording. Splitting by a field that partitions the recordings yields
//! views whose flat index sets partition `[0, total)` with no gaps and no
//! overlaps.

use std::collections::BTreeMap;

use crate::dataset::{ConcatenatedWindowsDataset, WindowAccess};
use crate::error::{DecodingError, Result};
use crate::windowing::WindowSample;

// ============================================================================
// SplitView
// ============================================================================

/// A named subset of a concatenated dataset, renumbered `0..m`.
///
/// Holds the parent's flat indices in collection order; access is restricted
/// to exactly this index set.
#[derive(Debug, Clone)]
pub struct SplitView<'a> {
    parent: &'a ConcatenatedWindowsDataset,
    indices: Vec<usize>,
}

impl<'a> SplitView<'a> {
    fn new(parent: &'a ConcatenatedWindowsDataset, indices: Vec<usize>) -> Self {
        Self { parent, indices }
    }

    /// Flat indices into the parent dataset, in view order.
    pub fn flat_indices(&self) -> &[usize] {
        &self.indices
    }

    /// The dataset this view restricts.
    pub fn parent(&self) -> &'a ConcatenatedWindowsDataset {
        self.parent
    }
}

impl WindowAccess for SplitView<'_> {
    fn len(&self) -> usize {
        self.indices.len()
    }

    fn get(&self, index: usize) -> Result<WindowSample> {
        let flat = *self
            .indices
            .get(index)
            .ok_or_else(|| DecodingError::window_index(index, self.indices.len()))?;
        self.parent.get(flat)
    }
}

// ============================================================================
// split
// ============================================================================

impl ConcatenatedWindowsDataset {
    /// Split into named subsets by a metadata field or by explicit
    /// recording-index groups.
    ///
    /// Exactly one of `by_field` and `explicit_groups` must be given. Group
    /// resolution happens at the recording level; each recording index is
    /// then translated to its global window range through the same
    /// cumulative-size table the flat resolver uses, so the two translations
    /// can never drift apart.
    ///
    /// A group containing zero recordings yields an empty view, not an
    /// error.
    pub fn split(
        &self,
        by_field: Option<&str>,
        explicit_groups: Option<&[Vec<usize>]>,
    ) -> Result<BTreeMap<String, SplitView<'_>>> {
        let groups: Vec<(String, Vec<usize>)> = match (by_field, explicit_groups) {
            (Some(field), None) => self
                .info()
                .group_by(field)?
                .into_iter()
                .map(|(value, recordings)| (value.to_string(), recordings))
                .collect(),
            (None, Some(lists)) => lists
                .iter()
                .enumerate()
                .map(|(i, recordings)| (i.to_string(), recordings.clone()))
                .collect(),
            _ => return Err(DecodingError::SplitModeConflict),
        };

        let mut splits = BTreeMap::new();
        for (name, recordings) in groups {
            let mut indices = Vec::new();
            for &k in &recordings {
                indices.extend(self.recording_range(k)?);
            }
            if indices.is_empty() {
                log::warn!("split '{name}' contains no windows");
            }
            log::debug!(
                "split '{}': {} recordings, {} windows",
                name,
                recordings.len(),
                indices.len()
            );
            splits.insert(name, SplitView::new(self, indices));
        }
        Ok(splits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::WindowsDataset;
    use crate::metadata::InfoRow;
    use crate::windowing::{Provenance, WindowCollection};
    use ndarray::{Array1, Array3};
    use std::sync::Arc;

    fn dataset_of(n: usize, session: &str) -> WindowsDataset {
        let data = Array3::zeros((n, 2, 10));
        let targets = Array1::from_vec((0..n as i64).collect());
        let provenance = (0..n)
            .map(|j| Provenance::new(j as i64, (j * 10) as i64, (j * 10 + 10) as i64))
            .collect();
        let windows = WindowCollection::new(data, targets, provenance).unwrap();
        WindowsDataset::new(windows, Arc::new(InfoRow::new().with("session", session)))
    }

    fn session_concat() -> ConcatenatedWindowsDataset {
        // Recordings of 5, 3 and 2 windows; sessions train/train/eval.
        ConcatenatedWindowsDataset::concat(vec![
            dataset_of(5, "train"),
            dataset_of(3, "train"),
            dataset_of(2, "eval"),
        ])
    }

    #[test]
    fn split_by_field_partitions_all_windows() {
        let concat = session_concat();
        let splits = concat.split(Some("session"), None).unwrap();
        assert_eq!(splits.len(), 2);

        let train = &splits["train"];
        let eval = &splits["eval"];
        assert_eq!(train.len(), 8);
        assert_eq!(eval.len(), 2);
        assert_eq!(train.flat_indices(), &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(eval.flat_indices(), &[8, 9]);

        // Union is [0, total), pairwise disjoint.
        let mut all: Vec<usize> = splits
            .values()
            .flat_map(|v| v.flat_indices().iter().copied())
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..concat.len()).collect::<Vec<_>>());
    }

    #[test]
    fn split_views_are_renumbered() {
        let concat = session_concat();
        let splits = concat.split(Some("session"), None).unwrap();
        let eval = &splits["eval"];
        // Local index 0 of the eval view is flat index 8: window 0 of
        // recording 2.
        let sample = eval.get(0).unwrap();
        assert_eq!(sample.provenance.i_window_in_trial, 0);
        assert!(eval.get(2).is_err());
    }

    #[test]
    fn split_by_explicit_groups_uses_positional_names() {
        let concat = session_concat();
        let groups = vec![vec![2usize, 0], vec![1]];
        let splits = concat.split(None, Some(&groups)).unwrap();
        assert_eq!(splits.len(), 2);
        // Group "0" lists recording 2 before recording 0: its windows come
        // in that order.
        assert_eq!(splits["0"].flat_indices(), &[8, 9, 0, 1, 2, 3, 4]);
        assert_eq!(splits["1"].flat_indices(), &[5, 6, 7]);
    }

    #[test]
    fn split_mode_must_be_exactly_one() {
        let concat = session_concat();
        assert!(matches!(
            concat.split(None, None).unwrap_err(),
            DecodingError::SplitModeConflict
        ));
        let groups = vec![vec![0usize]];
        assert!(matches!(
            concat.split(Some("session"), Some(&groups)).unwrap_err(),
            DecodingError::SplitModeConflict
        ));
    }

    #[test]
    fn split_by_missing_field_fails() {
        let concat = session_concat();
        assert!(matches!(
            concat.split(Some("subject"), None).unwrap_err(),
            DecodingError::MissingField(f) if f == "subject"
        ));
    }

    #[test]
    fn empty_group_yields_empty_view() {
        let concat = session_concat();
        let groups = vec![vec![], vec![1usize]];
        let splits = concat.split(None, Some(&groups)).unwrap();
        assert_eq!(splits["0"].len(), 0);
        assert!(splits["0"].is_empty());
        assert_eq!(splits["1"].len(), 3);
    }

    #[test]
    fn explicit_group_with_bad_recording_index_fails() {
        let concat = session_concat();
        let groups = vec![vec![3usize]];
        assert!(matches!(
            concat.split(None, Some(&groups)).unwrap_err(),
            DecodingError::IndexOutOfRange { index: 3, len: 3, .. }
        ));
    }
}
