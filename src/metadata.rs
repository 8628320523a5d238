//! Recording-level metadata: typed values, rows and the aggregated table.
//!
//! Every recording carries one metadata row (subject, session, pathology
//! status, ...). The concatenated dataset aggregates these rows into an
//! [`InfoTable`] with one row per recording, in dataset order. Splitting
//! groups recordings by equality of a named field, so [`MetaValue`] has a
//! total order and can key hash maps (floats are compared and hashed by bit
//! pattern).
//!
//! # Example
//!
//! ```ignore
//! use cropped_decoding::metadata::{InfoRow, InfoTable, MetaValue};
//!
//! let table = InfoTable::from_rows(vec![
//!     InfoRow::new().with("subject", 1_i64).with("session", "train"),
//!     InfoRow::new().with("subject", 2_i64).with("session", "eval"),
//! ]);
//! let groups = table.group_by("session")?;
//! ```

use std::collections::BTreeMap;
use std::fmt;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{DecodingError, Result};

// ============================================================================
// MetaValue
// ============================================================================

/// One typed metadata value.
///
/// Equality and hashing treat floats by bit pattern so values can key
/// group-by maps; ordering uses `f64::total_cmp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl MetaValue {
    /// Variant rank used to order values of different types.
    fn rank(&self) -> u8 {
        match self {
            MetaValue::Bool(_) => 0,
            MetaValue::Int(_) => 1,
            MetaValue::Float(_) => 2,
            MetaValue::Text(_) => 3,
        }
    }
}

impl PartialEq for MetaValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MetaValue::Bool(a), MetaValue::Bool(b)) => a == b,
            (MetaValue::Int(a), MetaValue::Int(b)) => a == b,
            (MetaValue::Float(a), MetaValue::Float(b)) => a.to_bits() == b.to_bits(),
            (MetaValue::Text(a), MetaValue::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for MetaValue {}

impl std::hash::Hash for MetaValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            MetaValue::Bool(b) => b.hash(state),
            MetaValue::Int(i) => i.hash(state),
            MetaValue::Float(f) => f.to_bits().hash(state),
            MetaValue::Text(s) => s.hash(state),
        }
    }
}

impl PartialOrd for MetaValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MetaValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self, other) {
            (MetaValue::Bool(a), MetaValue::Bool(b)) => a.cmp(b),
            (MetaValue::Int(a), MetaValue::Int(b)) => a.cmp(b),
            (MetaValue::Float(a), MetaValue::Float(b)) => a.total_cmp(b),
            (MetaValue::Text(a), MetaValue::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Bool(b) => write!(f, "{b}"),
            MetaValue::Int(i) => write!(f, "{i}"),
            MetaValue::Float(x) => write!(f, "{x}"),
            MetaValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self {
        MetaValue::Bool(v)
    }
}

impl From<i64> for MetaValue {
    fn from(v: i64) -> Self {
        MetaValue::Int(v)
    }
}

impl From<f64> for MetaValue {
    fn from(v: f64) -> Self {
        MetaValue::Float(v)
    }
}

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self {
        MetaValue::Text(v.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(v: String) -> Self {
        MetaValue::Text(v)
    }
}

// ============================================================================
// InfoRow
// ============================================================================

/// One recording's metadata row: named fields to typed values.
///
/// Fields are kept sorted by name so serialization and display are
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfoRow {
    fields: BTreeMap<String, MetaValue>,
}

impl InfoRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insertion.
    pub fn with(mut self, name: &str, value: impl Into<MetaValue>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Insert or replace a field.
    pub fn set(&mut self, name: &str, value: impl Into<MetaValue>) {
        self.fields.insert(name.to_string(), value.into());
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&MetaValue> {
        self.fields.get(name)
    }

    /// Whether the row has a field of the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field names in sorted order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ============================================================================
// InfoTable
// ============================================================================

/// Aggregated metadata: one [`InfoRow`] per recording, row order matching
/// dataset order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfoTable {
    rows: Vec<InfoRow>,
}

impl InfoTable {
    /// Build a table from rows in recording order.
    pub fn from_rows(rows: Vec<InfoRow>) -> Self {
        Self { rows }
    }

    /// Number of rows (= number of recordings).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row for recording `k`.
    pub fn row(&self, k: usize) -> Result<&InfoRow> {
        self.rows
            .get(k)
            .ok_or_else(|| DecodingError::recording_index(k, self.rows.len()))
    }

    /// All rows in recording order.
    pub fn rows(&self) -> &[InfoRow] {
        &self.rows
    }

    /// Group recording indices by equality of a named field.
    ///
    /// Returns `(value, recording indices)` pairs sorted by value so split
    /// names come out deterministic. Fails with a configuration error if any
    /// row lacks the field; a partially-present grouping key would silently
    /// drop recordings.
    pub fn group_by(&self, field: &str) -> Result<Vec<(MetaValue, Vec<usize>)>> {
        let mut groups: AHashMap<MetaValue, Vec<usize>> = AHashMap::new();
        for (k, row) in self.rows.iter().enumerate() {
            let value = row
                .get(field)
                .ok_or_else(|| DecodingError::MissingField(field.to_string()))?;
            groups.entry(value.clone()).or_default().push(k);
        }

        let mut out: Vec<(MetaValue, Vec<usize>)> = groups.into_iter().collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        log::debug!(
            "group_by '{}': {} recordings into {} groups",
            field,
            self.rows.len(),
            out.len()
        );
        Ok(out)
    }

    /// Select rows by explicit recording indices, preserving list order.
    pub fn select(&self, indices: &[usize]) -> Result<InfoTable> {
        let mut rows = Vec::with_capacity(indices.len());
        for &k in indices {
            rows.push(self.row(k)?.clone());
        }
        Ok(InfoTable { rows })
    }
}
