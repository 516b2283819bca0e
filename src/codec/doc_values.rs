//! Doc-values data model and the doc-values strategy capability.
//!
//! DocValues are column-oriented storage for field values, optimized for:
//! - Sorting search results by field values
//! - Faceting and aggregations
//! - Field-based scoring
//!
//! A column holds one optional value per document id. Every value of a column has the
//! same [`DocValuesType`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FlexCodecError, Result};

pub mod columnar;
pub mod direct;
pub mod memory;

pub use columnar::{ColumnarDocValuesFormat, ColumnarVersion};
pub use direct::DirectDocValuesFormat;
pub use memory::MemoryDocValuesFormat;

/// The kind of values a column stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocValuesType {
    /// A per-document i64.
    Numeric,
    /// A per-document byte string.
    Binary,
    /// A per-document string drawn from a sorted dictionary.
    Sorted,
}

impl DocValuesType {
    /// Stable single-byte code used by binary layouts.
    pub fn code(self) -> u8 {
        match self {
            DocValuesType::Numeric => 0,
            DocValuesType::Binary => 1,
            DocValuesType::Sorted => 2,
        }
    }

    /// Inverse of [`DocValuesType::code`].
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(DocValuesType::Numeric),
            1 => Ok(DocValuesType::Binary),
            2 => Ok(DocValuesType::Sorted),
            other => Err(FlexCodecError::corrupt(format!(
                "Unknown doc values type code {other}"
            ))),
        }
    }
}

impl fmt::Display for DocValuesType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocValuesType::Numeric => "numeric",
            DocValuesType::Binary => "binary",
            DocValuesType::Sorted => "sorted",
        };
        f.write_str(name)
    }
}

/// A single document value, as supplied by the segment writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocValue {
    Numeric(i64),
    Binary(Vec<u8>),
    Sorted(String),
}

impl DocValue {
    /// The column type this value belongs to.
    pub fn doc_values_type(&self) -> DocValuesType {
        match self {
            DocValue::Numeric(_) => DocValuesType::Numeric,
            DocValue::Binary(_) => DocValuesType::Binary,
            DocValue::Sorted(_) => DocValuesType::Sorted,
        }
    }
}

/// One field's values, indexed by document id. `None` marks a document without a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocValuesColumn {
    Numeric(Vec<Option<i64>>),
    Binary(Vec<Option<Vec<u8>>>),
    Sorted(Vec<Option<String>>),
}

impl DocValuesColumn {
    /// An empty column of `kind`.
    pub fn new(kind: DocValuesType) -> Self {
        match kind {
            DocValuesType::Numeric => DocValuesColumn::Numeric(Vec::new()),
            DocValuesType::Binary => DocValuesColumn::Binary(Vec::new()),
            DocValuesType::Sorted => DocValuesColumn::Sorted(Vec::new()),
        }
    }

    /// The type of values in this column.
    pub fn doc_values_type(&self) -> DocValuesType {
        match self {
            DocValuesColumn::Numeric(_) => DocValuesType::Numeric,
            DocValuesColumn::Binary(_) => DocValuesType::Binary,
            DocValuesColumn::Sorted(_) => DocValuesType::Sorted,
        }
    }

    /// Number of document slots (documents without a value included).
    pub fn len(&self) -> usize {
        match self {
            DocValuesColumn::Numeric(values) => values.len(),
            DocValuesColumn::Binary(values) => values.len(),
            DocValuesColumn::Sorted(values) => values.len(),
        }
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Set the value of `doc_id`, growing the column as needed.
    pub fn set(&mut self, doc_id: u64, value: DocValue) -> Result<()> {
        let doc = doc_id as usize;
        match (self, value) {
            (DocValuesColumn::Numeric(values), DocValue::Numeric(v)) => put(values, doc, v),
            (DocValuesColumn::Binary(values), DocValue::Binary(v)) => put(values, doc, v),
            (DocValuesColumn::Sorted(values), DocValue::Sorted(v)) => put(values, doc, v),
            (column, value) => {
                return Err(FlexCodecError::field(format!(
                    "Cannot store a {} value in a {} doc values column",
                    value.doc_values_type(),
                    column.doc_values_type()
                )));
            }
        }
        Ok(())
    }

    /// Grow the column with empty slots up to `len` documents.
    pub fn pad_to(&mut self, len: usize) {
        match self {
            DocValuesColumn::Numeric(values) => pad(values, len),
            DocValuesColumn::Binary(values) => pad(values, len),
            DocValuesColumn::Sorted(values) => pad(values, len),
        }
    }

    /// The value of `doc_id`, if any.
    pub fn get(&self, doc_id: u64) -> Option<DocValue> {
        let doc = doc_id as usize;
        match self {
            DocValuesColumn::Numeric(values) => {
                values.get(doc).copied().flatten().map(DocValue::Numeric)
            }
            DocValuesColumn::Binary(values) => {
                values.get(doc).cloned().flatten().map(DocValue::Binary)
            }
            DocValuesColumn::Sorted(values) => {
                values.get(doc).cloned().flatten().map(DocValue::Sorted)
            }
        }
    }

    /// Which documents have a value.
    pub fn presence(&self) -> Vec<bool> {
        match self {
            DocValuesColumn::Numeric(values) => values.iter().map(Option::is_some).collect(),
            DocValuesColumn::Binary(values) => values.iter().map(Option::is_some).collect(),
            DocValuesColumn::Sorted(values) => values.iter().map(Option::is_some).collect(),
        }
    }
}

fn put<T>(values: &mut Vec<Option<T>>, doc: usize, value: T) {
    pad(values, doc + 1);
    values[doc] = Some(value);
}

fn pad<T>(values: &mut Vec<Option<T>>, len: usize) {
    if values.len() < len {
        values.resize_with(len, || None);
    }
}

/// Strategy capability for the doc-values namespace.
///
/// Implementations must be safe to share between fields, segments and threads.
pub trait DocValuesFormat: Send + Sync + fmt::Debug {
    /// Stable name written into payload headers and segment metadata.
    fn name(&self) -> &str;

    /// Encode one field's column.
    fn encode(&self, field: &str, column: &DocValuesColumn) -> Result<Vec<u8>>;

    /// Decode a payload produced by [`DocValuesFormat::encode`].
    fn decode(&self, bytes: &[u8]) -> Result<DocValuesColumn>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn numeric_column() -> DocValuesColumn {
        DocValuesColumn::Numeric(vec![Some(2023), None, Some(2024), Some(-5), Some(2023)])
    }

    pub fn binary_column() -> DocValuesColumn {
        DocValuesColumn::Binary(vec![Some(b"abc".to_vec()), Some(Vec::new()), None])
    }

    pub fn sorted_column() -> DocValuesColumn {
        DocValuesColumn::Sorted(vec![
            Some("red".to_string()),
            Some("blue".to_string()),
            None,
            Some("red".to_string()),
        ])
    }

    pub fn all_columns() -> Vec<DocValuesColumn> {
        vec![
            numeric_column(),
            binary_column(),
            sorted_column(),
            DocValuesColumn::Numeric(Vec::new()),
            DocValuesColumn::Sorted(vec![None, None]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut column = DocValuesColumn::new(DocValuesType::Numeric);
        column.set(0, DocValue::Numeric(100)).unwrap();
        column.set(5, DocValue::Numeric(7)).unwrap();

        assert_eq!(column.len(), 6);
        assert_eq!(column.get(0), Some(DocValue::Numeric(100)));
        assert_eq!(column.get(2), None);
        assert_eq!(column.get(5), Some(DocValue::Numeric(7)));
        assert_eq!(column.get(99), None);
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let mut column = DocValuesColumn::new(DocValuesType::Sorted);
        assert!(column.set(0, DocValue::Numeric(1)).is_err());
    }

    #[test]
    fn test_pad_to() {
        let mut column = DocValuesColumn::new(DocValuesType::Binary);
        column.set(1, DocValue::Binary(vec![1])).unwrap();
        column.pad_to(4);
        assert_eq!(column.presence(), vec![false, true, false, false]);
    }

    #[test]
    fn test_type_codes() {
        for kind in [
            DocValuesType::Numeric,
            DocValuesType::Binary,
            DocValuesType::Sorted,
        ] {
            assert_eq!(DocValuesType::from_code(kind.code()).unwrap(), kind);
        }
        assert!(DocValuesType::from_code(9).is_err());
    }
}
