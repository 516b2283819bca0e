//! Documents as handed to the segment writer and as read back from stored fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::codec::doc_values::{DocValue, DocValuesType};
use crate::error::{FlexCodecError, Result};

/// A field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Binary(Vec<u8>),
}

impl FieldValue {
    /// Get the value as text, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Get the value as an integer, if it is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Convert to a doc value of `kind`.
    pub fn to_doc_value(&self, field: &str, kind: DocValuesType) -> Result<DocValue> {
        match (kind, self) {
            (DocValuesType::Numeric, FieldValue::Integer(v)) => Ok(DocValue::Numeric(*v)),
            (DocValuesType::Binary, FieldValue::Binary(v)) => Ok(DocValue::Binary(v.clone())),
            (DocValuesType::Binary, FieldValue::Text(v)) => {
                Ok(DocValue::Binary(v.as_bytes().to_vec()))
            }
            (DocValuesType::Sorted, FieldValue::Text(v)) => Ok(DocValue::Sorted(v.clone())),
            (DocValuesType::Sorted, FieldValue::Integer(v)) => Ok(DocValue::Sorted(v.to_string())),
            _ => Err(FlexCodecError::field(format!(
                "Field '{field}' cannot provide {kind} doc values from {self:?}"
            ))),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        FieldValue::Binary(value)
    }
}

/// How a field is indexed and stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldOptions {
    /// Produce postings.
    pub indexed: bool,
    /// Split text into words before indexing.
    pub tokenized: bool,
    /// Record term positions in postings.
    pub positions: bool,
    /// Keep the original value in stored fields.
    pub stored: bool,
    /// Record per-document term vectors.
    pub term_vectors: bool,
    /// Record field length norms.
    pub norms: bool,
    /// Produce a doc-values column of this type.
    pub doc_values: Option<DocValuesType>,
}

/// One field instance of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexableField {
    pub name: String,
    pub value: FieldValue,
    pub options: FieldOptions,
}

impl IndexableField {
    /// A field with explicit options.
    pub fn new<S: Into<String>>(name: S, value: FieldValue, options: FieldOptions) -> Self {
        IndexableField {
            name: name.into(),
            value,
            options,
        }
    }

    /// Tokenized full text: indexed with positions, stored, with norms.
    pub fn text<S: Into<String>, V: Into<String>>(name: S, value: V) -> Self {
        Self::new(
            name,
            FieldValue::Text(value.into()),
            FieldOptions {
                indexed: true,
                tokenized: true,
                positions: true,
                stored: true,
                norms: true,
                ..FieldOptions::default()
            },
        )
    }

    /// An exact-match term, indexed as a single token and stored.
    pub fn keyword<S: Into<String>, V: Into<String>>(name: S, value: V) -> Self {
        Self::new(
            name,
            FieldValue::Text(value.into()),
            FieldOptions {
                indexed: true,
                stored: true,
                ..FieldOptions::default()
            },
        )
    }

    /// A numeric doc value.
    pub fn numeric<S: Into<String>>(name: S, value: i64) -> Self {
        Self::new(
            name,
            FieldValue::Integer(value),
            FieldOptions {
                doc_values: Some(DocValuesType::Numeric),
                ..FieldOptions::default()
            },
        )
    }

    /// A binary doc value.
    pub fn binary<S: Into<String>>(name: S, value: Vec<u8>) -> Self {
        Self::new(
            name,
            FieldValue::Binary(value),
            FieldOptions {
                doc_values: Some(DocValuesType::Binary),
                ..FieldOptions::default()
            },
        )
    }

    /// A sorted (dictionary encoded) doc value.
    pub fn sorted<S: Into<String>, V: Into<String>>(name: S, value: V) -> Self {
        Self::new(
            name,
            FieldValue::Text(value.into()),
            FieldOptions {
                doc_values: Some(DocValuesType::Sorted),
                ..FieldOptions::default()
            },
        )
    }

    /// A stored-only value.
    pub fn stored<S: Into<String>, V: Into<FieldValue>>(name: S, value: V) -> Self {
        Self::new(
            name,
            value.into(),
            FieldOptions {
                stored: true,
                ..FieldOptions::default()
            },
        )
    }

    /// Additionally produce doc values of `kind`.
    pub fn with_doc_values(mut self, kind: DocValuesType) -> Self {
        self.options.doc_values = Some(kind);
        self
    }

    /// Additionally record term vectors.
    pub fn with_term_vectors(mut self) -> Self {
        self.options.term_vectors = true;
        self
    }

    /// Index the field as postings (single term unless tokenized).
    pub fn indexed(mut self) -> Self {
        self.options.indexed = true;
        self
    }

    /// The terms this field contributes, with their positions.
    pub fn terms(&self) -> Vec<(String, u32)> {
        let text = match &self.value {
            FieldValue::Text(text) => text.clone(),
            FieldValue::Integer(value) => value.to_string(),
            FieldValue::Binary(_) => return Vec::new(),
        };

        if self.options.tokenized {
            tokenize(&text)
        } else {
            vec![(text, 0)]
        }
    }
}

/// Split text on Unicode word boundaries and lowercase each word.
pub fn tokenize(text: &str) -> Vec<(String, u32)> {
    text.unicode_words()
        .enumerate()
        .map(|(position, word)| (word.to_lowercase(), position as u32))
        .collect()
}

/// A document to be written into a segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentDocument {
    fields: Vec<IndexableField>,
}

impl SegmentDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field.
    pub fn add_field(mut self, field: IndexableField) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a field in place.
    pub fn push(&mut self, field: IndexableField) {
        self.fields.push(field);
    }

    /// The fields in insertion order.
    pub fn fields(&self) -> &[IndexableField] {
        &self.fields
    }

    /// Whether the document has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// The stored values of one document, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub fields: Vec<(String, FieldValue)>,
}

impl StoredDocument {
    /// First value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// All values stored under `name`.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FieldValue> + 'a {
        self.fields
            .iter()
            .filter(move |(field, _)| field == name)
            .map(|(_, value)| value)
    }
}

/// Per-document term vector of one field: term to positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermVector {
    pub field: String,
    pub terms: BTreeMap<String, Vec<u32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        let tokens = tokenize("Hello, World! Hello again.");
        assert_eq!(
            tokens,
            vec![
                ("hello".to_string(), 0),
                ("world".to_string(), 1),
                ("hello".to_string(), 2),
                ("again".to_string(), 3),
            ]
        );
    }

    #[test]
    fn test_keyword_is_single_term() {
        let field = IndexableField::keyword("id<pulsing_4_1>", "Doc 1");
        assert_eq!(field.terms(), vec![("Doc 1".to_string(), 0)]);
    }

    #[test]
    fn test_doc_value_conversion() {
        let numeric = FieldValue::Integer(7);
        assert_eq!(
            numeric.to_doc_value("n", DocValuesType::Numeric).unwrap(),
            DocValue::Numeric(7)
        );
        assert!(numeric.to_doc_value("n", DocValuesType::Binary).is_err());

        let text = FieldValue::from("red");
        assert_eq!(
            text.to_doc_value("c", DocValuesType::Sorted).unwrap(),
            DocValue::Sorted("red".to_string())
        );
    }

    #[test]
    fn test_stored_document_lookup() {
        let doc = StoredDocument {
            fields: vec![
                ("tag".to_string(), FieldValue::from("a")),
                ("year".to_string(), FieldValue::from(2024)),
                ("tag".to_string(), FieldValue::from("b")),
            ],
        };
        assert_eq!(doc.get("year").and_then(FieldValue::as_integer), Some(2024));
        assert_eq!(doc.get_all("tag").count(), 2);
        assert!(doc.get("missing").is_none());
    }
}
