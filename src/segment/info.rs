//! Segment and per-field metadata persisted in `<segment>.si`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec::doc_values::DocValuesType;

/// What the writer recorded about one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    /// Field identifier, including any embedded tags.
    pub name: String,

    /// Dense field number within the segment.
    pub number: u32,

    /// Name of the postings format the field was encoded with, if indexed.
    pub postings_format: Option<String>,

    /// Name of the doc-values format the field was encoded with, if it has doc values.
    pub doc_values_format: Option<String>,

    /// Type of the doc-values column.
    pub doc_values_type: Option<DocValuesType>,

    /// Whether positions were recorded.
    pub has_positions: bool,

    /// Whether norms were recorded.
    pub has_norms: bool,

    /// Whether term vectors were recorded.
    pub has_term_vectors: bool,

    /// Whether values were stored.
    pub stored: bool,
}

impl FieldInfo {
    pub fn new<S: Into<String>>(name: S, number: u32) -> Self {
        FieldInfo {
            name: name.into(),
            number,
            postings_format: None,
            doc_values_format: None,
            doc_values_type: None,
            has_positions: false,
            has_norms: false,
            has_term_vectors: false,
            stored: false,
        }
    }

    /// Whether the field has postings.
    pub fn is_indexed(&self) -> bool {
        self.postings_format.is_some()
    }

    /// Whether the field has a doc-values column.
    pub fn has_doc_values(&self) -> bool {
        self.doc_values_format.is_some()
    }
}

/// Information about a flushed segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentInfo {
    /// Segment name, used as the file name prefix.
    pub name: String,

    /// Unique segment id.
    pub id: Uuid,

    /// Number of documents in this segment, deleted ones included.
    pub doc_count: u64,

    /// Name of the codec that wrote the segment.
    pub codec: String,

    /// Files belonging to the segment, `.si` excluded.
    pub files: Vec<String>,

    /// Whether the segment's data files are packed into a compound file.
    pub use_compound_file: bool,

    /// Number of deleted documents.
    pub deleted_count: u64,

    /// When the segment was flushed.
    pub created_at: DateTime<Utc>,

    /// Per-field metadata, in field-number order.
    pub fields: Vec<FieldInfo>,

    /// Free-form diagnostics (library version, OS, ...).
    #[serde(default)]
    pub diagnostics: BTreeMap<String, String>,
}

impl SegmentInfo {
    /// Create an empty segment description.
    pub fn new<S: Into<String>, C: Into<String>>(name: S, codec: C) -> Self {
        SegmentInfo {
            name: name.into(),
            id: Uuid::new_v4(),
            doc_count: 0,
            codec: codec.into(),
            files: Vec::new(),
            use_compound_file: false,
            deleted_count: 0,
            created_at: Utc::now(),
            fields: Vec::new(),
            diagnostics: BTreeMap::new(),
        }
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Whether any document is deleted.
    pub fn has_deletions(&self) -> bool {
        self.deleted_count > 0
    }

    /// Number of live documents.
    pub fn live_count(&self) -> u64 {
        self.doc_count.saturating_sub(self.deleted_count)
    }

    /// File name of `extension` for this segment.
    pub fn file_name(&self, extension: &str) -> String {
        super::segment_file_name(&self.name, extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_info_json() {
        let mut info = SegmentInfo::new("_0", "PerField41");
        info.doc_count = 3;
        info.deleted_count = 1;
        let mut field = FieldInfo::new("title<lucene_4_1>", 0);
        field.postings_format = Some("Standard41".to_string());
        info.fields.push(field);

        let json = serde_json::to_string(&info).unwrap();
        let back: SegmentInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
        assert!(back.has_deletions());
        assert_eq!(back.live_count(), 2);
        assert!(back.field("title<lucene_4_1>").unwrap().is_indexed());
        assert_eq!(back.file_name("pst"), "_0.pst");
    }
}
