//! The built-in full-segment codec.
//!
//! [`StandardCodec`] provides every segment responsibility itself. It is the default base
//! delegate of [`PerFieldCodec`](crate::codec::facade::PerFieldCodec), which keeps
//! stored fields, term vectors, norms, segment info, live docs and compound files from it
//! and only replaces postings and doc-values selection.
//!
//! Used standalone it writes every field with the same postings format (`lucene_4_1`)
//! and doc-values format (`lucene_4_10`), whatever the field is called.

use std::sync::Arc;

use crate::codec::doc_values::{ColumnarDocValuesFormat, DocValuesFormat};
use crate::codec::postings::{PostingsFormat, StandardPostingsFormat};
use crate::codec::{
    Codec, CompoundFormat, LiveDocsFormat, NormsFormat, SegmentInfoFormat, StoredFieldsFormat,
    TermVectorsFormat,
};
use crate::error::Result;

pub mod compound;
pub mod live_docs;
pub mod norms;
pub mod segment_info;
pub mod stored_fields;
pub mod term_vectors;

pub use compound::StandardCompoundFormat;
pub use live_docs::StandardLiveDocsFormat;
pub use norms::StandardNormsFormat;
pub use segment_info::JsonSegmentInfoFormat;
pub use stored_fields::StandardStoredFieldsFormat;
pub use term_vectors::StandardTermVectorsFormat;

/// Name recorded in segments written by [`StandardCodec`].
pub const STANDARD_CODEC_NAME: &str = "Flex41";

/// Built-in codec with one postings and one doc-values format for all fields.
#[derive(Debug, Clone)]
pub struct StandardCodec {
    postings: Arc<dyn PostingsFormat>,
    doc_values: Arc<dyn DocValuesFormat>,
    stored_fields: Arc<dyn StoredFieldsFormat>,
    term_vectors: Arc<dyn TermVectorsFormat>,
    norms: Arc<dyn NormsFormat>,
    segment_info: Arc<dyn SegmentInfoFormat>,
    live_docs: Arc<dyn LiveDocsFormat>,
    compound: Arc<dyn CompoundFormat>,
}

impl StandardCodec {
    /// Create the codec with its built-in formats.
    pub fn new() -> Self {
        StandardCodec {
            postings: Arc::new(StandardPostingsFormat::new()),
            doc_values: Arc::new(ColumnarDocValuesFormat::v410()),
            stored_fields: Arc::new(StandardStoredFieldsFormat::new()),
            term_vectors: Arc::new(StandardTermVectorsFormat::new()),
            norms: Arc::new(StandardNormsFormat::new()),
            segment_info: Arc::new(JsonSegmentInfoFormat::new()),
            live_docs: Arc::new(StandardLiveDocsFormat::new()),
            compound: Arc::new(StandardCompoundFormat::new()),
        }
    }
}

impl Default for StandardCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for StandardCodec {
    fn name(&self) -> &str {
        STANDARD_CODEC_NAME
    }

    fn postings_format_for_field(&self, _field: &str) -> Result<Arc<dyn PostingsFormat>> {
        Ok(Arc::clone(&self.postings))
    }

    fn doc_values_format_for_field(&self, _field: &str) -> Result<Arc<dyn DocValuesFormat>> {
        Ok(Arc::clone(&self.doc_values))
    }

    fn stored_fields_format(&self) -> Arc<dyn StoredFieldsFormat> {
        Arc::clone(&self.stored_fields)
    }

    fn term_vectors_format(&self) -> Arc<dyn TermVectorsFormat> {
        Arc::clone(&self.term_vectors)
    }

    fn norms_format(&self) -> Arc<dyn NormsFormat> {
        Arc::clone(&self.norms)
    }

    fn segment_info_format(&self) -> Arc<dyn SegmentInfoFormat> {
        Arc::clone(&self.segment_info)
    }

    fn live_docs_format(&self) -> Arc<dyn LiveDocsFormat> {
        Arc::clone(&self.live_docs)
    }

    fn compound_format(&self) -> Arc<dyn CompoundFormat> {
        Arc::clone(&self.compound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_formats_for_every_field() {
        let codec = StandardCodec::new();
        let a = codec.postings_format_for_field("title").unwrap();
        let b = codec.postings_format_for_field("body<memory>").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.name(), "Standard41");
        assert_eq!(
            codec.doc_values_format_for_field("year").unwrap().name(),
            "Columnar410"
        );
    }

    #[test]
    fn test_segment_formats() {
        let codec = StandardCodec::new();
        assert_eq!(codec.name(), STANDARD_CODEC_NAME);
        assert_eq!(codec.stored_fields_format().name(), "StoredFields41");
        assert_eq!(codec.term_vectors_format().name(), "TermVectors41");
        assert_eq!(codec.norms_format().name(), "Norms41");
        assert_eq!(codec.segment_info_format().name(), "JsonSegmentInfo");
        assert_eq!(codec.live_docs_format().name(), "LiveDocs41");
        assert_eq!(codec.compound_format().name(), "Compound41");
    }
}
