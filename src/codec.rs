//! Codec surface and field-scoped format dispatch.
//!
//! A [`Codec`] supplies every on-disk format a segment needs. Most of them are per
//! segment (stored fields, term vectors, norms, segment info, live docs, compound files);
//! postings and doc values are asked for per field.
//!
//! [`PerFieldCodec`] wraps a base codec and answers the two per-field questions from the
//! field name itself:
//!
//! - `<tag>` selects the postings strategy, e.g. `id<pulsing_4_1>`
//! - `[tag]` selects the doc-values strategy, e.g. `price[lucene_4_10]`
//!
//! Both may appear in one name (`body<bloom_4_1>[memory]`) and are resolved independently.
//!
//! # Example
//!
//! ```
//! use flexcodec::codec::{Codec, PerFieldCodec};
//!
//! # fn main() -> flexcodec::error::Result<()> {
//! let codec = PerFieldCodec::new()?;
//! let postings = codec.postings_format_for_field("body<bloom_4_1>[memory]")?;
//! let doc_values = codec.doc_values_format_for_field("body<bloom_4_1>[memory]")?;
//! assert_eq!(postings.name(), "BloomFilter41");
//! assert_eq!(doc_values.name(), "MemoryDocValues");
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use bit_vec::BitVec;

use crate::error::Result;
use crate::segment::{SegmentInfo, StoredDocument, TermVector};

pub mod catalog;
pub mod codec_util;
pub mod dispatch;
pub mod doc_values;
pub mod facade;
pub mod namespace;
pub mod postings;
pub mod registry;
pub mod standard;
pub mod tag;

pub use dispatch::{PerFieldDispatcher, PerFieldDocValuesDispatcher, PerFieldPostingsDispatcher};
pub use doc_values::DocValuesFormat;
pub use facade::{PerFieldCodec, PerFieldCodecBuilder};
pub use namespace::FormatNamespace;
pub use postings::PostingsFormat;
pub use registry::{FormatRegistry, FormatRegistryBuilder};
pub use standard::StandardCodec;
pub use tag::{FieldTagResolver, StrategyTag};

/// Everything a segment writer and reader need to persist a segment.
pub trait Codec: Send + Sync + Debug {
    /// Name recorded in the segment info of segments written with this codec.
    fn name(&self) -> &str;

    /// Postings format for `field`.
    fn postings_format_for_field(&self, field: &str) -> Result<Arc<dyn PostingsFormat>>;

    /// Doc-values format for `field`.
    fn doc_values_format_for_field(&self, field: &str) -> Result<Arc<dyn DocValuesFormat>>;

    fn stored_fields_format(&self) -> Arc<dyn StoredFieldsFormat>;

    fn term_vectors_format(&self) -> Arc<dyn TermVectorsFormat>;

    fn norms_format(&self) -> Arc<dyn NormsFormat>;

    fn segment_info_format(&self) -> Arc<dyn SegmentInfoFormat>;

    fn live_docs_format(&self) -> Arc<dyn LiveDocsFormat>;

    fn compound_format(&self) -> Arc<dyn CompoundFormat>;
}

/// Row-oriented stored values, one entry per document.
pub trait StoredFieldsFormat: Send + Sync + Debug {
    fn name(&self) -> &str;
    fn write(&self, documents: &[StoredDocument]) -> Result<Vec<u8>>;
    fn read(&self, bytes: &[u8]) -> Result<Vec<StoredDocument>>;
}

/// Per-document term vectors, one entry per document.
pub trait TermVectorsFormat: Send + Sync + Debug {
    fn name(&self) -> &str;
    fn write(&self, documents: &[Vec<TermVector>]) -> Result<Vec<u8>>;
    fn read(&self, bytes: &[u8]) -> Result<Vec<Vec<TermVector>>>;
}

/// Field length norms: field name to per-document token counts.
pub trait NormsFormat: Send + Sync + Debug {
    fn name(&self) -> &str;
    fn write(&self, norms: &BTreeMap<String, Vec<u32>>) -> Result<Vec<u8>>;
    fn read(&self, bytes: &[u8]) -> Result<BTreeMap<String, Vec<u32>>>;
}

/// Segment metadata.
pub trait SegmentInfoFormat: Send + Sync + Debug {
    fn name(&self) -> &str;
    fn write(&self, info: &SegmentInfo) -> Result<Vec<u8>>;
    fn read(&self, bytes: &[u8]) -> Result<SegmentInfo>;
}

/// Deletions, as a bitset of live documents.
pub trait LiveDocsFormat: Send + Sync + Debug {
    fn name(&self) -> &str;
    fn write(&self, live_docs: &BitVec) -> Result<Vec<u8>>;
    fn read(&self, bytes: &[u8]) -> Result<BitVec>;
}

/// Container packing several named files into one.
pub trait CompoundFormat: Send + Sync + Debug {
    fn name(&self) -> &str;
    fn pack(&self, entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>>;
    fn unpack(&self, bytes: &[u8]) -> Result<Vec<(String, Vec<u8>)>>;
}
