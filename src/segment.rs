//! Segment writer and reader.
//!
//! The writer buffers documents in memory and, on flush, asks the codec for the format
//! of every field, encodes each field with it and records the format name in the
//! field's [`FieldInfo`]. The reader performs the same resolution from the field name
//! and refuses to decode a field whose recorded format differs from the resolved one.
//!
//! Files of segment `_0`:
//!
//! | file      | content                                  |
//! |-----------|------------------------------------------|
//! | `_0.pst`  | per-field postings payloads              |
//! | `_0.dvd`  | per-field doc-values payloads            |
//! | `_0.fdt`  | stored fields                            |
//! | `_0.tvd`  | term vectors (if any field records them) |
//! | `_0.nvd`  | norms (if any field records them)        |
//! | `_0.liv`  | live docs (only with deletions)          |
//! | `_0.cfs`  | compound file replacing the data files   |
//! | `_0.si`   | segment info, written last               |

use ahash::AHashMap;

use crate::codec::codec_util::{check_header, write_header};
use crate::error::Result;
use crate::storage::structured::{StructReader, StructWriter};

pub mod document;
pub mod info;
pub mod reader;
pub mod writer;

pub use document::{
    FieldOptions, FieldValue, IndexableField, SegmentDocument, StoredDocument, TermVector,
};
pub use info::{FieldInfo, SegmentInfo};
pub use reader::SegmentReader;
pub use writer::{SegmentWriter, SegmentWriterConfig};

/// Per-field postings payloads.
pub const POSTINGS_EXTENSION: &str = "pst";
/// Per-field doc-values payloads.
pub const DOC_VALUES_EXTENSION: &str = "dvd";
/// Stored fields.
pub const STORED_FIELDS_EXTENSION: &str = "fdt";
/// Term vectors.
pub const TERM_VECTORS_EXTENSION: &str = "tvd";
/// Norms.
pub const NORMS_EXTENSION: &str = "nvd";
/// Live documents.
pub const LIVE_DOCS_EXTENSION: &str = "liv";
/// Compound file.
pub const COMPOUND_EXTENSION: &str = "cfs";
/// Segment info.
pub const SEGMENT_INFO_EXTENSION: &str = "si";

const POSTINGS_CONTAINER: &str = "FieldPostings";
const DOC_VALUES_CONTAINER: &str = "FieldDocValues";
const CONTAINER_VERSION: u32 = 1;

/// `<segment>.<extension>`
pub fn segment_file_name(segment: &str, extension: &str) -> String {
    format!("{segment}.{extension}")
}

/// Pack `(field, payload)` pairs into one file.
pub(crate) fn write_field_payloads(
    container: &str,
    payloads: &[(String, Vec<u8>)],
) -> Result<Vec<u8>> {
    let mut writer = StructWriter::new(Vec::new());
    write_header(&mut writer, container, CONTAINER_VERSION)?;
    writer.write_varint(payloads.len() as u64)?;
    for (field, payload) in payloads {
        writer.write_string(field)?;
        writer.write_bytes(payload)?;
    }
    writer.finish()
}

/// Inverse of [`write_field_payloads`].
pub(crate) fn read_field_payloads(
    container: &str,
    bytes: &[u8],
) -> Result<AHashMap<String, Vec<u8>>> {
    let mut reader = StructReader::new(bytes);
    check_header(&mut reader, container, CONTAINER_VERSION, CONTAINER_VERSION)?;
    let count = reader.read_len(bytes.len())?;
    let mut payloads = AHashMap::with_capacity(count);
    for _ in 0..count {
        let field = reader.read_string()?;
        let payload = reader.read_bytes()?;
        payloads.insert(field, payload);
    }
    reader.verify_checksum()?;
    Ok(payloads)
}
