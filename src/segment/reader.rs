//! Segment reader.

use std::collections::BTreeMap;
use std::sync::Arc;

use ahash::AHashMap;
use bit_vec::BitVec;
use log::{debug, info};

use crate::codec::Codec;
use crate::codec::doc_values::{DocValue, DocValuesColumn};
use crate::codec::namespace::FormatNamespace;
use crate::codec::postings::{FieldPostings, PostingsFormat};
use crate::error::{FlexCodecError, Result};
use crate::segment::{
    COMPOUND_EXTENSION, DOC_VALUES_CONTAINER, DOC_VALUES_EXTENSION, LIVE_DOCS_EXTENSION,
    NORMS_EXTENSION, POSTINGS_CONTAINER, POSTINGS_EXTENSION, SEGMENT_INFO_EXTENSION,
    STORED_FIELDS_EXTENSION, SegmentInfo, StoredDocument, TERM_VECTORS_EXTENSION, TermVector,
    read_field_payloads, segment_file_name,
};
use crate::storage::Storage;

struct PostingsEntry {
    format: Arc<dyn PostingsFormat>,
    payload: Vec<u8>,
}

/// Read access to a flushed segment.
///
/// Opening a segment loads its metadata and raw per-field payloads and checks every
/// field against the codec. Postings are decoded lazily, doc values eagerly.
pub struct SegmentReader {
    info: SegmentInfo,
    codec: Arc<dyn Codec>,
    postings: AHashMap<String, PostingsEntry>,
    doc_values: AHashMap<String, DocValuesColumn>,
    stored: Vec<StoredDocument>,
    term_vectors: Vec<Vec<TermVector>>,
    norms: BTreeMap<String, Vec<u32>>,
    live_docs: Option<BitVec>,
}

impl std::fmt::Debug for SegmentReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentReader")
            .field("segment", &self.info.name)
            .field("codec", &self.codec.name())
            .field("doc_count", &self.info.doc_count)
            .field("postings_fields", &self.postings.len())
            .field("doc_values_fields", &self.doc_values.len())
            .finish()
    }
}

impl SegmentReader {
    /// Open segment `name` from `storage` with `codec`.
    ///
    /// Fails with [`FlexCodecError::CodecMismatch`] when the segment was written by a
    /// codec of another name, and with [`FlexCodecError::FormatMismatch`] when a field
    /// now resolves to a different format than the one it was written with.
    pub fn open(storage: &dyn Storage, name: &str, codec: Arc<dyn Codec>) -> Result<Self> {
        let si_bytes = storage.read_file(&segment_file_name(name, SEGMENT_INFO_EXTENSION))?;
        let info = codec.segment_info_format().read(&si_bytes)?;
        if info.codec != codec.name() {
            return Err(FlexCodecError::CodecMismatch {
                expected: codec.name().to_string(),
                found: info.codec,
            });
        }

        let mut files = if info.use_compound_file {
            let packed = storage.read_file(&info.file_name(COMPOUND_EXTENSION))?;
            codec
                .compound_format()
                .unpack(&packed)?
                .into_iter()
                .collect::<AHashMap<_, _>>()
        } else {
            let mut files = AHashMap::new();
            for file_name in &info.files {
                if file_name.ends_with(&format!(".{LIVE_DOCS_EXTENSION}")) {
                    continue;
                }
                files.insert(file_name.clone(), storage.read_file(file_name)?);
            }
            files
        };

        let mut postings_payloads = match files.remove(&info.file_name(POSTINGS_EXTENSION)) {
            Some(bytes) => read_field_payloads(POSTINGS_CONTAINER, &bytes)?,
            None => AHashMap::new(),
        };
        let mut doc_values_payloads = match files.remove(&info.file_name(DOC_VALUES_EXTENSION)) {
            Some(bytes) => read_field_payloads(DOC_VALUES_CONTAINER, &bytes)?,
            None => AHashMap::new(),
        };

        let mut postings = AHashMap::new();
        let mut doc_values = AHashMap::new();
        for field in &info.fields {
            if let Some(recorded) = &field.postings_format {
                let format = codec.postings_format_for_field(&field.name)?;
                check_format(&field.name, FormatNamespace::Postings, recorded, format.name())?;
                let payload = postings_payloads.remove(&field.name).ok_or_else(|| {
                    FlexCodecError::corrupt(format!("Missing postings of field '{}'", field.name))
                })?;
                postings.insert(field.name.clone(), PostingsEntry { format, payload });
            }

            if let Some(recorded) = &field.doc_values_format {
                let format = codec.doc_values_format_for_field(&field.name)?;
                check_format(&field.name, FormatNamespace::DocValues, recorded, format.name())?;
                let payload = doc_values_payloads.remove(&field.name).ok_or_else(|| {
                    FlexCodecError::corrupt(format!("Missing doc values of field '{}'", field.name))
                })?;
                doc_values.insert(field.name.clone(), format.decode(&payload)?);
            }
        }

        let stored = match files.remove(&info.file_name(STORED_FIELDS_EXTENSION)) {
            Some(bytes) => codec.stored_fields_format().read(&bytes)?,
            None => {
                return Err(FlexCodecError::corrupt(format!(
                    "Segment '{name}' has no stored fields"
                )));
            }
        };
        let term_vectors = match files.remove(&info.file_name(TERM_VECTORS_EXTENSION)) {
            Some(bytes) => codec.term_vectors_format().read(&bytes)?,
            None => Vec::new(),
        };
        let norms = match files.remove(&info.file_name(NORMS_EXTENSION)) {
            Some(bytes) => codec.norms_format().read(&bytes)?,
            None => BTreeMap::new(),
        };
        let live_docs = if info.has_deletions() {
            let bytes = storage.read_file(&info.file_name(LIVE_DOCS_EXTENSION))?;
            Some(codec.live_docs_format().read(&bytes)?)
        } else {
            None
        };

        if stored.len() as u64 != info.doc_count {
            return Err(FlexCodecError::corrupt(format!(
                "Segment '{name}' declares {} documents but stores {}",
                info.doc_count,
                stored.len()
            )));
        }

        info!(
            "Opened segment '{}' ({} docs, {} fields) with codec '{}'",
            info.name,
            info.doc_count,
            info.fields.len(),
            codec.name()
        );

        Ok(SegmentReader {
            info,
            codec,
            postings,
            doc_values,
            stored,
            term_vectors,
            norms,
            live_docs,
        })
    }

    /// Segment metadata.
    pub fn info(&self) -> &SegmentInfo {
        &self.info
    }

    /// The codec the segment was opened with.
    pub fn codec(&self) -> &Arc<dyn Codec> {
        &self.codec
    }

    /// Names of all fields, in field number order.
    pub fn field_names(&self) -> Vec<&str> {
        self.info.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Decode the postings of `field`.
    pub fn postings(&self, field: &str) -> Result<Option<FieldPostings>> {
        self.postings
            .get(field)
            .map(|entry| {
                debug!("Decoding postings of field '{field}' with '{}'", entry.format.name());
                entry.format.decode(&entry.payload)
            })
            .transpose()
    }

    /// Whether `term` may occur in `field`. Never a false negative.
    pub fn term_might_exist(&self, field: &str, term: &str) -> Result<bool> {
        match self.postings.get(field) {
            Some(entry) => entry.format.term_might_exist(&entry.payload, term),
            None => Ok(false),
        }
    }

    /// The doc-values column of `field`.
    pub fn doc_values(&self, field: &str) -> Option<&DocValuesColumn> {
        self.doc_values.get(field)
    }

    /// The doc value of `field` in `doc_id`.
    pub fn doc_value(&self, field: &str, doc_id: u64) -> Option<DocValue> {
        self.doc_values.get(field).and_then(|column| column.get(doc_id))
    }

    /// Stored fields of `doc_id`.
    pub fn document(&self, doc_id: u64) -> Option<&StoredDocument> {
        self.stored.get(doc_id as usize)
    }

    /// Term vectors of `doc_id`.
    pub fn term_vectors(&self, doc_id: u64) -> Option<&[TermVector]> {
        self.term_vectors.get(doc_id as usize).map(Vec::as_slice)
    }

    /// Per-document lengths of `field`.
    pub fn norms(&self, field: &str) -> Option<&[u32]> {
        self.norms.get(field).map(Vec::as_slice)
    }

    /// Whether `doc_id` exists and is not deleted.
    pub fn is_live(&self, doc_id: u64) -> bool {
        if doc_id >= self.info.doc_count {
            return false;
        }
        match &self.live_docs {
            Some(live) => live.get(doc_id as usize).unwrap_or(false),
            None => true,
        }
    }

    /// Number of live documents.
    pub fn live_count(&self) -> u64 {
        match &self.live_docs {
            Some(live) => live.iter().filter(|live| *live).count() as u64,
            None => self.info.doc_count,
        }
    }
}

fn check_format(
    field: &str,
    namespace: FormatNamespace,
    recorded: &str,
    resolved: &str,
) -> Result<()> {
    if recorded == resolved {
        return Ok(());
    }
    Err(FlexCodecError::FormatMismatch {
        field: field.to_string(),
        namespace,
        recorded: recorded.to_string(),
        resolved: resolved.to_string(),
    })
}
