//! Segment writer.

use std::collections::BTreeMap;
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use bit_vec::BitVec;
use log::{debug, info, warn};

use crate::codec::Codec;
use crate::codec::doc_values::{DocValue, DocValuesColumn};
use crate::codec::postings::{FieldPostings, Posting};
use crate::error::{FlexCodecError, Result};
use crate::segment::{
    COMPOUND_EXTENSION, DOC_VALUES_CONTAINER, DOC_VALUES_EXTENSION, FieldInfo, LIVE_DOCS_EXTENSION,
    NORMS_EXTENSION, POSTINGS_CONTAINER, POSTINGS_EXTENSION, SEGMENT_INFO_EXTENSION,
    STORED_FIELDS_EXTENSION, SegmentDocument, SegmentInfo, StoredDocument,
    TERM_VECTORS_EXTENSION, TermVector, segment_file_name, write_field_payloads,
};
use crate::storage::Storage;

/// Segment writer configuration.
#[derive(Debug, Clone, Default)]
pub struct SegmentWriterConfig {
    /// Pack the data files into a single `.cfs` file.
    pub use_compound_file: bool,

    /// Extra diagnostics recorded in the segment info.
    pub diagnostics: BTreeMap<String, String>,
}

/// Statistics about the writing process.
#[derive(Debug, Clone, Default)]
pub struct WriterStats {
    /// Number of documents added.
    pub docs_added: u64,
    /// Number of documents marked deleted.
    pub docs_deleted: u64,
    /// Total postings created.
    pub total_postings: u64,
}

/// Buffers documents and writes them as one segment.
pub struct SegmentWriter {
    storage: Arc<dyn Storage>,
    codec: Arc<dyn Codec>,
    config: SegmentWriterConfig,
    name: String,

    fields: Vec<FieldInfo>,
    field_numbers: AHashMap<String, usize>,
    postings: AHashMap<String, FieldPostings>,
    doc_values: AHashMap<String, DocValuesColumn>,
    norms: BTreeMap<String, Vec<u32>>,
    stored: Vec<StoredDocument>,
    term_vectors: Vec<Vec<TermVector>>,
    deleted: Vec<bool>,

    stats: WriterStats,
}

impl std::fmt::Debug for SegmentWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentWriter")
            .field("name", &self.name)
            .field("codec", &self.codec.name())
            .field("config", &self.config)
            .field("fields", &self.fields.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl SegmentWriter {
    /// Create a writer for segment `name`.
    pub fn new<S: Into<String>>(
        storage: Arc<dyn Storage>,
        codec: Arc<dyn Codec>,
        name: S,
        config: SegmentWriterConfig,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.contains(['/', '\\', '.']) {
            return Err(FlexCodecError::invalid_config(format!(
                "Invalid segment name '{name}'"
            )));
        }
        if storage.file_exists(&segment_file_name(&name, SEGMENT_INFO_EXTENSION)) {
            return Err(FlexCodecError::storage(format!(
                "Segment '{name}' already exists"
            )));
        }

        Ok(SegmentWriter {
            storage,
            codec,
            config,
            name,
            fields: Vec::new(),
            field_numbers: AHashMap::new(),
            postings: AHashMap::new(),
            doc_values: AHashMap::new(),
            norms: BTreeMap::new(),
            stored: Vec::new(),
            term_vectors: Vec::new(),
            deleted: Vec::new(),
            stats: WriterStats::default(),
        })
    }

    /// Segment name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of buffered documents.
    pub fn doc_count(&self) -> u64 {
        self.stored.len() as u64
    }

    /// Writer statistics.
    pub fn stats(&self) -> &WriterStats {
        &self.stats
    }

    /// Add a document and return its id within the segment.
    pub fn add_document(&mut self, doc: SegmentDocument) -> Result<u64> {
        let doc_id = self.doc_count();

        // Convert doc values up front so a bad field leaves the buffers untouched.
        let mut doc_values: Vec<(&str, DocValue)> = Vec::new();
        for field in doc.fields() {
            let Some(kind) = field.options.doc_values else {
                continue;
            };
            let value = field.value.to_doc_value(&field.name, kind)?;
            if let Some(known) = self
                .doc_values
                .get(&field.name)
                .map(DocValuesColumn::doc_values_type)
                .filter(|known| *known != kind)
            {
                return Err(FlexCodecError::field(format!(
                    "Field '{}' mixes {kind} doc values with {known}",
                    field.name
                )));
            }
            if doc_values.iter().any(|(name, _)| *name == field.name) {
                return Err(FlexCodecError::field(format!(
                    "Field '{}' has more than one doc value in document {doc_id}",
                    field.name
                )));
            }
            doc_values.push((field.name.as_str(), value));
        }

        let mut stored = StoredDocument::default();
        let mut vectors: BTreeMap<String, TermVector> = BTreeMap::new();
        let mut lengths: BTreeMap<&str, u32> = BTreeMap::new();
        let mut touched: AHashSet<&str> = AHashSet::new();

        for field in doc.fields() {
            let options = field.options;
            let number = self.field_number(&field.name);
            let info = &mut self.fields[number];
            info.stored |= options.stored;
            info.has_norms |= options.norms && options.indexed;
            info.has_term_vectors |= options.term_vectors && options.indexed;
            info.has_positions |= options.positions && options.indexed;
            if let Some(kind) = options.doc_values {
                info.doc_values_type = Some(kind);
            }
            if options.stored {
                stored.fields.push((field.name.clone(), field.value.clone()));
            }

            if options.indexed {
                let terms = field.terms();
                if options.norms {
                    *lengths.entry(field.name.as_str()).or_default() += terms.len() as u32;
                }
                if terms.is_empty() {
                    continue;
                }

                let postings = self.postings.entry(field.name.clone()).or_default();
                if touched.insert(field.name.as_str()) {
                    postings.doc_count += 1;
                }

                for (term, position) in terms {
                    if options.term_vectors {
                        vectors
                            .entry(field.name.clone())
                            .or_insert_with(|| TermVector {
                                field: field.name.clone(),
                                ..TermVector::default()
                            })
                            .terms
                            .entry(term.clone())
                            .or_default()
                            .push(position);
                    }

                    let posting = if options.positions {
                        Posting::with_positions(doc_id, vec![position])
                    } else {
                        Posting::new(doc_id)
                    };
                    postings.add_posting(term, posting);
                    self.stats.total_postings += 1;
                }
            }
        }

        for (name, value) in doc_values {
            let column = self
                .doc_values
                .entry(name.to_string())
                .or_insert_with(|| DocValuesColumn::new(value.doc_values_type()));
            column.set(doc_id, value)?;
        }

        for (name, length) in lengths {
            let norms = self.norms.entry(name.to_string()).or_default();
            norms.resize(doc_id as usize, 0);
            norms.push(length);
        }

        self.stored.push(stored);
        self.term_vectors.push(vectors.into_values().collect());
        self.deleted.push(false);
        self.stats.docs_added += 1;

        debug!("Buffered document {doc_id} in segment '{}'", self.name);
        Ok(doc_id)
    }

    /// Mark a buffered document deleted.
    pub fn delete_document(&mut self, doc_id: u64) -> Result<()> {
        let slot = self.deleted.get_mut(doc_id as usize).ok_or_else(|| {
            FlexCodecError::field(format!(
                "Document {doc_id} does not exist in segment '{}'",
                self.name
            ))
        })?;
        if !*slot {
            *slot = true;
            self.stats.docs_deleted += 1;
        }
        Ok(())
    }

    fn field_number(&mut self, name: &str) -> usize {
        if let Some(&number) = self.field_numbers.get(name) {
            return number;
        }
        let number = self.fields.len();
        self.fields.push(FieldInfo::new(name, number as u32));
        self.field_numbers.insert(name.to_string(), number);
        number
    }

    /// Encode every buffered field and write the segment.
    pub fn flush(mut self) -> Result<SegmentInfo> {
        let doc_count = self.doc_count();
        let mut info = SegmentInfo::new(self.name.clone(), self.codec.name());
        info.doc_count = doc_count;
        info.use_compound_file = self.config.use_compound_file;
        info.deleted_count = self.stats.docs_deleted;
        info.diagnostics = self.config.diagnostics.clone();
        info.diagnostics
            .insert("flexcodec.version".to_string(), crate::VERSION.to_string());
        info.diagnostics
            .insert("os".to_string(), std::env::consts::OS.to_string());

        let mut files: Vec<(String, Vec<u8>)> = Vec::new();

        let mut postings_payloads = Vec::new();
        let mut doc_values_payloads = Vec::new();
        for field in &mut self.fields {
            if let Some(postings) = self.postings.get(&field.name) {
                let format = self.codec.postings_format_for_field(&field.name)?;
                postings_payloads.push((field.name.clone(), format.encode(&field.name, postings)?));
                field.postings_format = Some(format.name().to_string());
            }

            if let Some(column) = self.doc_values.get_mut(&field.name) {
                column.pad_to(doc_count as usize);
                let format = self.codec.doc_values_format_for_field(&field.name)?;
                doc_values_payloads.push((field.name.clone(), format.encode(&field.name, column)?));
                field.doc_values_format = Some(format.name().to_string());
            }
        }

        if !postings_payloads.is_empty() {
            files.push((
                info.file_name(POSTINGS_EXTENSION),
                write_field_payloads(POSTINGS_CONTAINER, &postings_payloads)?,
            ));
        }
        if !doc_values_payloads.is_empty() {
            files.push((
                info.file_name(DOC_VALUES_EXTENSION),
                write_field_payloads(DOC_VALUES_CONTAINER, &doc_values_payloads)?,
            ));
        }

        files.push((
            info.file_name(STORED_FIELDS_EXTENSION),
            self.codec.stored_fields_format().write(&self.stored)?,
        ));

        if self.fields.iter().any(|field| field.has_term_vectors) {
            files.push((
                info.file_name(TERM_VECTORS_EXTENSION),
                self.codec.term_vectors_format().write(&self.term_vectors)?,
            ));
        }

        if !self.norms.is_empty() {
            for lengths in self.norms.values_mut() {
                lengths.resize(doc_count as usize, 0);
            }
            files.push((
                info.file_name(NORMS_EXTENSION),
                self.codec.norms_format().write(&self.norms)?,
            ));
        }

        if self.config.use_compound_file {
            let packed = self.codec.compound_format().pack(&files)?;
            files = vec![(info.file_name(COMPOUND_EXTENSION), packed)];
        }

        // Live docs stay outside the compound file.
        if info.has_deletions() {
            let live_docs: BitVec = self.deleted.iter().map(|deleted| !deleted).collect();
            files.push((
                info.file_name(LIVE_DOCS_EXTENSION),
                self.codec.live_docs_format().write(&live_docs)?,
            ));
        }

        info.files = files.iter().map(|(file_name, _)| file_name.clone()).collect();
        info.fields = std::mem::take(&mut self.fields);

        let si_temp = format!("{}.tmp", info.file_name(SEGMENT_INFO_EXTENSION));
        if let Err(err) = self.publish(&info, &files, &si_temp) {
            for file_name in info.files.iter().chain([&si_temp]) {
                if let Err(cleanup) = self.storage.delete_file(file_name) {
                    warn!("Failed to remove '{file_name}' after aborted flush: {cleanup}");
                }
            }
            return Err(err);
        }

        info!(
            "Flushed segment '{}' with codec '{}': {} docs ({} deleted), {} fields, {} files",
            info.name,
            info.codec,
            info.doc_count,
            info.deleted_count,
            info.fields.len(),
            info.files.len()
        );

        Ok(info)
    }

    /// Write the data files, then the segment info through `si_temp`.
    fn publish(
        &self,
        info: &SegmentInfo,
        files: &[(String, Vec<u8>)],
        si_temp: &str,
    ) -> Result<()> {
        for (file_name, data) in files {
            self.storage.write_file(file_name, data)?;
        }

        self.storage.write_file(si_temp, &self.codec.segment_info_format().write(info)?)?;
        self.storage.rename_file(si_temp, &info.file_name(SEGMENT_INFO_EXTENSION))?;
        self.storage.sync()
    }
}
