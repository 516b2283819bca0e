//! Postings with low-frequency terms inlined (tag `pulsing_4_1`).
//!
//! Terms whose document frequency is at most the cutoff are written directly into the
//! term dictionary section; all other terms are handed to a wrapped format. Primary-key
//! style fields, where nearly every term occurs once, end up fully inlined.

use std::sync::Arc;

use crate::codec::codec_util::{check_header, write_header};
use crate::codec::postings::standard::{read_posting_list, write_posting_list};
use crate::codec::postings::{FieldPostings, PostingsFormat, StandardPostingsFormat};
use crate::error::Result;
use crate::storage::structured::{StructReader, StructWriter};

const CODEC_NAME: &str = "Pulsing41";
const VERSION: u32 = 1;

/// Default document-frequency cutoff for inlining.
pub const DEFAULT_PULSING_CUTOFF: u32 = 1;

/// Inlines rare terms and delegates the rest.
#[derive(Debug, Clone)]
pub struct PulsingPostingsFormat {
    cutoff: u32,
    inner: Arc<dyn PostingsFormat>,
}

impl PulsingPostingsFormat {
    /// Wrap the standard format with the default cutoff.
    pub fn new() -> Self {
        Self::with_cutoff(DEFAULT_PULSING_CUTOFF)
    }

    /// Wrap the standard format, inlining terms with at most `cutoff` documents.
    pub fn with_cutoff(cutoff: u32) -> Self {
        Self::wrapping(Arc::new(StandardPostingsFormat::new()), cutoff)
    }

    /// Wrap an arbitrary format.
    pub fn wrapping(inner: Arc<dyn PostingsFormat>, cutoff: u32) -> Self {
        PulsingPostingsFormat { cutoff, inner }
    }

    /// The inlining cutoff.
    pub fn cutoff(&self) -> u32 {
        self.cutoff
    }
}

impl Default for PulsingPostingsFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl PostingsFormat for PulsingPostingsFormat {
    fn name(&self) -> &str {
        CODEC_NAME
    }

    fn encode(&self, field: &str, postings: &FieldPostings) -> Result<Vec<u8>> {
        let mut delegated = FieldPostings::new();
        delegated.doc_count = postings.doc_count;
        let mut inlined = Vec::new();

        for (term, list) in &postings.terms {
            if list.doc_frequency() <= self.cutoff as u64 {
                inlined.push((term, list));
            } else {
                delegated.terms.insert(term.clone(), list.clone());
            }
        }

        let mut writer = StructWriter::new(Vec::new());
        write_header(&mut writer, CODEC_NAME, VERSION)?;
        writer.write_varint(postings.doc_count)?;
        writer.write_varint(inlined.len() as u64)?;
        for (term, list) in inlined {
            writer.write_string(term)?;
            write_posting_list(&mut writer, list)?;
        }
        writer.write_bytes(&self.inner.encode(field, &delegated)?)?;
        writer.finish()
    }

    fn decode(&self, bytes: &[u8]) -> Result<FieldPostings> {
        let mut reader = StructReader::new(bytes);
        check_header(&mut reader, CODEC_NAME, VERSION, VERSION)?;

        let doc_count = reader.read_varint()?;
        let inline_count = reader.read_len(bytes.len())?;
        let mut inlined = Vec::with_capacity(inline_count);
        for _ in 0..inline_count {
            let term = reader.read_string()?;
            let list = read_posting_list(&mut reader, bytes.len())?;
            inlined.push((term, list));
        }
        let delegated = reader.read_bytes()?;
        reader.verify_checksum()?;

        let mut postings = self.inner.decode(&delegated)?;
        postings.doc_count = doc_count;
        postings.terms.extend(inlined);
        Ok(postings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::postings::Posting;
    use crate::codec::postings::test_support::sample_postings;

    #[test]
    fn test_encode_decode() {
        let format = PulsingPostingsFormat::new();
        let original = sample_postings();
        let bytes = format.encode("id<pulsing_4_1>", &original).unwrap();
        assert_eq!(format.decode(&bytes).unwrap(), original);
    }

    #[test]
    fn test_all_terms_inlined_for_primary_keys() {
        let format = PulsingPostingsFormat::new();
        let mut postings = FieldPostings::new();
        for doc_id in 0..10u64 {
            postings.add_posting(format!("key-{doc_id}"), Posting::new(doc_id));
        }
        postings.doc_count = 10;

        let bytes = format.encode("id<pulsing_4_1>", &postings).unwrap();
        let decoded = format.decode(&bytes).unwrap();
        assert_eq!(decoded, postings);

        // An inner format that refuses terms proves nothing was delegated.
        let strict = PulsingPostingsFormat::wrapping(Arc::new(RejectTerms), 1);
        assert!(strict.encode("id<pulsing_4_1>", &postings).is_ok());
        assert!(strict.encode("f", &sample_postings()).is_err());
    }

    #[derive(Debug)]
    struct RejectTerms;

    impl PostingsFormat for RejectTerms {
        fn name(&self) -> &str {
            "RejectTerms"
        }

        fn encode(&self, field: &str, postings: &FieldPostings) -> Result<Vec<u8>> {
            if postings.is_empty() {
                StandardPostingsFormat::new().encode(field, postings)
            } else {
                Err(crate::error::FlexCodecError::other("terms were delegated"))
            }
        }

        fn decode(&self, bytes: &[u8]) -> Result<FieldPostings> {
            StandardPostingsFormat::new().decode(bytes)
        }
    }

    #[test]
    fn test_higher_cutoff_inlines_more() {
        let postings = sample_postings();
        let low = PulsingPostingsFormat::with_cutoff(1)
            .encode("f", &postings)
            .unwrap();
        let high = PulsingPostingsFormat::with_cutoff(10)
            .encode("f", &postings)
            .unwrap();
        assert_eq!(PulsingPostingsFormat::with_cutoff(10).decode(&high).unwrap(), postings);
        assert_ne!(low, high);
    }
}
