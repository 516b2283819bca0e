//! Uncompressed fixed-width postings (tag `direct`).
//!
//! Trades size for decode speed: every number is written at full width, so decoding is
//! a straight copy without varint or delta work.

use crate::codec::codec_util::{check_header, write_header};
use crate::codec::postings::{FieldPostings, Posting, PostingList, PostingsFormat};
use crate::error::Result;
use crate::storage::structured::{StructReader, StructWriter};

const CODEC_NAME: &str = "Direct";
const VERSION: u32 = 1;

/// Marks a posting without positions.
const NO_POSITIONS: u32 = u32::MAX;

/// Fixed-width postings layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectPostingsFormat;

impl DirectPostingsFormat {
    /// Create the format.
    pub fn new() -> Self {
        DirectPostingsFormat
    }
}

impl PostingsFormat for DirectPostingsFormat {
    fn name(&self) -> &str {
        CODEC_NAME
    }

    fn encode(&self, _field: &str, postings: &FieldPostings) -> Result<Vec<u8>> {
        let mut writer = StructWriter::new(Vec::new());
        write_header(&mut writer, CODEC_NAME, VERSION)?;

        writer.write_u64(postings.doc_count)?;
        writer.write_u32(postings.terms.len() as u32)?;
        for (term, list) in &postings.terms {
            writer.write_string(term)?;
            writer.write_u64(list.total_frequency)?;
            writer.write_u32(list.postings.len() as u32)?;
            for posting in &list.postings {
                writer.write_u64(posting.doc_id)?;
                writer.write_u32(posting.frequency)?;
                match &posting.positions {
                    Some(positions) => {
                        writer.write_u32(positions.len() as u32)?;
                        for &pos in positions {
                            writer.write_u32(pos)?;
                        }
                    }
                    None => writer.write_u32(NO_POSITIONS)?,
                }
            }
        }

        writer.finish()
    }

    fn decode(&self, bytes: &[u8]) -> Result<FieldPostings> {
        let mut reader = StructReader::new(bytes);
        check_header(&mut reader, CODEC_NAME, VERSION, VERSION)?;

        let mut postings = FieldPostings::new();
        postings.doc_count = reader.read_u64()?;

        let term_count = reader.read_u32()?;
        for _ in 0..term_count {
            let term = reader.read_string()?;
            let total_frequency = reader.read_u64()?;
            let count = reader.read_u32()? as usize;

            let mut list = Vec::with_capacity(count.min(bytes.len()));
            for _ in 0..count {
                let doc_id = reader.read_u64()?;
                let frequency = reader.read_u32()?;
                let positions = match reader.read_u32()? {
                    NO_POSITIONS => None,
                    n => {
                        let mut positions = Vec::with_capacity((n as usize).min(bytes.len()));
                        for _ in 0..n {
                            positions.push(reader.read_u32()?);
                        }
                        Some(positions)
                    }
                };
                list.push(Posting {
                    doc_id,
                    frequency,
                    positions,
                });
            }

            postings.terms.insert(
                term,
                PostingList {
                    postings: list,
                    total_frequency,
                },
            );
        }

        reader.verify_checksum()?;
        Ok(postings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::postings::StandardPostingsFormat;
    use crate::codec::postings::test_support::sample_postings;

    #[test]
    fn test_encode_decode() {
        let format = DirectPostingsFormat::new();
        let original = sample_postings();
        let bytes = format.encode("id<direct>", &original).unwrap();
        assert_eq!(format.decode(&bytes).unwrap(), original);
    }

    #[test]
    fn test_payload_not_readable_by_other_format() {
        let bytes = DirectPostingsFormat::new()
            .encode("id<direct>", &sample_postings())
            .unwrap();
        assert!(StandardPostingsFormat::new().decode(&bytes).is_err());
    }
}
