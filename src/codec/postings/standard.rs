//! Delta/varint compressed postings (tag `lucene_4_1`).
//!
//! Doc ids and positions are delta encoded and written as varints. This is the default
//! postings layout of the built-in codec and the inner format wrapped by the pulsing
//! and bloom strategies.

use std::io::{Read, Write};

use crate::codec::codec_util::{check_header, write_header};
use crate::codec::postings::{FieldPostings, Posting, PostingList, PostingsFormat};
use crate::error::{FlexCodecError, Result};
use crate::storage::structured::{StructReader, StructWriter};

const CODEC_NAME: &str = "Standard41";
const VERSION: u32 = 1;

/// Default compressed postings layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPostingsFormat;

impl StandardPostingsFormat {
    /// Create the format.
    pub fn new() -> Self {
        StandardPostingsFormat
    }
}

impl PostingsFormat for StandardPostingsFormat {
    fn name(&self) -> &str {
        CODEC_NAME
    }

    fn encode(&self, _field: &str, postings: &FieldPostings) -> Result<Vec<u8>> {
        let mut writer = StructWriter::new(Vec::new());
        write_header(&mut writer, CODEC_NAME, VERSION)?;

        writer.write_varint(postings.doc_count)?;
        writer.write_varint(postings.terms.len() as u64)?;
        for (term, list) in &postings.terms {
            writer.write_string(term)?;
            write_posting_list(&mut writer, list)?;
        }

        writer.finish()
    }

    fn decode(&self, bytes: &[u8]) -> Result<FieldPostings> {
        let mut reader = StructReader::new(bytes);
        check_header(&mut reader, CODEC_NAME, VERSION, VERSION)?;

        let doc_count = reader.read_varint()?;
        let term_count = reader.read_len(bytes.len())?;
        let mut postings = FieldPostings::new();
        postings.doc_count = doc_count;

        for _ in 0..term_count {
            let term = reader.read_string()?;
            let list = read_posting_list(&mut reader, bytes.len())?;
            postings.terms.insert(term, list);
        }

        reader.verify_checksum()?;
        Ok(postings)
    }
}

/// Write one term's postings with delta-compressed doc ids and positions.
pub(crate) fn write_posting_list<W: Write>(
    writer: &mut StructWriter<W>,
    list: &PostingList,
) -> Result<()> {
    writer.write_varint(list.total_frequency)?;
    writer.write_varint(list.postings.len() as u64)?;

    let mut prev_doc_id = 0u64;
    for (index, posting) in list.postings.iter().enumerate() {
        if index > 0 && posting.doc_id <= prev_doc_id {
            return Err(FlexCodecError::field(format!(
                "Postings not strictly sorted: doc {} after {prev_doc_id}",
                posting.doc_id
            )));
        }
        writer.write_varint(posting.doc_id - prev_doc_id)?;
        prev_doc_id = posting.doc_id;

        writer.write_varint(posting.frequency as u64)?;

        match &posting.positions {
            Some(positions) => {
                writer.write_u8(1)?;
                writer.write_varint(positions.len() as u64)?;
                let mut prev_pos = 0u32;
                for &pos in positions {
                    writer.write_varint(pos.wrapping_sub(prev_pos) as u64)?;
                    prev_pos = pos;
                }
            }
            None => writer.write_u8(0)?,
        }
    }

    Ok(())
}

/// Inverse of [`write_posting_list`].
pub(crate) fn read_posting_list<R: Read>(
    reader: &mut StructReader<R>,
    limit: usize,
) -> Result<PostingList> {
    let total_frequency = reader.read_varint()?;
    let posting_count = reader.read_len(limit)?;

    let mut postings = Vec::with_capacity(posting_count);
    let mut prev_doc_id = 0u64;
    for _ in 0..posting_count {
        let delta = reader.read_varint()?;
        let doc_id = prev_doc_id
            .checked_add(delta)
            .ok_or_else(|| FlexCodecError::corrupt("Doc id delta overflows u64"))?;
        prev_doc_id = doc_id;

        let frequency = reader.read_varint()? as u32;

        let positions = match reader.read_u8()? {
            0 => None,
            1 => {
                let count = reader.read_len(limit)?;
                let mut positions = Vec::with_capacity(count);
                let mut prev_pos = 0u32;
                for _ in 0..count {
                    let pos = prev_pos.wrapping_add(reader.read_varint()? as u32);
                    positions.push(pos);
                    prev_pos = pos;
                }
                Some(positions)
            }
            flag => {
                return Err(FlexCodecError::corrupt(format!(
                    "Invalid positions flag {flag}"
                )));
            }
        };

        postings.push(Posting {
            doc_id,
            frequency,
            positions,
        });
    }

    Ok(PostingList {
        postings,
        total_frequency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::postings::test_support::sample_postings;

    #[test]
    fn test_encode_decode() {
        let format = StandardPostingsFormat::new();
        let original = sample_postings();

        let bytes = format.encode("body<lucene_4_1>", &original).unwrap();
        let decoded = format.decode(&bytes).unwrap();

        assert_eq!(decoded, original);
        assert!(format.term_might_exist(&bytes, "rust").unwrap());
        assert!(!format.term_might_exist(&bytes, "java").unwrap());
    }

    #[test]
    fn test_delta_encoding_is_compact() {
        let format = StandardPostingsFormat::new();
        let mut postings = FieldPostings::new();
        for doc_id in 1_000_000..1_000_100u64 {
            postings.add_posting("t", Posting::new(doc_id));
        }
        let bytes = format.encode("f", &postings).unwrap();
        // First doc id costs 3 bytes, every following delta of 1 costs one byte.
        assert!(bytes.len() < 100 * 4);
    }

    #[test]
    fn test_corrupt_payload_rejected() {
        let format = StandardPostingsFormat::new();
        let mut bytes = format.encode("f", &sample_postings()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        assert!(format.decode(&bytes).is_err());
    }

    #[test]
    fn test_overflowing_doc_id_delta_rejected() {
        let mut writer = StructWriter::new(Vec::new());
        write_header(&mut writer, CODEC_NAME, VERSION).unwrap();
        writer.write_varint(2).unwrap();
        writer.write_varint(1).unwrap();
        writer.write_string("t").unwrap();
        writer.write_varint(2).unwrap();
        writer.write_varint(2).unwrap();
        for delta in [u64::MAX, 1] {
            writer.write_varint(delta).unwrap();
            writer.write_varint(1).unwrap();
            writer.write_u8(0).unwrap();
        }
        let bytes = writer.finish().unwrap();

        let result = StandardPostingsFormat::new().decode(&bytes);
        assert!(matches!(result, Err(FlexCodecError::Corrupt(_))));
    }
}
