//! Whole-field serialized postings (tag `memory`).
//!
//! The complete term dictionary and postings are serialized as one bincode image,
//! meant for small, hot fields that are always loaded entirely into RAM.

use crate::codec::codec_util::{check_header, write_header};
use crate::codec::postings::{FieldPostings, PostingsFormat};
use crate::error::{FlexCodecError, Result};
use crate::storage::structured::{StructReader, StructWriter};

const CODEC_NAME: &str = "Memory";
const VERSION: u32 = 1;

/// Serialized in-memory postings layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryPostingsFormat;

impl MemoryPostingsFormat {
    /// Create the format.
    pub fn new() -> Self {
        MemoryPostingsFormat
    }
}

impl PostingsFormat for MemoryPostingsFormat {
    fn name(&self) -> &str {
        CODEC_NAME
    }

    fn encode(&self, _field: &str, postings: &FieldPostings) -> Result<Vec<u8>> {
        let image = bincode::serde::encode_to_vec(postings, bincode::config::standard())
            .map_err(|e| FlexCodecError::other(format!("Failed to serialize postings: {e}")))?;

        let mut writer = StructWriter::new(Vec::new());
        write_header(&mut writer, CODEC_NAME, VERSION)?;
        writer.write_bytes(&image)?;
        writer.finish()
    }

    fn decode(&self, bytes: &[u8]) -> Result<FieldPostings> {
        let mut reader = StructReader::new(bytes);
        check_header(&mut reader, CODEC_NAME, VERSION, VERSION)?;
        let image = reader.read_bytes()?;
        reader.verify_checksum()?;

        let (postings, _): (FieldPostings, _) =
            bincode::serde::decode_from_slice(&image, bincode::config::standard()).map_err(
                |e| FlexCodecError::corrupt(format!("Failed to deserialize postings: {e}")),
            )?;
        Ok(postings)
    }
}
