//! Stored fields (`.fdt`): one bincode image per document behind an offset table.

use crate::codec::StoredFieldsFormat;
use crate::codec::codec_util::{check_header, write_header};
use crate::error::{FlexCodecError, Result};
use crate::segment::StoredDocument;
use crate::storage::structured::{StructReader, StructWriter};

const CODEC_NAME: &str = "StoredFields41";
const VERSION: u32 = 1;

/// Row-oriented stored fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardStoredFieldsFormat;

impl StandardStoredFieldsFormat {
    pub fn new() -> Self {
        StandardStoredFieldsFormat
    }
}

impl StoredFieldsFormat for StandardStoredFieldsFormat {
    fn name(&self) -> &str {
        CODEC_NAME
    }

    fn write(&self, documents: &[StoredDocument]) -> Result<Vec<u8>> {
        let mut writer = StructWriter::new(Vec::new());
        write_header(&mut writer, CODEC_NAME, VERSION)?;
        writer.write_varint(documents.len() as u64)?;

        for document in documents {
            let image = bincode::serde::encode_to_vec(document, bincode::config::standard())
                .map_err(|e| {
                    FlexCodecError::other(format!("Failed to serialize stored fields: {e}"))
                })?;
            writer.write_bytes(&image)?;
        }

        writer.finish()
    }

    fn read(&self, bytes: &[u8]) -> Result<Vec<StoredDocument>> {
        let mut reader = StructReader::new(bytes);
        check_header(&mut reader, CODEC_NAME, VERSION, VERSION)?;
        let count = reader.read_len(bytes.len())?;

        let mut documents = Vec::with_capacity(count);
        for _ in 0..count {
            let image = reader.read_bytes()?;
            let (document, _): (StoredDocument, _) =
                bincode::serde::decode_from_slice(&image, bincode::config::standard()).map_err(
                    |e| {
                        FlexCodecError::corrupt(format!("Failed to deserialize stored fields: {e}"))
                    },
                )?;
            documents.push(document);
        }

        reader.verify_checksum()?;
        Ok(documents)
    }
}
