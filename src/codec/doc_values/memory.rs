//! Whole-column serialized doc values (tag `memory`).

use crate::codec::codec_util::{check_header, write_header};
use crate::codec::doc_values::{DocValuesColumn, DocValuesFormat};
use crate::error::{FlexCodecError, Result};
use crate::storage::structured::{StructReader, StructWriter};

const CODEC_NAME: &str = "MemoryDocValues";
const VERSION: u32 = 1;

/// The column as a single bincode image.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryDocValuesFormat;

impl MemoryDocValuesFormat {
    pub fn new() -> Self {
        MemoryDocValuesFormat
    }
}

impl DocValuesFormat for MemoryDocValuesFormat {
    fn name(&self) -> &str {
        CODEC_NAME
    }

    fn encode(&self, _field: &str, column: &DocValuesColumn) -> Result<Vec<u8>> {
        let image = bincode::serde::encode_to_vec(column, bincode::config::standard())
            .map_err(|e| FlexCodecError::other(format!("Failed to serialize doc values: {e}")))?;

        let mut writer = StructWriter::new(Vec::new());
        write_header(&mut writer, CODEC_NAME, VERSION)?;
        writer.write_bytes(&image)?;
        writer.finish()
    }

    fn decode(&self, bytes: &[u8]) -> Result<DocValuesColumn> {
        let mut reader = StructReader::new(bytes);
        check_header(&mut reader, CODEC_NAME, VERSION, VERSION)?;
        let image = reader.read_bytes()?;
        reader.verify_checksum()?;

        let (column, _): (DocValuesColumn, _) =
            bincode::serde::decode_from_slice(&image, bincode::config::standard()).map_err(
                |e| FlexCodecError::corrupt(format!("Failed to deserialize doc values: {e}")),
            )?;
        Ok(column)
    }
}
