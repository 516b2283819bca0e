//! Uncompressed doc values (tag `direct`).

use crate::codec::codec_util::{check_header, write_header};
use crate::codec::doc_values::{DocValuesColumn, DocValuesFormat, DocValuesType};
use crate::error::Result;
use crate::storage::structured::{StructReader, StructWriter};

const CODEC_NAME: &str = "DirectDocValues";
const VERSION: u32 = 1;

/// One fixed-width slot per document, including documents without a value.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectDocValuesFormat;

impl DirectDocValuesFormat {
    pub fn new() -> Self {
        DirectDocValuesFormat
    }
}

impl DocValuesFormat for DirectDocValuesFormat {
    fn name(&self) -> &str {
        CODEC_NAME
    }

    fn encode(&self, _field: &str, column: &DocValuesColumn) -> Result<Vec<u8>> {
        let mut writer = StructWriter::new(Vec::new());
        write_header(&mut writer, CODEC_NAME, VERSION)?;
        writer.write_u8(column.doc_values_type().code())?;
        writer.write_u64(column.len() as u64)?;

        match column {
            DocValuesColumn::Numeric(values) => {
                for value in values {
                    writer.write_u8(value.is_some() as u8)?;
                    writer.write_i64(value.unwrap_or_default())?;
                }
            }
            DocValuesColumn::Binary(values) => {
                for value in values {
                    writer.write_u8(value.is_some() as u8)?;
                    writer.write_bytes(value.as_deref().unwrap_or_default())?;
                }
            }
            DocValuesColumn::Sorted(values) => {
                for value in values {
                    writer.write_u8(value.is_some() as u8)?;
                    writer.write_string(value.as_deref().unwrap_or_default())?;
                }
            }
        }

        writer.finish()
    }

    fn decode(&self, bytes: &[u8]) -> Result<DocValuesColumn> {
        let mut reader = StructReader::new(bytes);
        check_header(&mut reader, CODEC_NAME, VERSION, VERSION)?;
        let kind = DocValuesType::from_code(reader.read_u8()?)?;
        let count = reader.read_u64()? as usize;
        let capacity = count.min(bytes.len());

        let column = match kind {
            DocValuesType::Numeric => {
                let mut values = Vec::with_capacity(capacity);
                for _ in 0..count {
                    let present = reader.read_u8()? != 0;
                    let value = reader.read_i64()?;
                    values.push(present.then_some(value));
                }
                DocValuesColumn::Numeric(values)
            }
            DocValuesType::Binary => {
                let mut values = Vec::with_capacity(capacity);
                for _ in 0..count {
                    let present = reader.read_u8()? != 0;
                    let value = reader.read_bytes()?;
                    values.push(present.then_some(value));
                }
                DocValuesColumn::Binary(values)
            }
            DocValuesType::Sorted => {
                let mut values = Vec::with_capacity(capacity);
                for _ in 0..count {
                    let present = reader.read_u8()? != 0;
                    let value = reader.read_string()?;
                    values.push(present.then_some(value));
                }
                DocValuesColumn::Sorted(values)
            }
        };

        reader.verify_checksum()?;
        Ok(column)
    }
}
