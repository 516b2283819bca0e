//! Field length norms (`.nvd`).

use std::collections::BTreeMap;

use crate::codec::NormsFormat;
use crate::codec::codec_util::{check_header, write_header};
use crate::error::Result;
use crate::storage::structured::{StructReader, StructWriter};

const CODEC_NAME: &str = "Norms41";
const VERSION: u32 = 1;

/// Token counts per field and document, varint encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardNormsFormat;

impl StandardNormsFormat {
    pub fn new() -> Self {
        StandardNormsFormat
    }
}

impl NormsFormat for StandardNormsFormat {
    fn name(&self) -> &str {
        CODEC_NAME
    }

    fn write(&self, norms: &BTreeMap<String, Vec<u32>>) -> Result<Vec<u8>> {
        let mut writer = StructWriter::new(Vec::new());
        write_header(&mut writer, CODEC_NAME, VERSION)?;
        writer.write_varint(norms.len() as u64)?;
        for (field, lengths) in norms {
            writer.write_string(field)?;
            writer.write_varint(lengths.len() as u64)?;
            for &length in lengths {
                writer.write_varint(length as u64)?;
            }
        }
        writer.finish()
    }

    fn read(&self, bytes: &[u8]) -> Result<BTreeMap<String, Vec<u32>>> {
        let mut reader = StructReader::new(bytes);
        check_header(&mut reader, CODEC_NAME, VERSION, VERSION)?;

        let mut norms = BTreeMap::new();
        let field_count = reader.read_len(bytes.len())?;
        for _ in 0..field_count {
            let field = reader.read_string()?;
            let count = reader.read_len(bytes.len())?;
            let mut lengths = Vec::with_capacity(count);
            for _ in 0..count {
                lengths.push(reader.read_varint()? as u32);
            }
            norms.insert(field, lengths);
        }

        reader.verify_checksum()?;
        Ok(norms)
    }
}
