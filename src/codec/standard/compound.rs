//! Compound file (`.cfs`): several segment files packed into one.
//!
//! Layout after the header: entry count, then per entry its name and length-prefixed
//! content. The whole container carries one checksum footer.

use crate::codec::CompoundFormat;
use crate::codec::codec_util::{check_header, write_header};
use crate::error::{FlexCodecError, Result};
use crate::storage::structured::{StructReader, StructWriter};

const CODEC_NAME: &str = "Compound41";
const VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCompoundFormat;

impl StandardCompoundFormat {
    pub fn new() -> Self {
        StandardCompoundFormat
    }
}

impl CompoundFormat for StandardCompoundFormat {
    fn name(&self) -> &str {
        CODEC_NAME
    }

    fn pack(&self, entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
        let mut writer = StructWriter::new(Vec::new());
        write_header(&mut writer, CODEC_NAME, VERSION)?;
        writer.write_varint(entries.len() as u64)?;
        for (index, (name, data)) in entries.iter().enumerate() {
            if entries[..index].iter().any(|(other, _)| other == name) {
                return Err(FlexCodecError::storage(format!(
                    "Duplicate compound entry '{name}'"
                )));
            }
            writer.write_string(name)?;
            writer.write_bytes(data)?;
        }
        writer.finish()
    }

    fn unpack(&self, bytes: &[u8]) -> Result<Vec<(String, Vec<u8>)>> {
        let mut reader = StructReader::new(bytes);
        check_header(&mut reader, CODEC_NAME, VERSION, VERSION)?;
        let count = reader.read_len(bytes.len())?;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let name = reader.read_string()?;
            let data = reader.read_bytes()?;
            entries.push((name, data));
        }
        reader.verify_checksum()?;
        Ok(entries)
    }
}
