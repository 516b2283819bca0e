//! Live documents (`.liv`): a bitset with one bit per document, set when live.

use bit_vec::BitVec;

use crate::codec::LiveDocsFormat;
use crate::codec::codec_util::{check_header, write_header};
use crate::error::{FlexCodecError, Result};
use crate::storage::structured::{StructReader, StructWriter};

const CODEC_NAME: &str = "LiveDocs41";
const VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardLiveDocsFormat;

impl StandardLiveDocsFormat {
    pub fn new() -> Self {
        StandardLiveDocsFormat
    }
}

impl LiveDocsFormat for StandardLiveDocsFormat {
    fn name(&self) -> &str {
        CODEC_NAME
    }

    fn write(&self, live_docs: &BitVec) -> Result<Vec<u8>> {
        let mut writer = StructWriter::new(Vec::new());
        write_header(&mut writer, CODEC_NAME, VERSION)?;
        writer.write_varint(live_docs.len() as u64)?;
        writer.write_bytes(&live_docs.to_bytes())?;
        writer.finish()
    }

    fn read(&self, bytes: &[u8]) -> Result<BitVec> {
        let mut reader = StructReader::new(bytes);
        check_header(&mut reader, CODEC_NAME, VERSION, VERSION)?;
        let len = reader.read_varint()? as usize;
        let raw = reader.read_bytes()?;
        reader.verify_checksum()?;

        if raw.len() * 8 < len {
            return Err(FlexCodecError::corrupt("Live docs bitset shorter than declared"));
        }
        let mut live_docs = BitVec::from_bytes(&raw);
        live_docs.truncate(len);
        Ok(live_docs)
    }
}
