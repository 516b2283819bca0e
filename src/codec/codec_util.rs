//! Headers shared by every encoded payload and segment file.
//!
//! Layout: `magic:u32 | name:string | version:u32 | ... body ... | crc32:u32`.
//! The name lets a reader notice that a payload was produced by another strategy
//! before it tries to interpret the body.

use std::io::{Read, Write};

use crate::error::{FlexCodecError, Result};
use crate::storage::structured::{StructReader, StructWriter};

/// Magic number opening every header ("FLXC").
pub const CODEC_MAGIC: u32 = 0x464C_5843;

/// Write the header for `codec` at `version`.
pub fn write_header<W: Write>(
    writer: &mut StructWriter<W>,
    codec: &str,
    version: u32,
) -> Result<()> {
    writer.write_u32(CODEC_MAGIC)?;
    writer.write_string(codec)?;
    writer.write_u32(version)
}

/// Read and validate a header, returning the version found.
pub fn check_header<R: Read>(
    reader: &mut StructReader<R>,
    codec: &str,
    min_version: u32,
    max_version: u32,
) -> Result<u32> {
    let magic = reader.read_u32()?;
    if magic != CODEC_MAGIC {
        return Err(FlexCodecError::corrupt(format!(
            "Bad magic {magic:#010x} while reading '{codec}'"
        )));
    }

    let name = reader.read_string()?;
    if name != codec {
        return Err(FlexCodecError::corrupt(format!(
            "Expected '{codec}' data, found '{name}'"
        )));
    }

    let version = reader.read_u32()?;
    if version < min_version || version > max_version {
        return Err(FlexCodecError::corrupt(format!(
            "Unsupported '{codec}' version {version} (supported {min_version}..={max_version})"
        )));
    }

    Ok(version)
}

/// Peek at the codec name of an encoded payload without validating the body.
pub fn header_name(bytes: &[u8]) -> Result<String> {
    let mut reader = StructReader::new(bytes);
    let magic = reader.read_u32()?;
    if magic != CODEC_MAGIC {
        return Err(FlexCodecError::corrupt(format!("Bad magic {magic:#010x}")));
    }
    reader.read_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(codec: &str, version: u32) -> Vec<u8> {
        let mut writer = StructWriter::new(Vec::new());
        write_header(&mut writer, codec, version).unwrap();
        writer.finish().unwrap()
    }

    #[test]
    fn test_header_round_trip() {
        let bytes = encoded("Standard41", 2);
        let mut reader = StructReader::new(bytes.as_slice());
        assert_eq!(check_header(&mut reader, "Standard41", 1, 2).unwrap(), 2);
        reader.verify_checksum().unwrap();
        assert_eq!(header_name(&bytes).unwrap(), "Standard41");
    }

    #[test]
    fn test_header_rejects_other_codec() {
        let bytes = encoded("Direct", 1);
        let mut reader = StructReader::new(bytes.as_slice());
        assert!(check_header(&mut reader, "Memory", 1, 1).is_err());
    }

    #[test]
    fn test_header_rejects_version() {
        let bytes = encoded("Direct", 7);
        let mut reader = StructReader::new(bytes.as_slice());
        assert!(check_header(&mut reader, "Direct", 1, 1).is_err());
    }
}
