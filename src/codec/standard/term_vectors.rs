//! Term vectors (`.tvd`): per document, per field, the terms and their positions.

use crate::codec::TermVectorsFormat;
use crate::codec::codec_util::{check_header, write_header};
use crate::error::Result;
use crate::segment::TermVector;
use crate::storage::structured::{StructReader, StructWriter};

const CODEC_NAME: &str = "TermVectors41";
const VERSION: u32 = 1;

/// Delta-encoded term vectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTermVectorsFormat;

impl StandardTermVectorsFormat {
    pub fn new() -> Self {
        StandardTermVectorsFormat
    }
}

impl TermVectorsFormat for StandardTermVectorsFormat {
    fn name(&self) -> &str {
        CODEC_NAME
    }

    fn write(&self, documents: &[Vec<TermVector>]) -> Result<Vec<u8>> {
        let mut writer = StructWriter::new(Vec::new());
        write_header(&mut writer, CODEC_NAME, VERSION)?;
        writer.write_varint(documents.len() as u64)?;

        for vectors in documents {
            writer.write_varint(vectors.len() as u64)?;
            for vector in vectors {
                writer.write_string(&vector.field)?;
                writer.write_varint(vector.terms.len() as u64)?;
                for (term, positions) in &vector.terms {
                    writer.write_string(term)?;
                    writer.write_varint(positions.len() as u64)?;
                    let mut prev = 0u32;
                    for &position in positions {
                        writer.write_varint(position.wrapping_sub(prev) as u64)?;
                        prev = position;
                    }
                }
            }
        }

        writer.finish()
    }

    fn read(&self, bytes: &[u8]) -> Result<Vec<Vec<TermVector>>> {
        let mut reader = StructReader::new(bytes);
        check_header(&mut reader, CODEC_NAME, VERSION, VERSION)?;
        let limit = bytes.len();

        let doc_count = reader.read_len(limit)?;
        let mut documents = Vec::with_capacity(doc_count);
        for _ in 0..doc_count {
            let vector_count = reader.read_len(limit)?;
            let mut vectors = Vec::with_capacity(vector_count);
            for _ in 0..vector_count {
                let mut vector = TermVector {
                    field: reader.read_string()?,
                    ..TermVector::default()
                };
                let term_count = reader.read_len(limit)?;
                for _ in 0..term_count {
                    let term = reader.read_string()?;
                    let position_count = reader.read_len(limit)?;
                    let mut positions = Vec::with_capacity(position_count);
                    let mut prev = 0u32;
                    for _ in 0..position_count {
                        prev = prev.wrapping_add(reader.read_varint()? as u32);
                        positions.push(prev);
                    }
                    vector.terms.insert(term, positions);
                }
                vectors.push(vector);
            }
            documents.push(vectors);
        }

        reader.verify_checksum()?;
        Ok(documents)
    }
}
