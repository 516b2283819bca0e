//! Bloom-filtered postings (tag `bloom_4_1`).
//!
//! Stores a bloom filter over the field's term set in front of a wrapped postings
//! payload. Lookups of absent terms, typical for primary-key checks during updates,
//! are answered from the filter alone without decoding any postings.

use std::sync::Arc;

use bit_vec::BitVec;
use crc32fast::Hasher;

use crate::codec::codec_util::{check_header, write_header};
use crate::codec::postings::{FieldPostings, PostingsFormat, StandardPostingsFormat};
use crate::error::{FlexCodecError, Result};
use crate::storage::structured::{StructReader, StructWriter};

const CODEC_NAME: &str = "BloomFilter41";
const VERSION: u32 = 1;

/// Default target false-positive probability.
pub const DEFAULT_FALSE_POSITIVE_RATE: f64 = 0.01;

const MIN_BITS: usize = 64;
const MAX_HASHES: u32 = 16;
const SECOND_HASH_SEED: u32 = 0x9747_b28c;

/// A fixed-size bloom filter over strings.
#[derive(Debug, Clone, PartialEq)]
pub struct BloomFilter {
    bits: BitVec,
    num_hashes: u32,
}

impl BloomFilter {
    /// Size a filter for `expected_items` at `false_positive_rate`.
    pub fn with_rate(expected_items: usize, false_positive_rate: f64) -> Self {
        let n = expected_items.max(1) as f64;
        let ln2 = std::f64::consts::LN_2;
        let num_bits = (-(n * false_positive_rate.ln()) / (ln2 * ln2)).ceil() as usize;
        let num_bits = num_bits.max(MIN_BITS);
        let num_hashes = ((num_bits as f64 / n) * ln2).round() as u32;

        BloomFilter {
            bits: BitVec::from_elem(num_bits, false),
            num_hashes: num_hashes.clamp(1, MAX_HASHES),
        }
    }

    /// Add an item.
    pub fn insert(&mut self, item: &str) {
        let indexes: Vec<usize> = self.indexes(item).collect();
        for index in indexes {
            self.bits.set(index, true);
        }
    }

    /// False means definitely absent; true means possibly present.
    pub fn might_contain(&self, item: &str) -> bool {
        self.indexes(item)
            .all(|index| self.bits.get(index).unwrap_or(false))
    }

    /// Number of bits in the filter.
    pub fn num_bits(&self) -> usize {
        self.bits.len()
    }

    /// Number of hash probes per item.
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    fn indexes(&self, item: &str) -> impl Iterator<Item = usize> + '_ {
        let h1 = crc32fast::hash(item.as_bytes()) as u64;
        let mut hasher = Hasher::new_with_initial(SECOND_HASH_SEED);
        hasher.update(item.as_bytes());
        let h2 = hasher.finalize() as u64 | 1;

        let len = self.bits.len() as u64;
        (0..self.num_hashes as u64)
            .map(move |i| (h1.wrapping_add(i.wrapping_mul(h2)) % len) as usize)
    }

    fn write<W: std::io::Write>(&self, writer: &mut StructWriter<W>) -> Result<()> {
        writer.write_u32(self.num_hashes)?;
        writer.write_varint(self.bits.len() as u64)?;
        writer.write_bytes(&self.bits.to_bytes())
    }

    fn read<R: std::io::Read>(reader: &mut StructReader<R>) -> Result<Self> {
        let num_hashes = reader.read_u32()?;
        let num_bits = reader.read_varint()? as usize;
        let bytes = reader.read_bytes()?;
        if num_hashes == 0 || num_hashes > MAX_HASHES || num_bits == 0 || bytes.len() * 8 < num_bits
        {
            return Err(FlexCodecError::corrupt("Invalid bloom filter header"));
        }

        let mut bits = BitVec::from_bytes(&bytes);
        bits.truncate(num_bits);
        Ok(BloomFilter { bits, num_hashes })
    }
}

/// Bloom filter over the term set in front of a wrapped postings format.
#[derive(Debug, Clone)]
pub struct BloomFilteringPostingsFormat {
    inner: Arc<dyn PostingsFormat>,
    false_positive_rate: f64,
}

impl BloomFilteringPostingsFormat {
    /// Wrap the standard format with the default false-positive rate.
    pub fn new() -> Self {
        Self::wrapping(
            Arc::new(StandardPostingsFormat::new()),
            DEFAULT_FALSE_POSITIVE_RATE,
        )
    }

    /// Wrap `inner`, sizing filters for `false_positive_rate`.
    pub fn wrapping(inner: Arc<dyn PostingsFormat>, false_positive_rate: f64) -> Self {
        BloomFilteringPostingsFormat {
            inner,
            false_positive_rate,
        }
    }

    /// Target false-positive probability.
    pub fn false_positive_rate(&self) -> f64 {
        self.false_positive_rate
    }

    /// Read only the filter section of a payload.
    pub fn load_filter(&self, bytes: &[u8]) -> Result<BloomFilter> {
        let (filter, _) = self.read_sections(bytes)?;
        Ok(filter)
    }

    fn read_sections(&self, bytes: &[u8]) -> Result<(BloomFilter, Vec<u8>)> {
        let mut reader = StructReader::new(bytes);
        check_header(&mut reader, CODEC_NAME, VERSION, VERSION)?;
        let filter = BloomFilter::read(&mut reader)?;
        let delegated = reader.read_bytes()?;
        reader.verify_checksum()?;
        Ok((filter, delegated))
    }
}

impl Default for BloomFilteringPostingsFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl PostingsFormat for BloomFilteringPostingsFormat {
    fn name(&self) -> &str {
        CODEC_NAME
    }

    fn encode(&self, field: &str, postings: &FieldPostings) -> Result<Vec<u8>> {
        if !(self.false_positive_rate > 0.0 && self.false_positive_rate < 1.0) {
            return Err(FlexCodecError::invalid_config(format!(
                "Bloom false-positive rate must be in (0, 1), got {}",
                self.false_positive_rate
            )));
        }

        let mut filter = BloomFilter::with_rate(postings.term_count(), self.false_positive_rate);
        for term in postings.terms.keys() {
            filter.insert(term);
        }

        let mut writer = StructWriter::new(Vec::new());
        write_header(&mut writer, CODEC_NAME, VERSION)?;
        filter.write(&mut writer)?;
        writer.write_bytes(&self.inner.encode(field, postings)?)?;
        writer.finish()
    }

    fn decode(&self, bytes: &[u8]) -> Result<FieldPostings> {
        let (_, delegated) = self.read_sections(bytes)?;
        self.inner.decode(&delegated)
    }

    fn term_might_exist(&self, bytes: &[u8], term: &str) -> Result<bool> {
        Ok(self.load_filter(bytes)?.might_contain(term))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::postings::Posting;
    use crate::codec::postings::test_support::sample_postings;

    #[test]
    fn test_encode_decode() {
        let format = BloomFilteringPostingsFormat::new();
        let original = sample_postings();
        let bytes = format.encode("id<bloom_4_1>", &original).unwrap();
        assert_eq!(format.decode(&bytes).unwrap(), original);
    }

    #[test]
    fn test_no_false_negatives() {
        let format = BloomFilteringPostingsFormat::new();
        let mut postings = FieldPostings::new();
        for doc_id in 0..500u64 {
            postings.add_posting(format!("pk-{doc_id}"), Posting::new(doc_id));
        }

        let bytes = format.encode("id<bloom_4_1>", &postings).unwrap();
        for doc_id in 0..500u64 {
            assert!(format.term_might_exist(&bytes, &format!("pk-{doc_id}")).unwrap());
        }
    }

    #[test]
    fn test_false_positive_rate_is_bounded() {
        let mut filter = BloomFilter::with_rate(1000, 0.01);
        for i in 0..1000 {
            filter.insert(&format!("present-{i}"));
        }
        let false_positives = (0..10_000)
            .filter(|i| filter.might_contain(&format!("absent-{i}")))
            .count();
        // 1% target; allow generous slack for hash quality.
        assert!(false_positives < 500, "false positives: {false_positives}");
    }

    #[test]
    fn test_filter_survives_serialization() {
        let format = BloomFilteringPostingsFormat::new();
        let bytes = format.encode("f", &sample_postings()).unwrap();
        let filter = format.load_filter(&bytes).unwrap();
        assert!(filter.might_contain("hello"));
        assert!(filter.num_bits() >= MIN_BITS);
        assert!(filter.num_hashes() >= 1);
    }

    #[test]
    fn test_invalid_rate_rejected() {
        let format =
            BloomFilteringPostingsFormat::wrapping(Arc::new(StandardPostingsFormat::new()), 1.5);
        assert!(format.encode("f", &sample_postings()).is_err());
    }
}
