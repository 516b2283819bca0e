//! Postings data model and the postings strategy capability.
//!
//! A [`PostingsFormat`] turns one field's [`FieldPostings`] into an opaque byte payload
//! and back. Which format handles a field is decided by the per-field dispatcher; the
//! formats themselves know nothing about field naming.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub mod bloom;
pub mod direct;
pub mod memory;
pub mod pulsing;
pub mod standard;

pub use bloom::BloomFilteringPostingsFormat;
pub use direct::DirectPostingsFormat;
pub use memory::MemoryPostingsFormat;
pub use pulsing::PulsingPostingsFormat;
pub use standard::StandardPostingsFormat;

/// A single posting in a posting list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Document ID.
    pub doc_id: u64,
    /// Term frequency in the document.
    pub frequency: u32,
    /// Positions of the term in the document (for phrase queries).
    pub positions: Option<Vec<u32>>,
}

impl Posting {
    /// Create a posting with frequency 1 and no positions.
    pub fn new(doc_id: u64) -> Self {
        Posting {
            doc_id,
            frequency: 1,
            positions: None,
        }
    }

    /// Create a posting with frequency.
    pub fn with_frequency(doc_id: u64, frequency: u32) -> Self {
        Posting {
            doc_id,
            frequency,
            positions: None,
        }
    }

    /// Create a posting with positions; the frequency is the number of positions.
    pub fn with_positions(doc_id: u64, positions: Vec<u32>) -> Self {
        Posting {
            doc_id,
            frequency: positions.len() as u32,
            positions: Some(positions),
        }
    }

    /// Add a position to this posting.
    pub fn add_position(&mut self, position: u32) {
        match &mut self.positions {
            Some(positions) => {
                positions.push(position);
                self.frequency = positions.len() as u32;
            }
            None => {
                self.positions = Some(vec![position]);
                self.frequency = 1;
            }
        }
    }
}

/// The postings of one term, sorted by doc id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingList {
    /// The postings in this list.
    pub postings: Vec<Posting>,
    /// Total frequency across all documents.
    pub total_frequency: u64,
}

impl PostingList {
    /// Create a new empty posting list.
    pub fn new() -> Self {
        PostingList::default()
    }

    /// Add a posting, keeping doc ids sorted and merging repeats of the same document.
    pub fn add_posting(&mut self, posting: Posting) {
        self.total_frequency += posting.frequency as u64;

        match self
            .postings
            .binary_search_by_key(&posting.doc_id, |p| p.doc_id)
        {
            Ok(pos) => {
                let existing = &mut self.postings[pos];
                existing.frequency += posting.frequency;

                if let Some(new_positions) = posting.positions {
                    match &mut existing.positions {
                        Some(positions) => {
                            positions.extend(new_positions);
                            positions.sort_unstable();
                        }
                        None => existing.positions = Some(new_positions),
                    }
                }
            }
            Err(pos) => {
                self.postings.insert(pos, posting);
            }
        }
    }

    /// Number of documents containing the term.
    pub fn doc_frequency(&self) -> u64 {
        self.postings.len() as u64
    }

    /// Get the length of the posting list.
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    /// Check if the posting list is empty.
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Whether any posting carries positions.
    pub fn has_positions(&self) -> bool {
        self.postings.iter().any(|p| p.positions.is_some())
    }
}

/// Everything one field contributes to the inverted index of a segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPostings {
    /// Term dictionary, sorted by term.
    pub terms: BTreeMap<String, PostingList>,
    /// Number of documents with at least one term in this field.
    pub doc_count: u64,
}

impl FieldPostings {
    /// Create an empty field postings.
    pub fn new() -> Self {
        FieldPostings::default()
    }

    /// Add one posting for `term`.
    pub fn add_posting(&mut self, term: impl Into<String>, posting: Posting) {
        self.terms.entry(term.into()).or_default().add_posting(posting);
    }

    /// Get a posting list for a term.
    pub fn get(&self, term: &str) -> Option<&PostingList> {
        self.terms.get(term)
    }

    /// Number of unique terms.
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Total number of postings across terms.
    pub fn posting_count(&self) -> usize {
        self.terms.values().map(PostingList::len).sum()
    }

    /// Check if there are no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Strategy capability for the postings namespace.
///
/// Implementations must be stateless or internally synchronized: a single instance is
/// shared by every field and segment that resolves to it.
pub trait PostingsFormat: Send + Sync + fmt::Debug {
    /// Stable name written into payload headers and segment metadata.
    fn name(&self) -> &str;

    /// Encode one field's postings.
    fn encode(&self, field: &str, postings: &FieldPostings) -> Result<Vec<u8>>;

    /// Decode a payload produced by [`PostingsFormat::encode`].
    fn decode(&self, bytes: &[u8]) -> Result<FieldPostings>;

    /// Whether `term` may occur in the payload.
    ///
    /// False negatives are not allowed. The default decodes the payload; formats with a
    /// cheaper membership structure override it.
    fn term_might_exist(&self, bytes: &[u8], term: &str) -> Result<bool> {
        Ok(self.decode(bytes)?.terms.contains_key(term))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posting_creation() {
        let posting = Posting::new(1);
        assert_eq!(posting.frequency, 1);
        assert_eq!(posting.positions, None);

        let posting = Posting::with_positions(3, vec![10, 20, 30]);
        assert_eq!(posting.frequency, 3);

        let mut posting = Posting::new(4);
        posting.add_position(7);
        assert_eq!(posting.positions, Some(vec![7]));
    }

    #[test]
    fn test_posting_list_sorted_and_merged() {
        let mut list = PostingList::new();
        list.add_posting(Posting::new(3));
        list.add_posting(Posting::new(1));
        list.add_posting(Posting::with_positions(2, vec![5]));
        list.add_posting(Posting::with_positions(2, vec![1]));

        let doc_ids: Vec<u64> = list.postings.iter().map(|p| p.doc_id).collect();
        assert_eq!(doc_ids, vec![1, 2, 3]);
        assert_eq!(list.doc_frequency(), 3);
        assert_eq!(list.total_frequency, 4);
        assert_eq!(list.postings[1].positions, Some(vec![1, 5]));
        assert_eq!(list.postings[1].frequency, 2);
    }

    #[test]
    fn test_field_postings_counts() {
        let postings = test_support::sample_postings();
        assert_eq!(postings.term_count(), 3);
        assert_eq!(postings.posting_count(), 5);
        assert!(postings.get("hello").is_some());
        assert!(postings.get("missing").is_none());
    }
}
