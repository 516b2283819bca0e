//! # flexcodec
//!
//! Field-scoped codec dispatch for segment-based search indexes.
//!
//! A field name carries the strategy it wants: `title<lucene_4_1>` stores its postings with
//! the `lucene_4_1` strategy, `price[memory]` stores its doc values with `memory`. The
//! [`PerFieldCodec`](codec::PerFieldCodec) resolves those tags against per-namespace
//! registries and hands everything else to a base codec.
//!
//! ## Features
//!
//! - Independent postings (`<tag>`) and doc-values (`[tag]`) namespaces
//! - Built-in postings strategies: standard, direct, memory, pulsing, bloom filtering
//! - Built-in doc-values strategies: two columnar versions, direct, memory
//! - JSON codec configuration
//! - Segment writer and reader that record and verify the strategy of every field
//! - Pluggable storage backends (memory, file system)

pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod segment;
pub mod storage;
pub mod util;

pub mod prelude {
    pub use crate::codec::{Codec, PerFieldCodec, StandardCodec};
    pub use crate::config::{CodecConfig, UntaggedFieldPolicy};
    pub use crate::error::{FlexCodecError, Result};
    pub use crate::segment::{IndexableField, SegmentDocument, SegmentReader, SegmentWriter};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
