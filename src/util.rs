//! Shared utilities used by the codec strategies.

pub mod varint;
