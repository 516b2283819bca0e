//! Segment info (`.si`) as a JSON document.

use crate::codec::SegmentInfoFormat;
use crate::error::Result;
use crate::segment::SegmentInfo;

/// Human-readable segment metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSegmentInfoFormat;

impl JsonSegmentInfoFormat {
    pub fn new() -> Self {
        JsonSegmentInfoFormat
    }
}

impl SegmentInfoFormat for JsonSegmentInfoFormat {
    fn name(&self) -> &str {
        "JsonSegmentInfo"
    }

    fn write(&self, info: &SegmentInfo) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(info)?)
    }

    fn read(&self, bytes: &[u8]) -> Result<SegmentInfo> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
