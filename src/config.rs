//! Codec configuration.
//!
//! A [`CodecConfig`] describes which built-in strategies a
//! [`PerFieldCodec`](crate::codec::PerFieldCodec) registers and how it treats untagged
//! fields. Every key is optional; an empty JSON object yields the default codec.
//!
//! ```
//! use flexcodec::config::CodecConfig;
//!
//! let config = CodecConfig::from_json_str(r#"{
//!     "postings": { "enabled": ["lucene_4_1", "pulsing_4_1"] },
//!     "doc_values": { "untagged": { "policy": "fallback", "tag": "lucene_4_10" } },
//!     "pulsing_cutoff": 2
//! }"#).unwrap();
//! assert_eq!(config.pulsing_cutoff, 2);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codec::catalog::CatalogOptions;
use crate::codec::postings::bloom::DEFAULT_FALSE_POSITIVE_RATE;
use crate::codec::postings::pulsing::DEFAULT_PULSING_CUTOFF;
use crate::codec::tag::StrategyTag;
use crate::error::{FlexCodecError, Result};

pub use crate::codec::dispatch::UntaggedFieldPolicy;

/// Name recorded by a [`PerFieldCodec`](crate::codec::PerFieldCodec) unless configured.
pub const DEFAULT_CODEC_NAME: &str = "PerField41";

fn default_codec_name() -> String {
    DEFAULT_CODEC_NAME.to_string()
}

fn default_true() -> bool {
    true
}

fn default_pulsing_cutoff() -> u32 {
    DEFAULT_PULSING_CUTOFF
}

fn default_bloom_rate() -> f64 {
    DEFAULT_FALSE_POSITIVE_RATE
}

/// Settings of one namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamespaceConfig {
    /// Built-in tags to register. `None` registers all of them.
    #[serde(default)]
    pub enabled: Option<Vec<StrategyTag>>,

    /// Handling of fields without a tag for this namespace.
    #[serde(default)]
    pub untagged: UntaggedFieldPolicy,
}

impl NamespaceConfig {
    /// The enabled tags as string slices, if restricted.
    pub fn enabled_tags(&self) -> Option<Vec<&str>> {
        self.enabled
            .as_ref()
            .map(|tags| tags.iter().map(StrategyTag::as_str).collect())
    }
}

/// Configuration of a per-field codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodecConfig {
    /// Codec name recorded in written segments.
    #[serde(default = "default_codec_name")]
    pub name: String,

    /// Postings namespace.
    #[serde(default)]
    pub postings: NamespaceConfig,

    /// Doc-values namespace.
    #[serde(default)]
    pub doc_values: NamespaceConfig,

    /// Dispatch doc values per field. When false, every doc-values request goes to the
    /// base codec and `doc_values` is ignored.
    #[serde(default = "default_true")]
    pub per_field_doc_values: bool,

    /// Document-frequency cutoff of `pulsing_4_1`.
    #[serde(default = "default_pulsing_cutoff")]
    pub pulsing_cutoff: u32,

    /// Target false-positive rate of `bloom_4_1`.
    #[serde(default = "default_bloom_rate")]
    pub bloom_false_positive_rate: f64,
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig {
            name: default_codec_name(),
            postings: NamespaceConfig::default(),
            doc_values: NamespaceConfig::default(),
            per_field_doc_values: true,
            pulsing_cutoff: DEFAULT_PULSING_CUTOFF,
            bloom_false_positive_rate: DEFAULT_FALSE_POSITIVE_RATE,
        }
    }
}

impl CodecConfig {
    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: CodecConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FlexCodecError::invalid_config(format!(
                "Failed to read config {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&content)
    }

    /// Serialize as pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Options handed to the built-in strategies.
    pub fn catalog_options(&self) -> CatalogOptions {
        CatalogOptions {
            pulsing_cutoff: self.pulsing_cutoff,
            bloom_false_positive_rate: self.bloom_false_positive_rate,
        }
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(FlexCodecError::invalid_config("codec name must not be empty"));
        }
        self.catalog_options().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config = CodecConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CodecConfig::default());
        assert!(config.postings.enabled_tags().is_none());
        assert_eq!(config.postings.untagged, UntaggedFieldPolicy::Reject);
    }

    #[test]
    fn test_full_config() {
        let config = CodecConfig::from_json_str(
            r#"{
                "name": "Custom",
                "postings": {
                    "enabled": ["memory", "bloom_4_1"],
                    "untagged": { "policy": "fallback", "tag": "memory" }
                },
                "per_field_doc_values": false,
                "bloom_false_positive_rate": 0.05
            }"#,
        )
        .unwrap();

        assert_eq!(config.name, "Custom");
        assert_eq!(
            config.postings.enabled_tags(),
            Some(vec!["memory", "bloom_4_1"])
        );
        assert_eq!(
            config.postings.untagged,
            UntaggedFieldPolicy::fallback("memory")
        );
        assert!(!config.per_field_doc_values);
        assert_eq!(config.catalog_options().bloom_false_positive_rate, 0.05);
    }

    #[test]
    fn test_rejects_unknown_keys_and_bad_values() {
        assert!(CodecConfig::from_json_str(r#"{"postngs": {}}"#).is_err());
        assert!(CodecConfig::from_json_str(r#"{"bloom_false_positive_rate": 2.0}"#).is_err());
        assert!(CodecConfig::from_json_str(r#"{"name": " "}"#).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("codec.json");
        std::fs::write(&path, CodecConfig::default().to_json_pretty().unwrap()).unwrap();
        assert_eq!(CodecConfig::from_file(&path).unwrap(), CodecConfig::default());
        assert!(CodecConfig::from_file(dir.path().join("missing.json")).is_err());
    }
}
