//! Built-in strategies and the tags they are registered under.
//!
//! | namespace  | tag           | strategy                                   |
//! |------------|---------------|--------------------------------------------|
//! | postings   | `lucene_4_1`  | [`StandardPostingsFormat`]                 |
//! | postings   | `direct`      | [`DirectPostingsFormat`]                   |
//! | postings   | `memory`      | [`MemoryPostingsFormat`]                   |
//! | postings   | `pulsing_4_1` | [`PulsingPostingsFormat`] over `lucene_4_1`|
//! | postings   | `bloom_4_1`   | [`BloomFilteringPostingsFormat`] over `lucene_4_1` |
//! | doc values | `lucene_4_10` | [`ColumnarDocValuesFormat::v410`]          |
//! | doc values | `lucene_4_9`  | [`ColumnarDocValuesFormat::v49`]           |
//! | doc values | `direct`      | [`DirectDocValuesFormat`]                  |
//! | doc values | `memory`      | [`MemoryDocValuesFormat`]                  |

use std::sync::Arc;

use crate::codec::doc_values::{
    ColumnarDocValuesFormat, DirectDocValuesFormat, DocValuesFormat, MemoryDocValuesFormat,
};
use crate::codec::namespace::FormatNamespace;
use crate::codec::postings::bloom::DEFAULT_FALSE_POSITIVE_RATE;
use crate::codec::postings::pulsing::DEFAULT_PULSING_CUTOFF;
use crate::codec::postings::{
    BloomFilteringPostingsFormat, DirectPostingsFormat, MemoryPostingsFormat, PostingsFormat,
    PulsingPostingsFormat, StandardPostingsFormat,
};
use crate::codec::registry::FormatRegistry;
use crate::codec::tag::StrategyTag;
use crate::error::{FlexCodecError, Result};

/// Built-in postings tags, sorted.
pub const POSTINGS_TAGS: &[&str] = &["bloom_4_1", "direct", "lucene_4_1", "memory", "pulsing_4_1"];

/// Built-in doc-values tags, sorted.
pub const DOC_VALUES_TAGS: &[&str] = &["direct", "lucene_4_10", "lucene_4_9", "memory"];

/// Tunables of the built-in strategies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogOptions {
    /// Document-frequency cutoff of `pulsing_4_1`.
    pub pulsing_cutoff: u32,
    /// Target false-positive rate of `bloom_4_1`.
    pub bloom_false_positive_rate: f64,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        CatalogOptions {
            pulsing_cutoff: DEFAULT_PULSING_CUTOFF,
            bloom_false_positive_rate: DEFAULT_FALSE_POSITIVE_RATE,
        }
    }
}

impl CatalogOptions {
    /// Reject values the strategies cannot work with.
    pub fn validate(&self) -> Result<()> {
        let rate = self.bloom_false_positive_rate;
        if !(rate > 0.0 && rate < 1.0) {
            return Err(FlexCodecError::invalid_config(format!(
                "bloom_false_positive_rate must be in (0, 1), got {rate}"
            )));
        }
        Ok(())
    }
}

/// Build the postings strategy registered under `tag`, if it is built in.
pub fn postings_format(tag: &str, options: &CatalogOptions) -> Option<Arc<dyn PostingsFormat>> {
    let format: Arc<dyn PostingsFormat> = match tag {
        "lucene_4_1" => Arc::new(StandardPostingsFormat::new()),
        "direct" => Arc::new(DirectPostingsFormat::new()),
        "memory" => Arc::new(MemoryPostingsFormat::new()),
        "pulsing_4_1" => Arc::new(PulsingPostingsFormat::with_cutoff(options.pulsing_cutoff)),
        "bloom_4_1" => Arc::new(BloomFilteringPostingsFormat::wrapping(
            Arc::new(StandardPostingsFormat::new()),
            options.bloom_false_positive_rate,
        )),
        _ => return None,
    };
    Some(format)
}

/// Build the doc-values strategy registered under `tag`, if it is built in.
pub fn doc_values_format(tag: &str) -> Option<Arc<dyn DocValuesFormat>> {
    let format: Arc<dyn DocValuesFormat> = match tag {
        "lucene_4_10" => Arc::new(ColumnarDocValuesFormat::v410()),
        "lucene_4_9" => Arc::new(ColumnarDocValuesFormat::v49()),
        "direct" => Arc::new(DirectDocValuesFormat::new()),
        "memory" => Arc::new(MemoryDocValuesFormat::new()),
        _ => return None,
    };
    Some(format)
}

/// Registry with every built-in postings strategy.
pub fn postings_registry(options: &CatalogOptions) -> Result<FormatRegistry<dyn PostingsFormat>> {
    postings_registry_with(POSTINGS_TAGS.iter().copied(), options)
}

/// Registry with the built-in postings strategies named in `enabled`.
///
/// An unknown name fails with [`FlexCodecError::UnknownStrategyTag`]; an empty selection
/// fails with [`FlexCodecError::EmptyRegistry`].
pub fn postings_registry_with<'a, I>(
    enabled: I,
    options: &CatalogOptions,
) -> Result<FormatRegistry<dyn PostingsFormat>>
where
    I: IntoIterator<Item = &'a str>,
{
    options.validate()?;
    let entries = enabled
        .into_iter()
        .map(|tag| {
            postings_format(tag, options)
                .map(|format| (StrategyTag::from(tag), format))
                .ok_or_else(|| unknown(FormatNamespace::Postings, tag))
        })
        .collect::<Result<Vec<_>>>()?;
    FormatRegistry::new(FormatNamespace::Postings, entries)
}

/// Registry with every built-in doc-values strategy.
pub fn doc_values_registry() -> Result<FormatRegistry<dyn DocValuesFormat>> {
    doc_values_registry_with(DOC_VALUES_TAGS.iter().copied())
}

/// Registry with the built-in doc-values strategies named in `enabled`.
pub fn doc_values_registry_with<'a, I>(enabled: I) -> Result<FormatRegistry<dyn DocValuesFormat>>
where
    I: IntoIterator<Item = &'a str>,
{
    let entries = enabled
        .into_iter()
        .map(|tag| {
            doc_values_format(tag)
                .map(|format| (StrategyTag::from(tag), format))
                .ok_or_else(|| unknown(FormatNamespace::DocValues, tag))
        })
        .collect::<Result<Vec<_>>>()?;
    FormatRegistry::new(FormatNamespace::DocValues, entries)
}

fn unknown(namespace: FormatNamespace, tag: &str) -> FlexCodecError {
    FlexCodecError::UnknownStrategyTag {
        namespace,
        tag: tag.to_string(),
        field: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registries() {
        let postings = postings_registry(&CatalogOptions::default()).unwrap();
        let tags: Vec<&str> = postings.tags().into_iter().map(|t| t.as_str()).collect();
        assert_eq!(tags, POSTINGS_TAGS);

        let doc_values = doc_values_registry().unwrap();
        let tags: Vec<&str> = doc_values.tags().into_iter().map(|t| t.as_str()).collect();
        assert_eq!(tags, DOC_VALUES_TAGS);
    }

    #[test]
    fn test_strategy_names() {
        let options = CatalogOptions::default();
        let names: Vec<String> = POSTINGS_TAGS
            .iter()
            .map(|tag| postings_format(tag, &options).unwrap().name().to_string())
            .collect();
        assert_eq!(
            names,
            ["BloomFilter41", "Direct", "Standard41", "Memory", "Pulsing41"]
        );
        assert!(postings_format("lucene_5_0", &options).is_none());
        assert!(doc_values_format("lucene_5_0").is_none());
    }

    #[test]
    fn test_enabled_subset() {
        let registry =
            postings_registry_with(["memory", "direct"], &CatalogOptions::default()).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(!registry.contains("lucene_4_1"));
    }

    #[test]
    fn test_enabled_errors() {
        let options = CatalogOptions::default();
        assert!(matches!(
            postings_registry_with(["lucene_9_9"], &options),
            Err(FlexCodecError::UnknownStrategyTag { .. })
        ));
        assert!(matches!(
            doc_values_registry_with(std::iter::empty()),
            Err(FlexCodecError::EmptyRegistry { .. })
        ));
        assert!(matches!(
            postings_registry_with(["memory", "memory"], &options),
            Err(FlexCodecError::DuplicateStrategyTag { .. })
        ));
    }

    #[test]
    fn test_invalid_options() {
        let options = CatalogOptions {
            bloom_false_positive_rate: 0.0,
            ..CatalogOptions::default()
        };
        assert!(postings_registry(&options).is_err());
    }
}
