//! The per-field codec facade.
//!
//! [`PerFieldCodec`] presents a complete [`Codec`] built from three parts: a base
//! delegate codec that supplies every per-segment format, a postings dispatcher, and an
//! optional doc-values dispatcher. Without a doc-values dispatcher doc values come from
//! the delegate as well.
//!
//! Three ways to construct one:
//!
//! - [`PerFieldCodec::new`]: built-in registries over [`StandardCodec`]
//! - [`PerFieldCodec::builder`]: any delegate, registries and untagged policies
//! - [`PerFieldCodec::from_config`]: built-in strategies selected by a [`CodecConfig`]

use std::sync::Arc;

use log::info;

use crate::codec::catalog::{self, CatalogOptions};
use crate::codec::dispatch::{
    PerFieldDispatcher, PerFieldDocValuesDispatcher, PerFieldPostingsDispatcher,
    UntaggedFieldPolicy,
};
use crate::codec::doc_values::DocValuesFormat;
use crate::codec::namespace::FormatNamespace;
use crate::codec::postings::PostingsFormat;
use crate::codec::registry::FormatRegistry;
use crate::codec::standard::StandardCodec;
use crate::codec::{
    Codec, CompoundFormat, LiveDocsFormat, NormsFormat, SegmentInfoFormat, StoredFieldsFormat,
    TermVectorsFormat,
};
use crate::config::{CodecConfig, DEFAULT_CODEC_NAME};
use crate::error::{FlexCodecError, Result};

/// Codec choosing postings and doc-values strategies from field names.
#[derive(Debug, Clone)]
pub struct PerFieldCodec {
    name: String,
    delegate: Arc<dyn Codec>,
    postings: PerFieldPostingsDispatcher,
    doc_values: Option<PerFieldDocValuesDispatcher>,
}

impl PerFieldCodec {
    /// Default mode: every built-in strategy over a [`StandardCodec`].
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Explicit mode.
    pub fn builder() -> PerFieldCodecBuilder {
        PerFieldCodecBuilder::default()
    }

    /// Built-in strategies as selected by `config`, over a [`StandardCodec`].
    pub fn from_config(config: &CodecConfig) -> Result<Self> {
        config.validate()?;
        let options = config.catalog_options();

        let postings = match config.postings.enabled_tags() {
            Some(tags) => catalog::postings_registry_with(tags, &options)?,
            None => catalog::postings_registry(&options)?,
        };

        let mut builder = Self::builder()
            .name(config.name.clone())
            .postings_registry(postings)
            .postings_untagged(config.postings.untagged.clone());

        if config.per_field_doc_values {
            let doc_values = match config.doc_values.enabled_tags() {
                Some(tags) => catalog::doc_values_registry_with(tags)?,
                None => catalog::doc_values_registry()?,
            };
            builder = builder
                .doc_values_registry(doc_values)
                .doc_values_untagged(config.doc_values.untagged.clone());
        } else {
            builder = builder.delegate_doc_values();
        }

        builder.build()
    }

    /// The base codec non-per-field requests are forwarded to.
    pub fn delegate(&self) -> &Arc<dyn Codec> {
        &self.delegate
    }

    pub fn postings_dispatcher(&self) -> &PerFieldPostingsDispatcher {
        &self.postings
    }

    /// `None` when doc values are taken from the delegate.
    pub fn doc_values_dispatcher(&self) -> Option<&PerFieldDocValuesDispatcher> {
        self.doc_values.as_ref()
    }
}

impl Codec for PerFieldCodec {
    fn name(&self) -> &str {
        &self.name
    }

    fn postings_format_for_field(&self, field: &str) -> Result<Arc<dyn PostingsFormat>> {
        self.postings.format_for_field(field)
    }

    fn doc_values_format_for_field(&self, field: &str) -> Result<Arc<dyn DocValuesFormat>> {
        match &self.doc_values {
            Some(dispatcher) => dispatcher.format_for_field(field),
            None => self.delegate.doc_values_format_for_field(field),
        }
    }

    fn stored_fields_format(&self) -> Arc<dyn StoredFieldsFormat> {
        self.delegate.stored_fields_format()
    }

    fn term_vectors_format(&self) -> Arc<dyn TermVectorsFormat> {
        self.delegate.term_vectors_format()
    }

    fn norms_format(&self) -> Arc<dyn NormsFormat> {
        self.delegate.norms_format()
    }

    fn segment_info_format(&self) -> Arc<dyn SegmentInfoFormat> {
        self.delegate.segment_info_format()
    }

    fn live_docs_format(&self) -> Arc<dyn LiveDocsFormat> {
        self.delegate.live_docs_format()
    }

    fn compound_format(&self) -> Arc<dyn CompoundFormat> {
        self.delegate.compound_format()
    }
}

/// Builder for [`PerFieldCodec`]. Anything left unset takes the default-mode value.
#[derive(Debug)]
pub struct PerFieldCodecBuilder {
    name: Option<String>,
    delegate: Option<Arc<dyn Codec>>,
    postings_registry: Option<FormatRegistry<dyn PostingsFormat>>,
    postings_untagged: UntaggedFieldPolicy,
    doc_values_registry: Option<FormatRegistry<dyn DocValuesFormat>>,
    doc_values_untagged: UntaggedFieldPolicy,
    per_field_doc_values: bool,
}

impl Default for PerFieldCodecBuilder {
    fn default() -> Self {
        PerFieldCodecBuilder {
            name: None,
            delegate: None,
            postings_registry: None,
            postings_untagged: UntaggedFieldPolicy::Reject,
            doc_values_registry: None,
            doc_values_untagged: UntaggedFieldPolicy::Reject,
            per_field_doc_values: true,
        }
    }
}

impl PerFieldCodecBuilder {
    /// Codec name recorded in written segments.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Base codec for everything except per-field postings and doc values.
    pub fn delegate(mut self, delegate: Arc<dyn Codec>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    pub fn postings_registry(mut self, registry: FormatRegistry<dyn PostingsFormat>) -> Self {
        self.postings_registry = Some(registry);
        self
    }

    pub fn postings_untagged(mut self, policy: UntaggedFieldPolicy) -> Self {
        self.postings_untagged = policy;
        self
    }

    pub fn doc_values_registry(mut self, registry: FormatRegistry<dyn DocValuesFormat>) -> Self {
        self.doc_values_registry = Some(registry);
        self.per_field_doc_values = true;
        self
    }

    pub fn doc_values_untagged(mut self, policy: UntaggedFieldPolicy) -> Self {
        self.doc_values_untagged = policy;
        self
    }

    /// Take doc values from the delegate instead of dispatching per field.
    pub fn delegate_doc_values(mut self) -> Self {
        self.doc_values_registry = None;
        self.per_field_doc_values = false;
        self
    }

    pub fn build(self) -> Result<PerFieldCodec> {
        let name = self.name.unwrap_or_else(|| DEFAULT_CODEC_NAME.to_string());
        if name.trim().is_empty() {
            return Err(FlexCodecError::invalid_config("codec name must not be empty"));
        }

        let delegate: Arc<dyn Codec> = match self.delegate {
            Some(delegate) => delegate,
            None => Arc::new(StandardCodec::new()),
        };

        let postings_registry = match self.postings_registry {
            Some(registry) => registry,
            None => catalog::postings_registry(&CatalogOptions::default())?,
        };
        expect_namespace(postings_registry.namespace(), FormatNamespace::Postings)?;
        let postings =
            PerFieldDispatcher::with_untagged_policy(postings_registry, self.postings_untagged)?;

        let doc_values = if self.per_field_doc_values {
            let registry = match self.doc_values_registry {
                Some(registry) => registry,
                None => catalog::doc_values_registry()?,
            };
            expect_namespace(registry.namespace(), FormatNamespace::DocValues)?;
            Some(PerFieldDispatcher::with_untagged_policy(
                registry,
                self.doc_values_untagged,
            )?)
        } else {
            None
        };

        info!(
            "Built codec '{name}' over '{}' with {} postings and {} doc-values strategies",
            delegate.name(),
            postings.registry().len(),
            doc_values
                .as_ref()
                .map_or_else(|| "delegated".to_string(), |d| d.registry().len().to_string()),
        );

        Ok(PerFieldCodec {
            name,
            delegate,
            postings,
            doc_values,
        })
    }
}

fn expect_namespace(found: FormatNamespace, expected: FormatNamespace) -> Result<()> {
    if found != expected {
        return Err(FlexCodecError::invalid_config(format!(
            "A {found} registry cannot serve the {expected} namespace"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::postings::{FieldPostings, MemoryPostingsFormat};
    use crate::codec::tag::MalformedTagReason;

    /// Stands in for an externally supplied base codec.
    #[derive(Debug)]
    struct FakeDelegate {
        inner: StandardCodec,
    }

    impl Codec for FakeDelegate {
        fn name(&self) -> &str {
            "Fake"
        }

        fn postings_format_for_field(&self, field: &str) -> Result<Arc<dyn PostingsFormat>> {
            self.inner.postings_format_for_field(field)
        }

        fn doc_values_format_for_field(&self, field: &str) -> Result<Arc<dyn DocValuesFormat>> {
            self.inner.doc_values_format_for_field(field)
        }

        fn stored_fields_format(&self) -> Arc<dyn StoredFieldsFormat> {
            self.inner.stored_fields_format()
        }

        fn term_vectors_format(&self) -> Arc<dyn TermVectorsFormat> {
            self.inner.term_vectors_format()
        }

        fn norms_format(&self) -> Arc<dyn NormsFormat> {
            self.inner.norms_format()
        }

        fn segment_info_format(&self) -> Arc<dyn SegmentInfoFormat> {
            self.inner.segment_info_format()
        }

        fn live_docs_format(&self) -> Arc<dyn LiveDocsFormat> {
            self.inner.live_docs_format()
        }

        fn compound_format(&self) -> Arc<dyn CompoundFormat> {
            self.inner.compound_format()
        }
    }

    #[test]
    fn test_default_mode() {
        let codec = PerFieldCodec::new().unwrap();
        assert_eq!(codec.name(), DEFAULT_CODEC_NAME);
        assert_eq!(codec.delegate().name(), "Flex41");
        assert_eq!(
            codec.postings_format_for_field("id<pulsing_4_1>").unwrap().name(),
            "Pulsing41"
        );
        assert_eq!(
            codec.doc_values_format_for_field("year[lucene_4_9]").unwrap().name(),
            "Columnar49"
        );
    }

    #[test]
    fn test_segment_formats_forward_to_delegate() {
        let delegate: Arc<dyn Codec> = Arc::new(StandardCodec::new());
        let codec = PerFieldCodec::builder()
            .delegate(Arc::clone(&delegate))
            .build()
            .unwrap();

        assert!(Arc::ptr_eq(&codec.stored_fields_format(), &delegate.stored_fields_format()));
        assert!(Arc::ptr_eq(&codec.term_vectors_format(), &delegate.term_vectors_format()));
        assert!(Arc::ptr_eq(&codec.norms_format(), &delegate.norms_format()));
        assert!(Arc::ptr_eq(&codec.segment_info_format(), &delegate.segment_info_format()));
        assert!(Arc::ptr_eq(&codec.live_docs_format(), &delegate.live_docs_format()));
        assert!(Arc::ptr_eq(&codec.compound_format(), &delegate.compound_format()));
    }

    #[test]
    fn test_explicit_registry_and_fake_delegate() {
        let memory: Arc<dyn PostingsFormat> = Arc::new(MemoryPostingsFormat::new());
        let registry = FormatRegistry::new(
            FormatNamespace::Postings,
            [("strategy_a", Arc::clone(&memory))],
        )
        .unwrap();

        let codec = PerFieldCodec::builder()
            .name("Test")
            .delegate(Arc::new(FakeDelegate {
                inner: StandardCodec::new(),
            }))
            .postings_registry(registry)
            .delegate_doc_values()
            .build()
            .unwrap();

        let resolved = codec.postings_format_for_field("title<strategy_a>").unwrap();
        assert!(Arc::ptr_eq(&resolved, &memory));
        assert!(codec.postings_format_for_field("title<lucene_4_1>").is_err());

        // No doc-values dispatcher: the delegate answers, tags or not.
        assert!(codec.doc_values_dispatcher().is_none());
        assert_eq!(
            codec.doc_values_format_for_field("plain").unwrap().name(),
            "Columnar410"
        );

        let bytes = resolved.encode("title<strategy_a>", &FieldPostings::new()).unwrap();
        assert!(resolved.decode(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_untagged_doc_values_with_dispatcher() {
        let codec = PerFieldCodec::new().unwrap();
        assert!(matches!(
            codec.doc_values_format_for_field("plain"),
            Err(FlexCodecError::MalformedFieldTag {
                namespace: FormatNamespace::DocValues,
                reason: MalformedTagReason::MissingDelimiters,
                ..
            })
        ));
    }

    #[test]
    fn test_registry_namespace_checked() {
        let wrong = FormatRegistry::<dyn PostingsFormat>::builder(FormatNamespace::DocValues)
            .register("memory", Arc::new(MemoryPostingsFormat::new()))
            .build()
            .unwrap();
        let result = PerFieldCodec::builder().postings_registry(wrong).build();
        assert!(matches!(result, Err(FlexCodecError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_config() {
        let config = CodecConfig::from_json_str(
            r#"{
                "postings": {
                    "enabled": ["lucene_4_1", "memory"],
                    "untagged": { "policy": "fallback", "tag": "lucene_4_1" }
                },
                "doc_values": { "enabled": ["direct"] }
            }"#,
        )
        .unwrap();
        let codec = PerFieldCodec::from_config(&config).unwrap();

        assert_eq!(codec.postings_format_for_field("plain").unwrap().name(), "Standard41");
        assert!(codec.postings_format_for_field("f<bloom_4_1>").is_err());
        assert_eq!(
            codec.doc_values_format_for_field("f[direct]").unwrap().name(),
            "DirectDocValues"
        );
        assert!(codec.doc_values_format_for_field("f[memory]").is_err());
    }

    #[test]
    fn test_from_config_fallback_must_be_enabled() {
        let config = CodecConfig::from_json_str(
            r#"{"postings": {
                "enabled": ["memory"],
                "untagged": {"policy": "fallback", "tag": "direct"}
            }}"#,
        )
        .unwrap();
        assert!(PerFieldCodec::from_config(&config).is_err());
    }
}
