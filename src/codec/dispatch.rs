//! Per-field strategy dispatch.
//!
//! A [`PerFieldDispatcher`] pairs a [`FieldTagResolver`] with the [`FormatRegistry`] of
//! the same namespace. Asking it for a field's format extracts the tag from the field
//! name and looks the tag up; nothing is cached, and the returned strategy is the very
//! `Arc` stored in the registry, so repeated calls hand out the same instance.
//!
//! The postings and doc-values dispatchers are two instances of the same type and never
//! consult each other: `body<bloom_4_1>[memory]` resolves `bloom_4_1` for postings and
//! `memory` for doc values, and a field without `[...]` only fails when doc values are
//! actually requested for it.

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::codec::doc_values::DocValuesFormat;
use crate::codec::namespace::FormatNamespace;
use crate::codec::postings::PostingsFormat;
use crate::codec::registry::FormatRegistry;
use crate::codec::tag::{FieldTagResolver, MalformedTagReason, StrategyTag};
use crate::error::{FlexCodecError, Result};

/// What to do with a field that carries no tag for the namespace at all.
///
/// Only a field containing neither delimiter counts as untagged. A lone delimiter or an
/// empty tag is always reported as [`FlexCodecError::MalformedFieldTag`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum UntaggedFieldPolicy {
    /// Fail with `MalformedFieldTag` (reason `MissingDelimiters`).
    #[default]
    Reject,
    /// Resolve untagged fields to the strategy registered under `tag`.
    Fallback { tag: StrategyTag },
}

impl UntaggedFieldPolicy {
    /// Fall back to `tag`.
    pub fn fallback(tag: impl Into<StrategyTag>) -> Self {
        UntaggedFieldPolicy::Fallback { tag: tag.into() }
    }
}

/// Resolves fields of one namespace to strategies of type `F`.
pub struct PerFieldDispatcher<F: ?Sized> {
    resolver: FieldTagResolver,
    registry: FormatRegistry<F>,
    untagged: UntaggedFieldPolicy,
}

/// Dispatcher over postings strategies (`<tag>`).
pub type PerFieldPostingsDispatcher = PerFieldDispatcher<dyn PostingsFormat>;

/// Dispatcher over doc-values strategies (`[tag]`).
pub type PerFieldDocValuesDispatcher = PerFieldDispatcher<dyn DocValuesFormat>;

impl<F: ?Sized> PerFieldDispatcher<F> {
    /// Dispatch over `registry`, rejecting untagged fields.
    pub fn new(registry: FormatRegistry<F>) -> Self {
        PerFieldDispatcher {
            resolver: FieldTagResolver::new(registry.namespace()),
            registry,
            untagged: UntaggedFieldPolicy::Reject,
        }
    }

    /// Dispatch over `registry` with an explicit untagged-field policy.
    ///
    /// A fallback tag must be registered; otherwise this fails with
    /// [`FlexCodecError::UnknownStrategyTag`].
    pub fn with_untagged_policy(
        registry: FormatRegistry<F>,
        untagged: UntaggedFieldPolicy,
    ) -> Result<Self> {
        if let UntaggedFieldPolicy::Fallback { tag } = &untagged {
            registry.lookup(tag.as_str())?;
        }

        Ok(PerFieldDispatcher {
            resolver: FieldTagResolver::new(registry.namespace()),
            registry,
            untagged,
        })
    }

    /// The namespace this dispatcher serves.
    pub fn namespace(&self) -> FormatNamespace {
        self.resolver.namespace()
    }

    /// The registry strategies are looked up in.
    pub fn registry(&self) -> &FormatRegistry<F> {
        &self.registry
    }

    /// The untagged-field policy.
    pub fn untagged_policy(&self) -> &UntaggedFieldPolicy {
        &self.untagged
    }

    /// The tag `field` resolves to, without looking it up.
    pub fn tag_for_field<'a>(&'a self, field: &'a str) -> Result<&'a str> {
        match (&self.untagged, self.resolver.resolve(field)) {
            (
                UntaggedFieldPolicy::Fallback { tag },
                Err(FlexCodecError::MalformedFieldTag {
                    reason: MalformedTagReason::MissingDelimiters,
                    ..
                }),
            ) => Ok(tag.as_str()),
            (_, resolved) => resolved,
        }
    }

    /// The strategy registered for `field`'s tag.
    pub fn format_for_field(&self, field: &str) -> Result<Arc<F>> {
        let tag = self.tag_for_field(field)?;
        let format = self
            .registry
            .lookup(tag)
            .map_err(|e| e.with_field(field))?;

        debug!(
            "Resolved {} strategy '{tag}' for field '{field}'",
            self.namespace()
        );
        Ok(Arc::clone(format))
    }
}

impl<F: ?Sized> Clone for PerFieldDispatcher<F> {
    fn clone(&self) -> Self {
        PerFieldDispatcher {
            resolver: self.resolver.clone(),
            registry: self.registry.clone(),
            untagged: self.untagged.clone(),
        }
    }
}

impl<F: ?Sized> std::fmt::Debug for PerFieldDispatcher<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerFieldDispatcher")
            .field("namespace", &self.namespace())
            .field("registry", &self.registry)
            .field("untagged", &self.untagged)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::doc_values::MemoryDocValuesFormat;
    use crate::codec::postings::{
        BloomFilteringPostingsFormat, MemoryPostingsFormat, StandardPostingsFormat,
    };

    fn postings_dispatcher() -> PerFieldPostingsDispatcher {
        let registry = FormatRegistry::<dyn PostingsFormat>::builder(FormatNamespace::Postings)
            .register("lucene_4_1", Arc::new(StandardPostingsFormat::new()))
            .register("bloom_4_1", Arc::new(BloomFilteringPostingsFormat::new()))
            .register("memory", Arc::new(MemoryPostingsFormat::new()))
            .build()
            .unwrap();
        PerFieldDispatcher::new(registry)
    }

    #[test]
    fn test_resolves_registered_instance() {
        let dispatcher = postings_dispatcher();
        let registered = Arc::clone(dispatcher.registry().lookup("lucene_4_1").unwrap());

        let resolved = dispatcher.format_for_field("title<lucene_4_1>").unwrap();
        assert!(Arc::ptr_eq(&resolved, &registered));
    }

    #[test]
    fn test_repeated_calls_return_same_instance() {
        let dispatcher = postings_dispatcher();
        let a = dispatcher.format_for_field("id<bloom_4_1>").unwrap();
        let b = dispatcher.format_for_field("id<bloom_4_1>").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_untagged_field_rejected_by_default() {
        let dispatcher = postings_dispatcher();
        let err = dispatcher.format_for_field("plain_field").unwrap_err();
        assert!(matches!(
            err,
            FlexCodecError::MalformedFieldTag {
                namespace: FormatNamespace::Postings,
                reason: MalformedTagReason::MissingDelimiters,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_tag_names_field() {
        let dispatcher = postings_dispatcher();
        match dispatcher.format_for_field("x<unknown_tag>").unwrap_err() {
            FlexCodecError::UnknownStrategyTag {
                namespace,
                tag,
                field,
            } => {
                assert_eq!(namespace, FormatNamespace::Postings);
                assert_eq!(tag, "unknown_tag");
                assert_eq!(field.as_deref(), Some("x<unknown_tag>"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fallback_only_for_fully_untagged_fields() {
        let registry = postings_dispatcher().registry().clone();
        let dispatcher = PerFieldDispatcher::with_untagged_policy(
            registry,
            UntaggedFieldPolicy::fallback("memory"),
        )
        .unwrap();

        assert_eq!(dispatcher.tag_for_field("plain_field").unwrap(), "memory");
        assert_eq!(
            dispatcher.format_for_field("plain_field").unwrap().name(),
            "Memory"
        );
        assert_eq!(dispatcher.tag_for_field("id<bloom_4_1>").unwrap(), "bloom_4_1");

        for malformed in ["broken<", "broken>", "empty<>"] {
            assert!(matches!(
                dispatcher.format_for_field(malformed),
                Err(FlexCodecError::MalformedFieldTag { .. })
            ));
        }
    }

    #[test]
    fn test_fallback_tag_must_be_registered() {
        let registry = postings_dispatcher().registry().clone();
        let result = PerFieldDispatcher::with_untagged_policy(
            registry,
            UntaggedFieldPolicy::fallback("direct"),
        );
        assert!(matches!(
            result,
            Err(FlexCodecError::UnknownStrategyTag { .. })
        ));
    }

    #[test]
    fn test_doc_values_namespace_is_independent() {
        let registry = FormatRegistry::<dyn DocValuesFormat>::builder(FormatNamespace::DocValues)
            .register("memory", Arc::new(MemoryDocValuesFormat::new()))
            .build()
            .unwrap();
        let doc_values = PerFieldDocValuesDispatcher::new(registry);
        let postings = postings_dispatcher();

        let field = "body<bloom_4_1>[memory]";
        assert_eq!(postings.format_for_field(field).unwrap().name(), "BloomFilter41");
        assert_eq!(doc_values.format_for_field(field).unwrap().name(), "MemoryDocValues");

        // Postings resolution ignores a malformed doc-values part and vice versa.
        assert!(postings.format_for_field("f<memory>[").is_ok());
        assert!(doc_values.format_for_field("f<[memory]").is_ok());
        assert!(doc_values.format_for_field("title<lucene_4_1>").is_err());
    }

    #[test]
    fn test_policy_serde() {
        let json = serde_json::to_string(&UntaggedFieldPolicy::fallback("memory")).unwrap();
        assert_eq!(json, r#"{"policy":"fallback","tag":"memory"}"#);
        let back: UntaggedFieldPolicy = serde_json::from_str(r#"{"policy":"reject"}"#).unwrap();
        assert_eq!(back, UntaggedFieldPolicy::Reject);
    }
}
