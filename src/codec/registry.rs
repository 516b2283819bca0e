//! Immutable tag-to-strategy registries.

use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;

use crate::codec::namespace::FormatNamespace;
use crate::codec::tag::StrategyTag;
use crate::error::{FlexCodecError, Result};

/// Read-only mapping from [`StrategyTag`] to a strategy of one namespace.
///
/// `F` is the strategy capability, normally `dyn PostingsFormat` or
/// `dyn DocValuesFormat`. The registry is validated once when built and offers no
/// mutation afterwards, so it can be shared across threads freely.
pub struct FormatRegistry<F: ?Sized> {
    namespace: FormatNamespace,
    formats: AHashMap<StrategyTag, Arc<F>>,
}

impl<F: ?Sized> FormatRegistry<F> {
    /// Build a registry from `(tag, strategy)` pairs.
    ///
    /// Fails with [`FlexCodecError::EmptyRegistry`] when `entries` is empty and with
    /// [`FlexCodecError::DuplicateStrategyTag`] when a tag repeats.
    pub fn new<T, I>(namespace: FormatNamespace, entries: I) -> Result<Self>
    where
        T: Into<StrategyTag>,
        I: IntoIterator<Item = (T, Arc<F>)>,
    {
        let mut formats = AHashMap::new();
        for (tag, format) in entries {
            let tag = tag.into();
            tag.validate(namespace)?;
            if formats.contains_key(&tag) {
                return Err(FlexCodecError::DuplicateStrategyTag {
                    namespace,
                    tag: tag.to_string(),
                });
            }
            formats.insert(tag, format);
        }

        if formats.is_empty() {
            return Err(FlexCodecError::EmptyRegistry { namespace });
        }

        Ok(FormatRegistry { namespace, formats })
    }

    /// Start a builder for `namespace`.
    pub fn builder(namespace: FormatNamespace) -> FormatRegistryBuilder<F> {
        FormatRegistryBuilder {
            namespace,
            entries: Vec::new(),
        }
    }

    /// The namespace this registry serves.
    pub fn namespace(&self) -> FormatNamespace {
        self.namespace
    }

    /// Look up the strategy registered under `tag`.
    pub fn lookup(&self, tag: &str) -> Result<&Arc<F>> {
        self.formats
            .get(tag)
            .ok_or_else(|| FlexCodecError::UnknownStrategyTag {
                namespace: self.namespace,
                tag: tag.to_string(),
                field: None,
            })
    }

    /// Whether `tag` is registered.
    pub fn contains(&self, tag: &str) -> bool {
        self.formats.contains_key(tag)
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&StrategyTag> {
        let mut tags: Vec<_> = self.formats.keys().collect();
        tags.sort();
        tags
    }

    /// Registered `(tag, strategy)` pairs, sorted by tag.
    pub fn entries(&self) -> Vec<(&StrategyTag, &Arc<F>)> {
        let mut entries: Vec<_> = self.formats.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Number of registered strategies.
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    /// Always false for a constructed registry.
    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

impl<F: ?Sized> Clone for FormatRegistry<F> {
    fn clone(&self) -> Self {
        FormatRegistry {
            namespace: self.namespace,
            formats: self.formats.clone(),
        }
    }
}

impl<F: ?Sized> fmt::Debug for FormatRegistry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("namespace", &self.namespace)
            .field("tags", &self.tags())
            .finish()
    }
}

/// Collects registrations before validating them in [`FormatRegistryBuilder::build`].
pub struct FormatRegistryBuilder<F: ?Sized> {
    namespace: FormatNamespace,
    entries: Vec<(StrategyTag, Arc<F>)>,
}

impl<F: ?Sized> FormatRegistryBuilder<F> {
    /// Register `format` under `tag`.
    pub fn register(mut self, tag: impl Into<StrategyTag>, format: Arc<F>) -> Self {
        self.entries.push((tag.into(), format));
        self
    }

    /// Validate and freeze the registrations.
    pub fn build(self) -> Result<FormatRegistry<F>> {
        FormatRegistry::new(self.namespace, self.entries)
    }
}
