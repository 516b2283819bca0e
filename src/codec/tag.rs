//! Strategy tags and their extraction from field identifiers.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::namespace::FormatNamespace;
use crate::error::{FlexCodecError, Result};

/// Short identifier selecting a strategy inside one namespace (`"memory"`, `"bloom_4_1"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrategyTag(String);

impl StrategyTag {
    /// Create a tag from any string.
    ///
    /// No validation happens here; registries reject tags that could never be
    /// extracted from a field name.
    pub fn new(tag: impl Into<String>) -> Self {
        StrategyTag(tag.into())
    }

    /// The tag text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check that the tag can be embedded in a field name of `namespace`.
    pub fn validate(&self, namespace: FormatNamespace) -> Result<()> {
        let (open, close) = namespace.delimiters();
        if self.0.is_empty() {
            return Err(FlexCodecError::invalid_config(format!(
                "{namespace} strategy tag must not be empty"
            )));
        }
        if self.0.contains(open) || self.0.contains(close) {
            return Err(FlexCodecError::invalid_config(format!(
                "{namespace} strategy tag '{}' must not contain '{open}' or '{close}'",
                self.0
            )));
        }
        Ok(())
    }
}

impl fmt::Display for StrategyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StrategyTag {
    fn from(tag: &str) -> Self {
        StrategyTag::new(tag)
    }
}

impl From<String> for StrategyTag {
    fn from(tag: String) -> Self {
        StrategyTag(tag)
    }
}

impl Borrow<str> for StrategyTag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Why a field identifier did not yield a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedTagReason {
    /// Neither delimiter occurs in the field name.
    MissingDelimiters,
    /// The closing delimiter occurs but the opening one does not.
    MissingOpenDelimiter,
    /// The opening delimiter is not followed by a closing one.
    UnclosedTag,
    /// The delimiters enclose nothing.
    EmptyTag,
}

impl fmt::Display for MalformedTagReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MalformedTagReason::MissingDelimiters => "no tag delimiters",
            MalformedTagReason::MissingOpenDelimiter => "closing delimiter without opening one",
            MalformedTagReason::UnclosedTag => "opening delimiter is never closed",
            MalformedTagReason::EmptyTag => "empty tag",
        };
        f.write_str(text)
    }
}

/// Extract the tag between the first `open` and the first `close` after it.
///
/// ```
/// use flexcodec::codec::tag::{resolve, MalformedTagReason};
///
/// assert_eq!(resolve("body<bloom_4_1>[memory]", '<', '>'), Ok("bloom_4_1"));
/// assert_eq!(resolve("body<bloom_4_1>[memory]", '[', ']'), Ok("memory"));
/// assert_eq!(resolve("plain", '<', '>'), Err(MalformedTagReason::MissingDelimiters));
/// ```
pub fn resolve(
    field: &str,
    open: char,
    close: char,
) -> std::result::Result<&str, MalformedTagReason> {
    let Some(start) = field.find(open) else {
        return Err(if field.contains(close) {
            MalformedTagReason::MissingOpenDelimiter
        } else {
            MalformedTagReason::MissingDelimiters
        });
    };

    let tag_start = start + open.len_utf8();
    let Some(length) = field[tag_start..].find(close) else {
        return Err(MalformedTagReason::UnclosedTag);
    };

    if length == 0 {
        return Err(MalformedTagReason::EmptyTag);
    }

    Ok(&field[tag_start..tag_start + length])
}

/// Resolves tags for one namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldTagResolver {
    namespace: FormatNamespace,
}

impl FieldTagResolver {
    /// Create a resolver using the delimiters of `namespace`.
    pub fn new(namespace: FormatNamespace) -> Self {
        FieldTagResolver { namespace }
    }

    /// The namespace this resolver extracts tags for.
    pub fn namespace(&self) -> FormatNamespace {
        self.namespace
    }

    /// Extract the tag embedded in `field`.
    pub fn resolve<'a>(&self, field: &'a str) -> Result<&'a str> {
        let (open, close) = self.namespace.delimiters();
        resolve(field, open, close).map_err(|reason| FlexCodecError::MalformedFieldTag {
            field: field.to_string(),
            namespace: self.namespace,
            reason,
        })
    }

    /// Whether `field` carries no delimiter of this namespace at all.
    pub fn is_untagged(&self, field: &str) -> bool {
        let (open, close) = self.namespace.delimiters();
        !field.contains(open) && !field.contains(close)
    }
}
