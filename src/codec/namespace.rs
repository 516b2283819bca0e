//! Format namespaces and their field-name delimiters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two per-field format namespaces.
///
/// Each namespace owns a delimiter pair. A field identifier can embed one tag per
/// namespace, e.g. `body<bloom_4_1>[memory]` selects `bloom_4_1` for postings and
/// `memory` for doc values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatNamespace {
    /// Inverted postings lists, tagged with `<...>`.
    Postings,
    /// Columnar doc values, tagged with `[...]`.
    DocValues,
}

impl FormatNamespace {
    /// The opening delimiter of this namespace's tag.
    pub fn open_delimiter(self) -> char {
        match self {
            FormatNamespace::Postings => '<',
            FormatNamespace::DocValues => '[',
        }
    }

    /// The closing delimiter of this namespace's tag.
    pub fn close_delimiter(self) -> char {
        match self {
            FormatNamespace::Postings => '>',
            FormatNamespace::DocValues => ']',
        }
    }

    /// Both delimiters as `(open, close)`.
    pub fn delimiters(self) -> (char, char) {
        (self.open_delimiter(), self.close_delimiter())
    }

    /// Human readable name used in messages.
    pub fn as_str(self) -> &'static str {
        match self {
            FormatNamespace::Postings => "postings",
            FormatNamespace::DocValues => "doc-values",
        }
    }
}

impl fmt::Display for FormatNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimiter_pairs_are_distinct() {
        assert_eq!(FormatNamespace::Postings.delimiters(), ('<', '>'));
        assert_eq!(FormatNamespace::DocValues.delimiters(), ('[', ']'));
    }

    #[test]
    fn test_display() {
        assert_eq!(FormatNamespace::Postings.to_string(), "postings");
        assert_eq!(FormatNamespace::DocValues.to_string(), "doc-values");
    }
}
