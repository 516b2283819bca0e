//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{FlexCodecArgs, OutputFormat};
use crate::error::Result;

/// Resolution of one field in one namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceResolution {
    pub tag: Option<String>,
    pub format: Option<String>,
    pub error: Option<String>,
}

/// Result structure for the `resolve` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldResolution {
    pub field: String,
    pub postings: NamespaceResolution,
    pub doc_values: NamespaceResolution,
}

/// One registered strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatEntry {
    pub tag: String,
    pub format: String,
}

/// The strategies of one namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceFormats {
    pub namespace: String,
    pub delimiters: String,
    pub untagged: String,
    pub formats: Vec<FormatEntry>,
}

/// Result structure for the `formats` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecFormats {
    pub codec: String,
    pub delegate: String,
    pub postings: NamespaceFormats,
    /// `None` when doc values are taken from the delegate.
    pub doc_values: Option<NamespaceFormats>,
}

/// Per-field part of a segment description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub name: String,
    pub postings_format: Option<String>,
    pub doc_values_format: Option<String>,
    pub doc_values_type: Option<String>,
    pub terms: Option<usize>,
}

/// A segment file and its size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSummary {
    pub name: String,
    pub size_bytes: u64,
}

/// Result structure for the `inspect` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSummary {
    pub name: String,
    pub id: String,
    pub codec: String,
    pub created_at: String,
    pub doc_count: u64,
    pub live_count: u64,
    pub compound: bool,
    pub files: Vec<FileSummary>,
    pub fields: Vec<FieldSummary>,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &FlexCodecArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &FlexCodecArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;
    for line in render_human(&value, 0) {
        println!("{line}");
    }
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &FlexCodecArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{json}");
    Ok(())
}

/// Render a JSON value as indented `key: value` lines.
fn render_human(value: &serde_json::Value, indent: usize) -> Vec<String> {
    let pad = "  ".repeat(indent);
    let mut lines = Vec::new();

    match value {
        serde_json::Value::Object(map) => {
            for (key, value) in map {
                let label = key.replace('_', " ");
                match value {
                    serde_json::Value::Object(_) => {
                        lines.push(format!("{pad}{label}:"));
                        lines.extend(render_human(value, indent + 1));
                    }
                    serde_json::Value::Array(items) if items.iter().any(|i| i.is_object()) => {
                        lines.push(format!("{pad}{label}:"));
                        for item in items {
                            let mut rendered = render_human(item, indent + 2).into_iter();
                            if let Some(first) = rendered.next() {
                                lines.push(format!("{pad}  - {}", first.trim_start()));
                            }
                            lines.extend(rendered);
                        }
                    }
                    serde_json::Value::Number(n) if key.ends_with("_bytes") => {
                        let bytes = n.as_u64().unwrap_or_default();
                        let label = label.trim_end_matches(" bytes");
                        lines.push(format!("{pad}{label}: {}", format_bytes(bytes)));
                    }
                    serde_json::Value::Null => {}
                    _ => lines.push(format!("{pad}{label}: {}", format_value(value))),
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                let mut rendered = render_human(item, indent + 1).into_iter();
                if let Some(first) = rendered.next() {
                    lines.push(format!("{pad}- {}", first.trim_start()));
                }
                lines.extend(rendered);
            }
        }
        other => lines.push(format!("{pad}{}", format_value(other))),
    }

    lines
}

/// Format a JSON value for display.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        serde_json::Value::Object(_) => "[object]".to_string(),
        serde_json::Value::Null => "null".to_string(),
    }
}

/// Format bytes into human-readable format.
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    let unit = UNITS[unit_index];
    if unit_index == 0 {
        format!("{bytes} {unit}")
    } else {
        format!("{size:.1} {unit}")
    }
}
