//! Command line argument parsing for the flexcodec CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// flexcodec - inspect per-field codec dispatch
#[derive(Parser, Debug, Clone)]
#[command(name = "flexcodec")]
#[command(about = "Inspect per-field postings and doc-values codec dispatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct FlexCodecArgs {
    /// Codec configuration file (JSON); the default codec is used when omitted
    #[arg(short, long, value_name = "CONFIG_FILE", env = "FLEXCODEC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl FlexCodecArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show which strategies field names resolve to
    Resolve(ResolveArgs),

    /// List the registered strategies of the codec
    Formats,

    /// Describe a flushed segment
    Inspect(InspectArgs),
}

/// Arguments for resolving field names
#[derive(Parser, Debug, Clone)]
pub struct ResolveArgs {
    /// Field names, e.g. 'title<lucene_4_1>' or 'price[memory]'
    #[arg(value_name = "FIELD", required = true)]
    pub fields: Vec<String>,

    /// Exit with an error if any field fails to resolve in either namespace
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for inspecting a segment
#[derive(Parser, Debug, Clone)]
pub struct InspectArgs {
    /// Directory holding the segment files
    #[arg(value_name = "DIR")]
    pub directory: PathBuf,

    /// Segment name, e.g. '_0'
    #[arg(value_name = "SEGMENT")]
    pub segment: String,

    /// Decode postings and report term counts per field
    #[arg(long)]
    pub terms: bool,
}

/// Output formats supported by the CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        let args = FlexCodecArgs::try_parse_from(["flexcodec", "formats"]).unwrap();
        assert_eq!(args.verbosity(), 1);

        let args = FlexCodecArgs::try_parse_from(["flexcodec", "-vv", "formats"]).unwrap();
        assert_eq!(args.verbosity(), 2);

        let args = FlexCodecArgs::try_parse_from(["flexcodec", "--quiet", "formats"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_output_format() {
        let args =
            FlexCodecArgs::try_parse_from(["flexcodec", "--format", "json", "formats"]).unwrap();
        assert_eq!(args.output_format, OutputFormat::Json);
        let result = FlexCodecArgs::try_parse_from(["flexcodec", "--format", "yaml", "formats"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_args() {
        let args = FlexCodecArgs::try_parse_from([
            "flexcodec",
            "resolve",
            "title<lucene_4_1>",
            "price[memory]",
            "--strict",
        ])
        .unwrap();

        match args.command {
            Command::Resolve(resolve) => {
                assert_eq!(resolve.fields, ["title<lucene_4_1>", "price[memory]"]);
                assert!(resolve.strict);
            }
            other => panic!("Expected Resolve command, got {other:?}"),
        }

        assert!(FlexCodecArgs::try_parse_from(["flexcodec", "resolve"]).is_err());
    }

    #[test]
    fn test_inspect_args_with_global_config() {
        let args = FlexCodecArgs::try_parse_from([
            "flexcodec",
            "inspect",
            "/tmp/index",
            "_0",
            "--config",
            "codec.json",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("codec.json")));
        match args.command {
            Command::Inspect(inspect) => {
                assert_eq!(inspect.directory, PathBuf::from("/tmp/index"));
                assert_eq!(inspect.segment, "_0");
                assert!(!inspect.terms);
            }
            other => panic!("Expected Inspect command, got {other:?}"),
        }
    }
}
