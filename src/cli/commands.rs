//! Command implementations for the flexcodec CLI.

use std::sync::Arc;

use log::debug;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::codec::dispatch::{PerFieldDispatcher, UntaggedFieldPolicy};
use crate::codec::{Codec, DocValuesFormat, PerFieldCodec, PostingsFormat};
use crate::config::CodecConfig;
use crate::error::{FlexCodecError, Result};
use crate::segment::{SEGMENT_INFO_EXTENSION, SegmentReader, segment_file_name};
use crate::storage::file::FileStorage;
use crate::storage::{Storage, StorageConfig};

/// Execute a CLI command.
pub fn execute_command(args: FlexCodecArgs) -> Result<()> {
    let codec = load_codec(&args)?;
    match &args.command {
        Command::Resolve(resolve_args) => resolve_fields(resolve_args, &codec, &args),
        Command::Formats => list_formats(&codec, &args),
        Command::Inspect(inspect_args) => inspect_segment(inspect_args, codec, &args),
    }
}

/// Build the codec from `--config`, or the default one.
pub fn load_codec(args: &FlexCodecArgs) -> Result<PerFieldCodec> {
    match &args.config {
        Some(path) => {
            debug!("Loading codec configuration from {}", path.display());
            PerFieldCodec::from_config(&CodecConfig::from_file(path)?)
        }
        None => PerFieldCodec::new(),
    }
}

/// Resolve `field` in both namespaces.
pub fn resolve_field(codec: &PerFieldCodec, field: &str) -> FieldResolution {
    let postings = namespace_resolution(codec.postings_dispatcher(), field);
    let doc_values = match codec.doc_values_dispatcher() {
        Some(dispatcher) => namespace_resolution(dispatcher, field),
        None => match codec.delegate().doc_values_format_for_field(field) {
            Ok(format) => NamespaceResolution {
                tag: None,
                format: Some(format.name().to_string()),
                error: None,
            },
            Err(e) => NamespaceResolution {
                tag: None,
                format: None,
                error: Some(e.to_string()),
            },
        },
    };

    FieldResolution {
        field: field.to_string(),
        postings,
        doc_values,
    }
}

fn namespace_resolution<F>(dispatcher: &PerFieldDispatcher<F>, field: &str) -> NamespaceResolution
where
    F: ?Sized + StrategyName,
{
    let tag = dispatcher.tag_for_field(field).ok().map(str::to_string);
    match dispatcher.format_for_field(field) {
        Ok(format) => NamespaceResolution {
            tag,
            format: Some(format.format_name().to_string()),
            error: None,
        },
        Err(e) => NamespaceResolution {
            tag,
            format: None,
            error: Some(e.to_string()),
        },
    }
}

/// Strategies that report a name, in either namespace.
trait StrategyName {
    fn format_name(&self) -> &str;
}

impl StrategyName for dyn PostingsFormat {
    fn format_name(&self) -> &str {
        self.name()
    }
}

impl StrategyName for dyn DocValuesFormat {
    fn format_name(&self) -> &str {
        self.name()
    }
}

fn resolve_fields(
    args: &ResolveArgs,
    codec: &PerFieldCodec,
    cli_args: &FlexCodecArgs,
) -> Result<()> {
    let resolutions: Vec<FieldResolution> = args
        .fields
        .iter()
        .map(|field| resolve_field(codec, field))
        .collect();

    output_result("Field resolution", &resolutions, cli_args)?;

    if args.strict {
        let failed = resolutions
            .iter()
            .filter(|r| r.postings.error.is_some() || r.doc_values.error.is_some())
            .count();
        if failed > 0 {
            return Err(FlexCodecError::field(format!(
                "{failed} of {} fields failed to resolve",
                resolutions.len()
            )));
        }
    }
    Ok(())
}

/// Describe the registries of `codec`.
pub fn codec_formats(codec: &PerFieldCodec) -> CodecFormats {
    CodecFormats {
        codec: codec.name().to_string(),
        delegate: codec.delegate().name().to_string(),
        postings: namespace_formats(codec.postings_dispatcher()),
        doc_values: codec.doc_values_dispatcher().map(namespace_formats),
    }
}

fn namespace_formats<F>(dispatcher: &PerFieldDispatcher<F>) -> NamespaceFormats
where
    F: ?Sized + StrategyName,
{
    let namespace = dispatcher.namespace();
    let (open, close) = namespace.delimiters();
    NamespaceFormats {
        namespace: namespace.to_string(),
        delimiters: format!("{open}{close}"),
        untagged: match dispatcher.untagged_policy() {
            UntaggedFieldPolicy::Reject => "reject".to_string(),
            UntaggedFieldPolicy::Fallback { tag } => format!("fallback to {tag}"),
        },
        formats: dispatcher
            .registry()
            .entries()
            .into_iter()
            .map(|(tag, format)| FormatEntry {
                tag: tag.to_string(),
                format: format.format_name().to_string(),
            })
            .collect(),
    }
}

fn list_formats(codec: &PerFieldCodec, cli_args: &FlexCodecArgs) -> Result<()> {
    output_result("Registered strategies", &codec_formats(codec), cli_args)
}

/// Open a segment and summarize it.
pub fn summarize_segment(
    storage: &dyn Storage,
    segment: &str,
    codec: Arc<dyn Codec>,
    decode_terms: bool,
) -> Result<SegmentSummary> {
    if !storage.file_exists(&segment_file_name(segment, SEGMENT_INFO_EXTENSION)) {
        let suffix = format!(".{SEGMENT_INFO_EXTENSION}");
        let known: Vec<String> = storage
            .list_files()?
            .iter()
            .filter_map(|name| name.strip_suffix(&suffix).map(str::to_string))
            .collect();
        return Err(anyhow::anyhow!(
            "No segment '{segment}' in storage (found: [{}])",
            known.join(", ")
        )
        .into());
    }

    let reader = SegmentReader::open(storage, segment, codec)?;
    let info = reader.info();

    let mut files = Vec::with_capacity(info.files.len() + 1);
    let si_name = info.file_name(SEGMENT_INFO_EXTENSION);
    for name in info.files.iter().cloned().chain([si_name]) {
        let size_bytes = storage.file_size(&name)?;
        files.push(FileSummary { name, size_bytes });
    }

    let mut fields = Vec::with_capacity(info.fields.len());
    for field in &info.fields {
        let terms = if decode_terms {
            reader.postings(&field.name)?.map(|p| p.term_count())
        } else {
            None
        };
        fields.push(FieldSummary {
            name: field.name.clone(),
            postings_format: field.postings_format.clone(),
            doc_values_format: field.doc_values_format.clone(),
            doc_values_type: field.doc_values_type.map(|t| t.to_string()),
            terms,
        });
    }

    Ok(SegmentSummary {
        name: info.name.clone(),
        id: info.id.to_string(),
        codec: info.codec.clone(),
        created_at: info.created_at.to_rfc3339(),
        doc_count: info.doc_count,
        live_count: reader.live_count(),
        compound: info.use_compound_file,
        files,
        fields,
    })
}

fn inspect_segment(
    args: &InspectArgs,
    codec: PerFieldCodec,
    cli_args: &FlexCodecArgs,
) -> Result<()> {
    let storage = FileStorage::open(&args.directory, StorageConfig::default())?;
    let summary = summarize_segment(&storage, &args.segment, Arc::new(codec), args.terms)?;
    output_result(
        &format!("Segment {} in {}", args.segment, args.directory.display()),
        &summary,
        cli_args,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{IndexableField, SegmentDocument, SegmentWriter, SegmentWriterConfig};
    use crate::storage::memory::MemoryStorage;

    #[test]
    fn test_resolve_field() {
        let codec = PerFieldCodec::new().unwrap();

        let resolution = resolve_field(&codec, "body<bloom_4_1>[memory]");
        assert_eq!(resolution.postings.tag.as_deref(), Some("bloom_4_1"));
        assert_eq!(resolution.postings.format.as_deref(), Some("BloomFilter41"));
        assert_eq!(resolution.doc_values.format.as_deref(), Some("MemoryDocValues"));

        let resolution = resolve_field(&codec, "title<lucene_4_1>");
        assert!(resolution.postings.error.is_none());
        assert!(resolution.doc_values.tag.is_none());
        assert!(resolution.doc_values.error.is_some());

        let resolution = resolve_field(&codec, "x<nope>");
        assert_eq!(resolution.postings.tag.as_deref(), Some("nope"));
        assert!(resolution.postings.error.unwrap().contains("nope"));
    }

    #[test]
    fn test_resolve_field_with_delegated_doc_values() {
        let codec = PerFieldCodec::builder().delegate_doc_values().build().unwrap();
        let resolution = resolve_field(&codec, "title<lucene_4_1>");
        assert_eq!(resolution.doc_values.format.as_deref(), Some("Columnar410"));
    }

    #[test]
    fn test_codec_formats() {
        let formats = codec_formats(&PerFieldCodec::new().unwrap());
        assert_eq!(formats.codec, "PerField41");
        assert_eq!(formats.delegate, "Flex41");
        assert_eq!(formats.postings.delimiters, "<>");
        assert_eq!(formats.postings.untagged, "reject");
        assert_eq!(formats.postings.formats.len(), 5);
        assert_eq!(formats.doc_values.unwrap().formats.len(), 4);
    }

    #[test]
    fn test_summarize_segment() {
        let storage = MemoryStorage::new_default();
        let codec: Arc<dyn Codec> = Arc::new(PerFieldCodec::new().unwrap());
        let mut writer = SegmentWriter::new(
            Arc::new(storage.clone()),
            Arc::clone(&codec),
            "_3",
            SegmentWriterConfig::default(),
        )
        .unwrap();
        writer
            .add_document(
                SegmentDocument::new()
                    .add_field(IndexableField::text("body<pulsing_4_1>", "one two three"))
                    .add_field(IndexableField::numeric("rank[lucene_4_9]", 3)),
            )
            .unwrap();
        writer.flush().unwrap();

        let summary = summarize_segment(&storage, "_3", codec, true).unwrap();
        assert_eq!(summary.doc_count, 1);
        assert_eq!(summary.live_count, 1);
        assert!(summary.files.iter().any(|f| f.name == "_3.si"));

        let body = summary.fields.iter().find(|f| f.name == "body<pulsing_4_1>").unwrap();
        assert_eq!(body.postings_format.as_deref(), Some("Pulsing41"));
        assert_eq!(body.terms, Some(3));

        let rank = summary.fields.iter().find(|f| f.name == "rank[lucene_4_9]").unwrap();
        assert_eq!(rank.doc_values_format.as_deref(), Some("Columnar49"));
        assert_eq!(rank.doc_values_type.as_deref(), Some("numeric"));
    }

    #[test]
    fn test_summarize_missing_segment_lists_known_segments() {
        let storage = MemoryStorage::new_default();
        storage.write_file("_0.si", b"{}").unwrap();
        storage.write_file("_0.pst", b"").unwrap();
        let codec: Arc<dyn Codec> = Arc::new(PerFieldCodec::new().unwrap());

        let err = summarize_segment(&storage, "_9", codec, false).unwrap_err();
        assert!(matches!(err, FlexCodecError::Anyhow(_)));
        assert!(err.to_string().contains("No segment '_9' in storage (found: [_0])"));
    }
}
