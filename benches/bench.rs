//! Criterion benchmarks for flexcodec.
//!
//! Covers the hot paths of per-field dispatch:
//! - Tag extraction from field names
//! - Strategy resolution through the codec
//! - Encoding one field with each built-in postings strategy
//! - Flushing a small segment to memory storage

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use flexcodec::codec::catalog::POSTINGS_TAGS;
use flexcodec::codec::postings::{FieldPostings, Posting};
use flexcodec::codec::tag::resolve;
use flexcodec::codec::{Codec, PerFieldCodec};
use flexcodec::segment::{IndexableField, SegmentDocument, SegmentWriter, SegmentWriterConfig};
use flexcodec::storage::memory::MemoryStorage;

const WORDS: &[&str] = &[
    "search", "engine", "codec", "postings", "doc", "values", "field", "term", "segment",
    "bloom", "pulsing", "memory", "direct", "columnar", "merge", "flush",
];

/// Generate field names with tags in both namespaces.
fn generate_field_names(count: usize) -> Vec<String> {
    let doc_values_tags = ["lucene_4_10", "lucene_4_9", "direct", "memory"];
    (0..count)
        .map(|i| {
            format!(
                "{}_{i}<{}>[{}]",
                WORDS[i % WORDS.len()],
                POSTINGS_TAGS[i % POSTINGS_TAGS.len()],
                doc_values_tags[(i * 7) % doc_values_tags.len()]
            )
        })
        .collect()
}

/// Generate postings for one field: a small shared vocabulary plus one unique id per doc.
fn generate_postings(docs: u64) -> FieldPostings {
    let mut postings = FieldPostings::new();
    for doc_id in 0..docs {
        for position in 0..20u32 {
            let word_idx = (doc_id as usize * 7 + position as usize * 13) % WORDS.len();
            postings.add_posting(WORDS[word_idx], Posting::with_positions(doc_id, vec![position]));
        }
        postings.add_posting(format!("id-{doc_id}"), Posting::new(doc_id));
    }
    postings.doc_count = docs;
    postings
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");
    let fields = generate_field_names(1000);
    let codec = PerFieldCodec::new().unwrap();

    group.throughput(Throughput::Elements(fields.len() as u64));
    group.bench_function("extract_tags", |b| {
        b.iter(|| {
            for field in &fields {
                black_box(resolve(black_box(field), '<', '>')).ok();
                black_box(resolve(black_box(field), '[', ']')).ok();
            }
        })
    });

    group.bench_function("codec_format_for_field", |b| {
        b.iter(|| {
            for field in &fields {
                black_box(codec.postings_format_for_field(black_box(field)).unwrap());
                black_box(codec.doc_values_format_for_field(black_box(field)).unwrap());
            }
        })
    });

    group.finish();
}

fn bench_postings_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("postings_encode");
    let codec = PerFieldCodec::new().unwrap();
    let postings = generate_postings(500);

    group.throughput(Throughput::Elements(postings.posting_count() as u64));
    for tag in POSTINGS_TAGS {
        let field = format!("body<{tag}>");
        let format = codec.postings_format_for_field(&field).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(tag), &postings, |b, postings| {
            b.iter(|| black_box(format.encode(&field, black_box(postings)).unwrap()))
        });
    }

    group.finish();
}

fn bench_segment_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment");
    group.sample_size(20);
    let codec: Arc<dyn Codec> = Arc::new(PerFieldCodec::new().unwrap());

    group.throughput(Throughput::Elements(200));
    group.bench_function("flush_200_docs", |b| {
        b.iter(|| {
            let storage = Arc::new(MemoryStorage::new_default());
            let mut writer = SegmentWriter::new(
                storage,
                Arc::clone(&codec),
                "_0",
                SegmentWriterConfig::default(),
            )
            .unwrap();
            for i in 0..200usize {
                let text: Vec<&str> = (0..30)
                    .map(|j| WORDS[(i * 7 + j * 13) % WORDS.len()])
                    .collect();
                writer
                    .add_document(
                        SegmentDocument::new()
                            .add_field(IndexableField::text("body<lucene_4_1>", text.join(" ")))
                            .add_field(IndexableField::keyword("id<bloom_4_1>", format!("doc-{i}")))
                            .add_field(IndexableField::numeric("rank[lucene_4_10]", i as i64)),
                    )
                    .unwrap();
            }
            black_box(writer.flush().unwrap())
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_resolution,
    bench_postings_strategies,
    bench_segment_flush
);
criterion_main!(benches);
