use std::hint::black_box;

use bytes::BytesMut;
use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};

use crate::{
    consts::{
        COMMENT_LINE, DATA_LINE, EMPTY_LINE, EVENT_LINE, ID_LINE, NO_SPACE_LINE, NO_VALUE_LINE,
        generate_delta_corpus, generate_jsonl_corpus, generate_sse_corpus,
    },
    event_stream::{
        load_chunks, load_line_aligned_chunks, run_blocking_sse, run_jsonl, run_sse,
        run_sse_with_terminator,
    },
};


fn bench_parse_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_line");

    let lines: &[(&str, &[u8])] = &[
        ("data_field", DATA_LINE),
        ("comment", COMMENT_LINE),
        ("event_field", EVENT_LINE),
        ("id_field", ID_LINE),
        ("empty_line", EMPTY_LINE),
        ("no_value", NO_VALUE_LINE),
        ("no_space", NO_SPACE_LINE),
    ];

    for &(name, line) in lines {
        group.bench_with_input(BenchmarkId::new("sse_line", name), line, |b, input| {
            b.iter_batched(
                || BytesMut::from(input),
                |mut buffer| black_box(evstream::parser::parse_line_from_buffer(&mut buffer)),
                BatchSize::SmallInput,
            );
        });
    }

    group.bench_function("jsonl_line", |b| {
        b.iter_batched(
            || BytesMut::from(&b"{\"seq\":1,\"msg\":\"log line\"}\n"[..]),
            |mut buffer| black_box(evstream::parser::split_line(&mut buffer)),
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_event_stream(c: &mut Criterion) {
    let sse_raw = generate_sse_corpus(128);
    let delta_raw = generate_delta_corpus(128);
    let jsonl_raw = generate_jsonl_corpus(512);

    let mut group = c.benchmark_group("event_stream");

    for (name, alignment, chunks) in [
        ("sse_mixed", "unaligned", load_chunks(&sse_raw)),
        ("sse_mixed", "line-aligned", load_line_aligned_chunks(&sse_raw)),
        ("ai_deltas", "unaligned", load_chunks(&delta_raw)),
        (
            "ai_deltas",
            "line-aligned",
            load_line_aligned_chunks(&delta_raw),
        ),
    ] {
        let name = format!("{name}_{alignment}");
        group.bench_with_input(BenchmarkId::new("stream", &name), &chunks, |b, chunks| {
            b.iter(|| run_sse(chunks));
        });

        group.bench_with_input(BenchmarkId::new("blocking", &name), &chunks, |b, chunks| {
            b.iter(|| run_blocking_sse(chunks));
        });
    }

    let delta_chunks = load_chunks(&delta_raw);
    group.bench_with_input(
        BenchmarkId::new("stream", "ai_deltas_terminated"),
        &delta_chunks,
        |b, chunks| {
            b.iter(|| run_sse_with_terminator(chunks));
        },
    );

    for (name, chunks) in [
        ("jsonl_unaligned", load_chunks(&jsonl_raw)),
        ("jsonl_line-aligned", load_line_aligned_chunks(&jsonl_raw)),
    ] {
        group.bench_with_input(BenchmarkId::new("stream", name), &chunks, |b, chunks| {
            b.iter(|| run_jsonl(chunks));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse_line, bench_event_stream);
criterion_main!(benches);
