//! Throughput benchmarks for the feed path.
//!
//! Measures performance of core operations:
//! - Line decoding
//! - Applying lines to a book
//! - Event generation
//! - Book queries (BBO, snapshot)

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use mdsim::{Config, Generator, OrderBook, decode};

/// Generate a clean stream of roughly `changes` ticks worth of lines.
fn build_stream(changes: usize) -> Vec<String> {
    let mut generator = Generator::from_config(&Config::default()).unwrap();
    generator.create_order_book();
    generator.generate(changes);
    generator
        .drain_emitted()
        .iter()
        .map(|e| e.to_string())
        .collect()
}

/// Build a book with N price levels on each side.
fn build_book(levels: i64, orders_per_level: u64) -> OrderBook {
    let mut book = OrderBook::new();
    let mut id = 0u64;
    for i in 0..levels {
        for _ in 0..orders_per_level {
            id += 1;
            let _ = book.process_line(&format!("A,{id},B,5,{}", 1000 - i * 25));
            id += 1;
            let _ = book.process_line(&format!("A,{id},S,5,{}", 1050 + i * 25));
        }
    }
    book
}

/// Benchmark: decode a line without touching a book
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Elements(1));

    group.bench_function("add", |b| {
        b.iter(|| black_box(decode(black_box("A,1000123,B,7,1025"))))
    });
    group.bench_function("trade", |b| {
        b.iter(|| black_box(decode(black_box("T,S,7,1025"))))
    });
    group.bench_function("malformed", |b| {
        b.iter(|| black_box(decode(black_box("A,1000123,C,7,1025"))))
    });

    group.finish();
}

/// Benchmark: replay a generated stream into a fresh book
fn bench_process_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_stream");

    for changes in [1_000, 10_000, 100_000] {
        let stream = build_stream(changes);
        group.throughput(Throughput::Elements(stream.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(changes), &stream, |b, stream| {
            b.iter(|| {
                let mut book = OrderBook::new();
                for line in stream {
                    let _ = book.process_line(line);
                }
                black_box(book.order_count())
            });
        });
    }

    group.finish();
}

/// Benchmark: generator ticks
fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    for changes in [1_000, 10_000] {
        group.throughput(Throughput::Elements(changes as u64));
        group.bench_with_input(BenchmarkId::from_parameter(changes), &changes, |b, &changes| {
            b.iter(|| {
                let mut generator = Generator::from_config(&Config::default()).unwrap();
                generator.create_order_book();
                generator.generate(changes);
                black_box(generator.drain_emitted().len())
            });
        });
    }

    group.finish();
}

/// Benchmark: add then cancel the same order at a deep book
fn bench_add_cancel(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_cancel");
    group.throughput(Throughput::Elements(2));

    for levels in [5, 50, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(levels), &levels, |b, &levels| {
            let mut book = build_book(levels, 4);
            b.iter(|| {
                let _ = book.process_line(black_box("A,999999999,B,3,975"));
                let _ = book.process_line(black_box("X,999999999,B,3,975"));
            });
        });
    }

    group.finish();
}

/// Benchmark: BBO and snapshot queries
fn bench_queries(c: &mut Criterion) {
    let book = build_book(100, 4);

    c.bench_function("best_bid_ask", |b| b.iter(|| black_box(book.best_bid_ask())));
    c.bench_function("mid", |b| b.iter(|| black_box(book.mid())));
    c.bench_function("snapshot_5", |b| b.iter(|| black_box(book.snapshot(5))));
    c.bench_function("snapshot_render_5", |b| {
        b.iter(|| black_box(book.snapshot(5).to_string()))
    });
}

criterion_group!(
    benches,
    bench_decode,
    bench_process_stream,
    bench_generate,
    bench_add_cancel,
    bench_queries,
);

criterion_main!(benches);
