//! Frame codec benchmark suite.
//!
//! Benchmarks decoding of poll bodies at different batch sizes:
//! - Batch sizes: 1, 16, 128 frames
//! - Clean batches and batches with one garbled frame
//!
//! Run with: cargo bench --bench frame_codec
//! Results saved to: target/criterion/

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use hub_longpoll::protocol::{Message, RECORD_SEPARATOR, decode, encode};
use hub_longpoll::InvocationId;
use serde_json::json;

// ============================================================================
// Benchmark Parameters
// ============================================================================

const BATCH_SIZES: &[usize] = &[1, 16, 128];

// ============================================================================
// Fixtures
// ============================================================================

/// Poll body mixing invocations, completions and pings.
fn poll_body(frames: usize) -> String {
    (0..frames)
        .map(|i| {
            let message = match i % 3 {
                0 => Message::invocation(
                    None,
                    "AttackUpdate",
                    vec![json!({"attackId": i, "eventType": "Updated", "warRoomId": 4})],
                ),
                1 => Message::completion(
                    InvocationId::new(i as u64),
                    json!([{"id": i, "name": "Alpha"}]),
                ),
                _ => Message::ping(),
            };
            encode(&message).expect("encode fixture")
        })
        .collect()
}

// ============================================================================
// Benchmark: Decode
// ============================================================================

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for &size in BATCH_SIZES {
        let body = poll_body(size);
        group.throughput(Throughput::Bytes(body.len() as u64));
        group.bench_with_input(BenchmarkId::new("clean", size), &body, |b, body| {
            b.iter(|| decode(black_box(body)));
        });

        let garbled = format!("{{\"type\":1,\"target\"{RECORD_SEPARATOR}{body}");
        group.bench_with_input(BenchmarkId::new("garbled", size), &garbled, |b, body| {
            b.iter(|| decode(black_box(body)));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Encode
// ============================================================================

fn bench_encode(c: &mut Criterion) {
    let message = Message::invocation(
        Some(InvocationId::new(42)),
        "GetAttacks",
        vec![json!(12), json!({"includeDone": false})],
    );

    c.bench_function("encode_invocation", |b| {
        b.iter(|| encode(black_box(&message)));
    });
}

criterion_group!(benches, bench_decode, bench_encode);
criterion_main!(benches);
