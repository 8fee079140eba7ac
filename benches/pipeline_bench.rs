//! Performance benchmarks for the scan result pipeline.
//!
//! The decode loop delivers an attempt for every frame, and nearly all of
//! them are misses or repeated reads of a code that was already accepted.
//! These benchmarks track the cost of those paths.
//!
//! # Run Benchmarks
//!
//! ```sh
//! # Run all pipeline benchmarks
//! cargo bench --bench pipeline_bench
//!
//! # Run specific benchmark group
//! cargo bench --bench pipeline_bench -- duplicate
//!
//! # Compare against a saved baseline
//! cargo bench --bench pipeline_bench -- --save-baseline main
//! cargo bench --bench pipeline_bench -- --baseline main
//! ```
//!
//! # Expected Results
//!
//! - Misses should cost a few nanoseconds (counter update only).
//! - Duplicates and discarded reads should be dominated by the trim and
//!   comparison, with no allocation.

use std::hint::black_box;
use std::time::Duration;

use camscan_core::ScannerState;
use camscan_hardware::{DecodeAttempt, DeviceDescriptor};
use camscan_scanner::{DeviceInventory, ScanResultPipeline};
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tokio::time::Instant;

const COOLDOWN: Duration = Duration::from_millis(2000);

/// Benchmark frames with no code.
fn bench_miss(c: &mut Criterion) {
    let mut group = c.benchmark_group("miss");
    group.throughput(Throughput::Elements(1));

    let mut pipeline = ScanResultPipeline::new(COOLDOWN);
    let now = Instant::now();

    group.bench_function("empty_frame", |b| {
        b.iter(|| {
            let verdict =
                pipeline.on_decode_attempt_at(DecodeAttempt::Miss, ScannerState::Scanning, now);
            black_box(verdict)
        });
    });

    group.bench_function("whitespace_only", |b| {
        b.iter_batched(
            || DecodeAttempt::decoded("    "),
            |attempt| {
                black_box(pipeline.on_decode_attempt_at(attempt, ScannerState::Scanning, now))
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

/// Benchmark the same code read over and over while its cooldown runs.
fn bench_duplicate(c: &mut Criterion) {
    let mut group = c.benchmark_group("duplicate");
    group.throughput(Throughput::Elements(1));

    for (name, code) in [
        ("short", "SN1"),
        ("typical", "  SN12345678  "),
        ("long", "SN-0123456789-ABCDEFGHIJ-0123456789"),
    ] {
        let mut pipeline = ScanResultPipeline::new(COOLDOWN);
        let now = Instant::now();
        pipeline.on_decode_attempt_at(DecodeAttempt::decoded(code), ScannerState::Scanning, now);
        pipeline.arm_cooldown(now);

        group.bench_with_input(BenchmarkId::new("within_cooldown", name), &code, |b, code| {
            b.iter_batched(
                || DecodeAttempt::decoded(*code),
                |attempt| {
                    black_box(pipeline.on_decode_attempt_at(attempt, ScannerState::Scanning, now))
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Benchmark reads that arrive while a value is being processed.
fn bench_discarded(c: &mut Criterion) {
    let mut group = c.benchmark_group("discarded");
    group.throughput(Throughput::Elements(1));

    let mut pipeline = ScanResultPipeline::new(COOLDOWN);
    let now = Instant::now();

    for state in [ScannerState::Processing, ScannerState::Success] {
        group.bench_with_input(BenchmarkId::new("state", state), &state, |b, state| {
            b.iter_batched(
                || DecodeAttempt::decoded("SN12345"),
                |attempt| black_box(pipeline.on_decode_attempt_at(attempt, *state, now)),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Benchmark default camera selection over growing inventories.
fn bench_default_device(c: &mut Criterion) {
    let mut group = c.benchmark_group("default_device");

    for count in [2usize, 4, 8] {
        group.throughput(Throughput::Elements(count as u64));

        // Worst case: every camera faces the user
        let inventory = DeviceInventory::new(
            (0..count)
                .map(|i| DeviceDescriptor::new(format!("cam-{i}"), format!("Front Camera {i}")))
                .collect(),
        );

        group.bench_with_input(BenchmarkId::new("all_front", count), &inventory, |b, inv| {
            b.iter(|| black_box(inv.default_device()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_miss,
    bench_duplicate,
    bench_discarded,
    bench_default_device
);
criterion_main!(benches);
