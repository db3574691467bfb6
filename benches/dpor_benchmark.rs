//! Exploration benchmark suite.
//!
//! Benchmarks full exploration rounds of lab programs:
//! - Store buffering and its N-thread generalization
//! - Lock-protected counters
//! - Covering on programs with many equal states
//!
//! Run:
//!   cargo bench --bench dpor_benchmark

#![allow(missing_docs)]
#![allow(clippy::semicolon_if_nothing_returned)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use source_dpor::config::LabConfig;
use source_dpor::lab::{Instr, LabRunner, Program};

// =============================================================================
// HELPERS
// =============================================================================

/// Thread `i` writes its own variable and reads its neighbour's.
fn store_buffer_ring(threads: usize) -> Program {
    (0..threads).fold(Program::new(), |program, i| {
        let own = format!("v{i}");
        let next = format!("v{}", (i + 1) % threads);
        program.thread([Instr::write(&own, 1), Instr::read(&next)])
    })
}

/// Every thread increments a shared counter under one mutex.
fn locked_counter(threads: usize) -> Program {
    (0..threads).fold(Program::new(), |program, i| {
        program.thread([
            Instr::lock("m"),
            Instr::read("c"),
            Instr::write("c", i as i64 + 1),
            Instr::unlock("m"),
        ])
    })
}

/// Threads that all write the same value, so many interleavings coincide.
fn equal_writers(threads: usize) -> Program {
    (0..threads).fold(Program::new(), |program, _| {
        program.thread([Instr::write("x", 1), Instr::read("x")])
    })
}

fn run(program: &Program, config: LabConfig) -> usize {
    let mut runner = LabRunner::new(program.clone(), config);
    runner
        .run_round()
        .map(|report| report.expansions)
        .unwrap_or_default()
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_store_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("explore/store_buffer");
    for threads in [2usize, 3, 4] {
        let program = store_buffer_ring(threads);
        group.throughput(Throughput::Elements(threads as u64));
        group.bench_with_input(BenchmarkId::from_parameter(threads), &program, |b, program| {
            b.iter(|| black_box(run(program, LabConfig::new(1))))
        });
    }
    group.finish();
}

fn bench_locked_counter(c: &mut Criterion) {
    let mut group = c.benchmark_group("explore/locked_counter");
    for threads in [2usize, 3] {
        let program = locked_counter(threads);
        group.bench_with_input(BenchmarkId::from_parameter(threads), &program, |b, program| {
            b.iter(|| black_box(run(program, LabConfig::new(1))))
        });
    }
    group.finish();
}

fn bench_covering(c: &mut Criterion) {
    let mut group = c.benchmark_group("explore/covering");
    let program = equal_writers(3);
    for covering in [false, true] {
        group.bench_with_input(
            BenchmarkId::new("equal_writers_3", covering),
            &covering,
            |b, &covering| {
                b.iter(|| black_box(run(&program, LabConfig::new(1).with_covering(covering))))
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_store_buffer,
    bench_locked_counter,
    bench_covering
);
criterion_main!(benches);
