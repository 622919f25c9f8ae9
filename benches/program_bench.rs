//! Benchmark for Program interpretation and the catenable sequence.
//!
//! Chain lengths double from one run to the next; with amortized O(1) binds
//! the time per chain doubles as well, independent of how the chain nests.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use catfree::control::{Deferred, Program};
use catfree::persistent::CatenableSequence;
use std::any::Any;
use std::hint::black_box;

const CHAIN_LENGTHS: [u64; 5] = [1_000, 2_000, 4_000, 8_000, 16_000];

// =============================================================================
// DSL Definitions
// =============================================================================

/// Counter DSL - one increment per effect
#[derive(Debug, Clone, Copy)]
enum CounterCommand {
    Increment,
}

fn increment() -> Program<CounterCommand, ()> {
    Program::lift(CounterCommand::Increment)
}

fn run_counter_dsl<A: 'static>(program: Program<CounterCommand, A>) -> (A, u64) {
    let mut count = 0;
    let result = program.execute(|CounterCommand::Increment| {
        count += 1;
        Box::new(())
    });
    (result, count)
}

fn left_nested(length: u64) -> Program<CounterCommand, u64> {
    let mut program = Program::pure(0);
    for _ in 0..length {
        program = program.flat_map(|total| increment().map(move |()| total + 1));
    }
    program
}

fn right_nested(remaining: u64) -> Program<CounterCommand, u64> {
    if remaining == 0 {
        Program::pure(0)
    } else {
        increment().flat_map(move |()| right_nested(remaining - 1).map(|total| total + 1))
    }
}

// =============================================================================
// 1. Bind Cost
// =============================================================================

fn benchmark_program_bind(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("program_bind");

    for length in CHAIN_LENGTHS {
        group.bench_with_input(
            BenchmarkId::new("left_nested", length),
            &length,
            |bencher, &length| {
                bencher.iter(|| black_box(run_counter_dsl(left_nested(black_box(length)))));
            },
        );

        group.bench_with_input(
            BenchmarkId::new("right_nested", length),
            &length,
            |bencher, &length| {
                bencher.iter(|| black_box(run_counter_dsl(right_nested(black_box(length)))));
            },
        );

        group.bench_with_input(
            BenchmarkId::new("pure_binds", length),
            &length,
            |bencher, &length| {
                bencher.iter(|| {
                    let mut program: Program<(), u64> = Program::pure(0);
                    for _ in 0..length {
                        program = program.flat_map(|total| Program::pure(total + 1));
                    }
                    black_box(program.execute(|()| Box::new(())))
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// 2. Interpreters
// =============================================================================

fn benchmark_interpreters(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("program_interpreters");
    let length = 4_000;

    group.bench_function("execute", |bencher| {
        bencher.iter(|| black_box(run_counter_dsl(right_nested(length))));
    });

    group.bench_function("fold_with_unwind_step_run", |bencher| {
        bencher.iter(|| {
            let result = right_nested(length).fold_with_unwind(
                |CounterCommand::Increment| (),
                |total| total,
                |step| step.run(|()| Box::new(())),
            );
            black_box(result)
        });
    });

    group.bench_function("into_deferred", |bencher| {
        bencher.iter(|| {
            let deferred = right_nested(length).into_deferred(|CounterCommand::Increment| {
                Deferred::new(|| Box::new(()) as Box<dyn Any>)
            });
            black_box(deferred.force())
        });
    });

    group.finish();
}

// =============================================================================
// 3. Catenable Sequence
// =============================================================================

fn benchmark_catenable_sequence(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("catenable_sequence");

    for length in CHAIN_LENGTHS {
        group.bench_with_input(
            BenchmarkId::new("snoc_then_drain", length),
            &length,
            |bencher, &length| {
                bencher.iter(|| {
                    let sequence: CatenableSequence<u64> = (0..length).collect();
                    black_box(sequence.iter().sum::<u64>())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_program_bind,
    benchmark_interpreters,
    benchmark_catenable_sequence
);

criterion_main!(benches);
