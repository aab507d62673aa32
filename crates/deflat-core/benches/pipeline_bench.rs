//! Pipeline benchmarks.
//!
//! Measures deobfuscation throughput on generated dispatcher loops.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use deflat_core::{DeobOptions, deobfuscate};
use deflat_emitter::{PrinterOptions, print};
use deflat_parser::ParserState;

// =============================================================================
// Sources
// =============================================================================

/// A function whose body is a `states`-case dispatcher visiting every state
/// once, in reverse order of the case labels.
fn generate_dispatcher(states: usize) -> String {
    let mut cases = String::new();
    for state in 0..states {
        let next = if state == 0 {
            "undefined".to_string()
        } else {
            (state - 1).to_string()
        };
        cases.push_str(&format!(
            "            case {state}: log(\"state {state}\"); s = {next}; break;\n"
        ));
    }
    format!(
        "function run() {{\n    for (var s = {}; s !== undefined;) {{\n        switch (s) {{\n{cases}        }}\n    }}\n}}\n",
        states - 1
    )
}

/// Several masked dispatchers side by side.
fn generate_masked_program(functions: usize, states: usize) -> String {
    let mut source = String::new();
    for function in 0..functions {
        let mut groups = String::new();
        for group in 0..states.div_ceil(4) {
            let mut inner = String::new();
            for lane in 0..4 {
                let state = group * 4 + lane;
                if state >= states {
                    break;
                }
                let next = if state + 1 == states {
                    "undefined".to_string()
                } else {
                    (state + 1).to_string()
                };
                inner.push_str(&format!("case {lane}: f{function}({state}); s = {next}; break;\n"));
            }
            groups.push_str(&format!("case {group}: switch (a) {{\n{inner}}} break;\n"));
        }
        source.push_str(&format!(
            "function g{function}() {{\n    for (var s = 0; s !== undefined;) {{\n        var a = 3 & s, b = s >> 2;\n        switch (b) {{\n{groups}}}\n    }}\n}}\n"
        ));
    }
    source
}

// =============================================================================
// Benchmarks
// =============================================================================

/// Benchmark: whole pipeline on dispatchers of growing size
fn bench_pipeline_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_throughput");

    for states in [4, 16, 64, 256] {
        let source = generate_dispatcher(states);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("direct", states), &source, |b, source| {
            b.iter(|| black_box(deobfuscate(source, &DeobOptions::default())))
        });
    }

    group.finish();
}

/// Benchmark: masked dispatchers across many functions
fn bench_masked_program(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_masked");

    for (functions, states) in [(4, 8), (16, 16), (32, 32)] {
        let source = generate_masked_program(functions, states);
        let label = format!("{functions}fn_{states}st");
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("masked", &label), &source, |b, source| {
            b.iter(|| black_box(deobfuscate(source, &DeobOptions::default())))
        });
    }

    group.finish();
}

/// Benchmark: parse and print only, as a floor for the pipeline numbers
fn bench_parse_print_baseline(c: &mut Criterion) {
    let source = generate_masked_program(16, 16);
    c.bench_function("parse_print_baseline", |b| {
        b.iter(|| {
            let (arena, root, _) = ParserState::parse("bench.js", &source);
            black_box(print(&arena, root, &PrinterOptions::default()))
        })
    });
}

criterion_group!(
    benches,
    bench_pipeline_throughput,
    bench_masked_program,
    bench_parse_print_baseline,
);

criterion_main!(benches);
