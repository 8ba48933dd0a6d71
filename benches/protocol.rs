//! Protocol parsing benchmark suite
//!
//! Benchmarks for the text the runner and ledger tooling read back:
//! - `time_sec=` extraction from noisy candidate stderr
//! - `Speedup:` scraping from aggregate benchmark output

use bomb_bench::compare::ComparisonResult;
use bomb_bench::protocol::{parse_timing, scrape_speedups};
use bomb_bench::report::{render_comparison, Style};
use bomb_bench::runner::{BenchmarkRun, RunLabel};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Stderr with `noise` diagnostic lines ahead of the timing line.
fn noisy_stderr(noise: usize) -> String {
    let mut s = String::new();
    for i in 0..noise {
        s.push_str(&format!("[diag] tile {i} done in {}us\n", i * 17 % 1000));
    }
    s.push_str("time_sec=0.734215\n");
    s
}

fn bench_parse_timing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_timing");

    for noise in [0usize, 10, 100, 1_000] {
        let stderr = noisy_stderr(noise);
        group.bench_with_input(BenchmarkId::from_parameter(noise), &stderr, |b, s| {
            b.iter(|| black_box(parse_timing(black_box(s))))
        });
    }

    group.finish();
}

fn bench_scrape_speedups(c: &mut Criterion) {
    let run = |label, secs| BenchmarkRun {
        label,
        output_digest: "0x5f3759df".to_string(),
        elapsed_seconds: secs,
    };
    let perlin = ComparisonResult::new(run(RunLabel::Baseline, 2.5), run(RunLabel::Submission, 1.0));
    let splat = ComparisonResult::new(run(RunLabel::Baseline, 1.2), run(RunLabel::Submission, 1.0));

    // Shaped like a `make benchmark` log: build chatter around two reports.
    let mut output = String::new();
    for i in 0..200 {
        output.push_str(&format!("g++ -O3 -march=native -c unit_{i}.cpp\n"));
    }
    output.push_str(&render_comparison(&perlin, Style::default()));
    output.push_str(&render_comparison(&splat, Style::default()));

    c.bench_function("scrape_speedups/make_log", |b| {
        b.iter(|| black_box(scrape_speedups(black_box(&output))))
    });
}

criterion_group!(benches, bench_parse_timing, bench_scrape_speedups);
criterion_main!(benches);
