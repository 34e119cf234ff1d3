//! Criterion benchmarks for the diff engine and weight tables.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glyphdiff::compare::compare_texts;
use glyphdiff::confusion::{build_confusion_matrix, glyph_frequencies, to_probability_matrix};
use glyphdiff::diff::diff_chars;
use glyphdiff::models::{ComparisonParams, DiffSettings};
use glyphdiff::weights::weight_table;

const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz ";

fn sample_text(size: usize, stride: usize) -> String {
    let alphabet: Vec<char> = ALPHABET.chars().collect();
    (0..size).map(|i| alphabet[(i * stride) % alphabet.len()]).collect()
}

fn bench_diff(c: &mut Criterion) {
    let settings = DiffSettings::default();

    let sizes = [100, 1000, 5000];

    let mut group = c.benchmark_group("diff_chars");

    for size in sizes {
        // Identical texts (common prefix short-circuits everything)
        let text = sample_text(size, 7);

        group.bench_with_input(BenchmarkId::new("identical", size), &size, |b, _| {
            b.iter(|| diff_chars(black_box(&text), black_box(&text), &settings))
        });

        // 80% match (typical OCR noise)
        let noisy: String = text
            .chars()
            .enumerate()
            .map(|(i, c)| if i % 10 < 8 { c } else { 'x' })
            .collect();

        group.bench_with_input(BenchmarkId::new("80pct_match", size), &size, |b, _| {
            b.iter(|| diff_chars(black_box(&text), black_box(&noisy), &settings))
        });

        // Unrelated texts (worst case for the bisection)
        let unrelated = sample_text(size, 11);

        group.bench_with_input(BenchmarkId::new("unrelated", size), &size, |b, _| {
            b.iter(|| diff_chars(black_box(&text), black_box(&unrelated), &settings))
        });
    }

    group.finish();
}

fn bench_weight_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("weight_table");

    let sizes = [1000, 10000];

    for size in sizes {
        let truth = sample_text(size, 7);
        let transcription: String = truth
            .chars()
            .enumerate()
            .map(|(i, c)| if i % 13 == 0 { 'e' } else { c })
            .collect();

        let matrix =
            build_confusion_matrix(&truth, &transcription, &DiffSettings::default()).unwrap();
        let p = to_probability_matrix(&matrix);
        let frequencies = glyph_frequencies(&truth, &transcription);

        group.bench_with_input(BenchmarkId::new("build", size), &size, |b, _| {
            b.iter(|| weight_table(black_box(&p), black_box(&frequencies), matrix.glyphs()))
        });
    }

    group.finish();
}

fn bench_compare(c: &mut Criterion) {
    let params = ComparisonParams::default();

    let mut group = c.benchmark_group("compare_texts");

    let sizes = [1000, 10000];

    for size in sizes {
        let text1 = sample_text(size, 7);
        let text2: String = text1
            .chars()
            .enumerate()
            .map(|(i, c)| if i % 17 == 0 { 'o' } else { c })
            .collect();

        group.bench_with_input(BenchmarkId::new("character", size), &size, |b, _| {
            b.iter(|| compare_texts(black_box(&text1), black_box(&text2), &params, None, false))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_diff, bench_weight_table, bench_compare);
criterion_main!(benches);
