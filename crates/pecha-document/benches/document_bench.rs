// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for page mapping and markdown serialization on a
// synthetic Tibetan volume.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use pecha_core::{PageMarker, PageTable, Work, WorkLocation};
use pecha_document::{MarkdownOptions, build_sections, map_pages, write_sections};

const PAGES: u32 = 500;
const LINES_PER_PAGE: u32 = 7;

/// 500 pages of seven lines of Tibetan syllables.
fn volume() -> (Vec<String>, PageTable) {
    let line = "བཀྲ་ཤིས་བདེ་ལེགས་ཕུན་སུམ་ཚོགས། ".repeat(4);
    let lines = (0..PAGES * LINES_PER_PAGE).map(|_| line.clone()).collect();
    let markers = (0..PAGES)
        .map(|page| PageMarker {
            sequence: page + 1,
            start_line: page * LINES_PER_PAGE + 1,
            start_char: 1,
            end_line: (page + 1) * LINES_PER_PAGE,
            end_char: 1,
        })
        .collect();
    // Markers are built in ascending order and cannot be inconsistent.
    let table = PageTable::new(markers).unwrap_or_default();
    (lines, table)
}

/// A work with one part per 50 pages.
fn work() -> Work {
    (0..PAGES / 50).fold(Work::new("W1").with_author("author"), |work, i| {
        work.with_part(
            Work::new(format!("W1_{i}"))
                .with_title(format!("part {i}"))
                .with_location(WorkLocation::new(1, i * 50 + 1, i * 50 + 50)),
        )
    })
}

fn bench_map_pages(c: &mut Criterion) {
    let (lines, table) = volume();
    c.bench_function("map_pages (500 pages)", |b| {
        b.iter(|| black_box(map_pages(black_box(&lines), black_box(&table))));
    });
}

fn bench_serialize(c: &mut Criterion) {
    let (lines, table) = volume();
    let mapped = map_pages(&lines, &table);
    let full_text = lines.join("\n");
    let work = work();
    let options = MarkdownOptions {
        max_section_chars: 10_000,
        ..MarkdownOptions::default()
    };

    c.bench_function("build_sections + write_sections (10 parts)", |b| {
        b.iter(|| {
            let forest = build_sections(&work, 1, &mapped.pages, &full_text, "The Text");
            black_box(write_sections(&forest, &options))
        });
    });
}

criterion_group!(benches, bench_map_pages, bench_serialize);
criterion_main!(benches);
