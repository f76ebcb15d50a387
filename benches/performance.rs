// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Performance benchmarks for mixpilot
//!
//! Run with: cargo bench
//!
//! These benchmarks measure:
//! - Navigation planning
//! - Catalog compatibility queries
//! - Candidate scoring and selection

use std::collections::HashSet;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use mixpilot::catalog::{KeyMode, TrackCatalog, TrackRecord};
use mixpilot::music::TempoTolerance;
use mixpilot::navigation::plan_from;
use mixpilot::scoring::{CompatibilityScorer, EnergyCurve, EventType, ScoringWeights, VenueType};
use mixpilot::session::SessionContext;

const KEYS: [&str; 6] = ["8A", "9A", "8B", "3B", "11A", "5B"];
const GENRES: [&str; 4] = ["house", "techno", "disco", "breaks"];

fn catalog_of(size: usize) -> TrackCatalog {
    let records: Vec<TrackRecord> = (0..size)
        .map(|i| {
            TrackRecord::new(format!("/music/{:06}.mp3", i))
                .with_bpm(100.0 + (i % 45) as f64)
                .with_key(KEYS[i % KEYS.len()])
                .with_genre(GENRES[i % GENRES.len()])
                .with_rating((i % 6) as u8)
                .with_play_count((i % 90) as u32)
        })
        .collect();
    TrackCatalog::load(&records).expect("benchmark catalog")
}

fn context() -> SessionContext {
    let mut context = SessionContext::new(
        VenueType::Club,
        EventType::PeakTime,
        Duration::from_secs(3600),
        Some(EnergyCurve::flat(0.7)),
    );
    context.start();
    context
}

/// Benchmark the navigation cost model
fn bench_plan(c: &mut Criterion) {
    c.bench_function("plan_from", |b| {
        b.iter(|| {
            let mut total = 0u64;
            for current in (0..2000).step_by(37) {
                for target in (0..2000).step_by(41) {
                    total += plan_from(black_box(current), black_box(target), 30).cost as u64;
                }
            }
            black_box(total)
        })
    });
}

/// Benchmark compatible-track queries
fn bench_compatible(c: &mut Criterion) {
    let mut group = c.benchmark_group("compatible_with");
    let tolerance = TempoTolerance::default();

    for size in [1_000, 10_000].iter() {
        let catalog = catalog_of(*size);
        let reference = catalog.get_by_position(size / 2).expect("reference track");
        for mode in [KeyMode::TempoOnly, KeyMode::Intersect] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", mode), size),
                &catalog,
                |b, catalog| {
                    b.iter(|| black_box(catalog.compatible_with(reference, tolerance, mode).len()))
                },
            );
        }
    }

    group.finish();
}

/// Benchmark scoring and selection of the next track
fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_next");
    let scorer = CompatibilityScorer::new(ScoringWeights::default());
    let context = context();
    let exclude = HashSet::new();

    for size in [1_000, 10_000].iter() {
        let catalog = catalog_of(*size);
        let current = catalog.get_by_position(7).expect("current track");

        group.bench_with_input(BenchmarkId::new("reachable", size), &catalog, |b, catalog| {
            b.iter(|| {
                black_box(scorer.select_next(catalog.reachable(), Some(current), &context, &exclude))
            })
        });
        group.bench_with_input(BenchmarkId::new("pipeline", size), &catalog, |b, catalog| {
            b.iter(|| {
                black_box(scorer.select_from_catalog(catalog, Some(current), &context, &exclude))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_plan, bench_compatible, bench_select);
criterion_main!(benches);
