use std::collections::HashMap;
use std::hint::black_box;
use std::sync::mpsc;

use criterion::{Criterion, criterion_group, criterion_main};

use rankwatch::cache::TickCache;
use rankwatch::composer::Composer;
use rankwatch::models::{Rank, RoundInformation, Service, Team, Tick};
use rankwatch::palette::Palette;
use rankwatch::ranking_fetch::parse_round_json;
use rankwatch::scheduler::Scheduler;

fn large_round(tick: Tick, teams: u32, services: usize) -> RoundInformation {
    RoundInformation {
        tick,
        scoreboard: (0..teams)
            .map(|i| Rank {
                team_id: i + 1,
                rank: i + 1,
                points: f64::from(teams - i) * 10.0,
                offense: 0.0,
                defense: 0.0,
                sla: 0.0,
                tick,
            })
            .collect(),
        services: (0..services)
            .map(|i| Service {
                id: i as u32 + 1,
                name: format!("service-{i}"),
            })
            .collect(),
        started_at: None,
    }
}

fn team_map(count: u32) -> HashMap<u32, Team> {
    (1..=count)
        .map(|id| {
            (
                id,
                Team {
                    id,
                    name: format!("Team {id}"),
                },
            )
        })
        .collect()
}

fn bench_compose_large_table(c: &mut Criterion) {
    let round = large_round(120, 300, 10);
    let teams = team_map(300);
    let palette = Palette::light();

    c.bench_function("compose_large_table", |b| {
        let mut composer = Composer::new();
        b.iter(|| {
            let requests = composer.compose(
                black_box(&round),
                black_box(150),
                black_box(&teams),
                &palette,
            );
            black_box(requests.len());
        })
    });
}

fn bench_ensure_range_sparse_cache(c: &mut Criterion) {
    let mut cache = TickCache::new();
    let round = large_round(500, 300, 10);
    for tick in (0..500).step_by(3) {
        cache.merge_round(&large_round(tick, 300, 10), 150);
    }
    black_box(&round);

    c.bench_function("ensure_range_sparse_cache", |b| {
        b.iter(|| {
            let (tx, rx) = mpsc::channel();
            let mut sched = Scheduler::new(tx);
            sched.ensure_range(black_box(&cache), 500, 500, false);
            black_box(rx.try_iter().count());
        })
    });
}

fn bench_round_parse(c: &mut Criterion) {
    let json = serde_json::to_string(&large_round(120, 300, 10)).unwrap();

    c.bench_function("round_parse", |b| {
        b.iter(|| {
            let info = parse_round_json(black_box(&json)).unwrap();
            black_box(info.scoreboard.len());
        })
    });
}

fn bench_ticks_desc_sort(c: &mut Criterion) {
    let mut cache = TickCache::new();
    for tick in 0..500 {
        cache.merge_round(&large_round(tick, 4, 1), 1);
    }

    c.bench_function("ticks_desc_sort", |b| {
        b.iter(|| {
            let ticks = cache.ticks_desc();
            black_box(ticks.len());
        })
    });
}

criterion_group!(
    perf,
    bench_compose_large_table,
    bench_ensure_range_sparse_cache,
    bench_round_parse,
    bench_ticks_desc_sort
);
criterion_main!(perf);
