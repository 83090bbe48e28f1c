use std::sync::mpsc;

use rankwatch::cache::TickCache;
use rankwatch::models::{ProviderCommand, Rank, Tick};
use rankwatch::scheduler::Scheduler;

fn rank(tick: Tick) -> Rank {
    Rank {
        team_id: 4,
        rank: 1,
        points: 100.0,
        offense: 40.0,
        defense: 30.0,
        sla: 30.0,
        tick,
    }
}

fn drain_ticks(rx: &mpsc::Receiver<ProviderCommand>) -> Vec<Tick> {
    rx.try_iter()
        .map(|cmd| match cmd {
            ProviderCommand::FetchRanking { tick } => tick,
            other => panic!("unexpected command: {other:?}"),
        })
        .collect()
}

#[test]
fn ensure_range_issues_only_missing_ticks_newest_first() {
    let (tx, rx) = mpsc::channel();
    let mut sched = Scheduler::new(tx);
    let cache = TickCache::new();

    sched.ensure_range(&cache, 10, 7, false);

    assert_eq!(drain_ticks(&rx), vec![10, 9, 8, 7, 6, 5, 4]);
    assert_eq!(sched.outstanding(), 7);
}

#[test]
fn ensure_range_skips_cached_and_pending_ticks() {
    let (tx, rx) = mpsc::channel();
    let mut sched = Scheduler::new(tx);
    let mut cache = TickCache::new();

    sched.ensure_range(&cache, 10, 7, false);
    for tick in drain_ticks(&rx) {
        assert!(!sched.on_settled(tick));
        cache.put(tick, rank(tick));
    }
    assert_eq!(sched.outstanding(), 0);

    // Widened window: only the uncached tail is requested.
    sched.ensure_range(&cache, 10, 14, false);
    assert_eq!(drain_ticks(&rx), vec![3, 2, 1, 0]);
    assert_eq!(sched.outstanding(), 4);

    // Repeat while those four are still in flight: nothing new.
    sched.ensure_range(&cache, 10, 14, false);
    assert!(drain_ticks(&rx).is_empty());
    assert_eq!(sched.outstanding(), 4);
}

#[test]
fn ensure_range_stops_at_tick_zero() {
    let (tx, rx) = mpsc::channel();
    let mut sched = Scheduler::new(tx);
    let cache = TickCache::new();

    sched.ensure_range(&cache, 2, 7, false);

    assert_eq!(drain_ticks(&rx), vec![2, 1, 0]);
    assert_eq!(sched.outstanding(), 3);
}

#[test]
fn recompute_on_cached_current_returns_immediately() {
    let (tx, rx) = mpsc::channel();
    let mut sched = Scheduler::new(tx);
    let mut cache = TickCache::new();
    cache.put(5, rank(5));

    let compose_now = sched.ensure_range(&cache, 5, 1, true);

    assert!(compose_now);
    assert!(drain_ticks(&rx).is_empty());
    assert_eq!(sched.outstanding(), 0);
}

#[test]
fn recompute_on_missing_current_fires_when_it_settles() {
    let (tx, _rx) = mpsc::channel();
    let mut sched = Scheduler::new(tx);
    let cache = TickCache::new();

    let compose_now = sched.ensure_range(&cache, 5, 3, true);
    assert!(!compose_now);

    // A sibling tick settling does not trigger the recompose.
    assert!(!sched.on_settled(4));
    assert!(sched.on_settled(5));
    // Only once.
    assert!(!sched.on_settled(5));
}

#[test]
fn settled_tick_is_requested_again_if_still_missing() {
    let (tx, rx) = mpsc::channel();
    let mut sched = Scheduler::new(tx);
    let cache = TickCache::new();

    sched.ensure_range(&cache, 3, 1, false);
    assert_eq!(drain_ticks(&rx), vec![3]);

    // Fetch failed; nothing got cached.
    sched.on_settled(3);
    assert_eq!(sched.outstanding(), 0);

    sched.ensure_range(&cache, 3, 1, false);
    assert_eq!(drain_ticks(&rx), vec![3]);
}

#[test]
fn request_current_accepts_the_aggregate_tick() {
    let (tx, rx) = mpsc::channel();
    let mut sched = Scheduler::new(tx);

    sched.request_current(-1);
    assert_eq!(drain_ticks(&rx), vec![-1]);
    assert_eq!(sched.outstanding(), 1);
    assert!(sched.is_pending(-1));

    // Already in flight.
    sched.request_current(-1);
    assert!(drain_ticks(&rx).is_empty());
    assert_eq!(sched.outstanding(), 1);
}

#[test]
fn counter_never_underflows() {
    let (tx, _rx) = mpsc::channel();
    let mut sched = Scheduler::new(tx);

    sched.on_settled(42);
    assert_eq!(sched.outstanding(), 0);
}
