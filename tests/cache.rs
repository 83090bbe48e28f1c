use rankwatch::cache::TickCache;
use rankwatch::models::{Rank, RoundInformation, Service, Tick};

fn rank(team_id: u32, position: u32, points: f64, tick: Tick) -> Rank {
    Rank {
        team_id,
        rank: position,
        points,
        offense: points * 0.4,
        defense: points * 0.3,
        sla: points * 0.3,
        tick,
    }
}

fn round(tick: Tick, rows: Vec<Rank>) -> RoundInformation {
    RoundInformation {
        tick,
        scoreboard: rows,
        services: vec![Service {
            id: 1,
            name: "auth".to_string(),
        }],
        started_at: None,
    }
}

#[test]
fn absent_tick_is_none_not_zero() {
    let cache = TickCache::new();
    assert!(!cache.has(3));
    assert!(cache.get(3).is_none());
    assert!(cache.is_empty());
}

#[test]
fn put_is_idempotent_first_write_wins() {
    let mut cache = TickCache::new();
    cache.put(5, rank(4, 2, 100.0, 5));
    cache.put(5, rank(4, 9, 999.0, 5));

    let stored = cache.get(5).unwrap();
    assert_eq!(stored.rank, 2);
    assert_eq!(stored.points, 100.0);
    assert_eq!(cache.len(), 1);
}

#[test]
fn merge_round_extracts_the_subject_row() {
    let mut cache = TickCache::new();
    let info = round(
        7,
        vec![rank(9, 1, 300.0, 7), rank(4, 2, 250.0, 7), rank(2, 3, 200.0, 7)],
    );

    assert!(cache.merge_round(&info, 4));
    let stored = cache.get(7).unwrap();
    assert_eq!(stored.team_id, 4);
    assert_eq!(stored.rank, 2);
}

#[test]
fn merge_round_without_subject_is_a_noop() {
    let mut cache = TickCache::new();
    let info = round(7, vec![rank(9, 1, 300.0, 7), rank(2, 2, 200.0, 7)]);

    assert!(!cache.merge_round(&info, 4));
    assert!(!cache.has(7));
    assert!(cache.is_empty());
}

#[test]
fn ticks_desc_sorts_newest_first() {
    let mut cache = TickCache::new();
    for tick in [3, 9, 0, 6] {
        cache.put(tick, rank(4, 1, tick as f64, tick));
    }
    assert_eq!(cache.ticks_desc(), vec![9, 6, 3, 0]);
}
