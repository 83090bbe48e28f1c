use std::collections::HashSet;
use std::sync::mpsc::Sender;

use crate::cache::TickCache;
use crate::models::{AGGREGATE_TICK, ProviderCommand, Tick};

/// Issues ranking fetches for missing ticks and tracks how many are still
/// outstanding. Completion order is arbitrary; `on_settled` runs for both
/// success and failure so the counter can never leak.
#[derive(Debug)]
pub struct Scheduler {
    cmd_tx: Sender<ProviderCommand>,
    pending: HashSet<Tick>,
    outstanding: u32,
    recompute_tick: Option<Tick>,
}

impl Scheduler {
    pub fn new(cmd_tx: Sender<ProviderCommand>) -> Self {
        Self {
            cmd_tx,
            pending: HashSet::new(),
            outstanding: 0,
            recompute_tick: None,
        }
    }

    pub fn outstanding(&self) -> u32 {
        self.outstanding
    }

    pub fn is_pending(&self, tick: Tick) -> bool {
        self.pending.contains(&tick)
    }

    /// Make sure the `count` most recent ticks ending at `current_tick` are
    /// cached or in flight. Issues at most one fetch per missing tick, never
    /// re-requesting a tick that is cached or already pending. The counter
    /// is incremented before the command leaves, so an observer polling
    /// between issue and completion never sees a transient "idle".
    ///
    /// Returns true when `recompute` was requested and the current tick is
    /// already cached: the caller should recompose synchronously, no round
    /// trip needed. Otherwise the recompute fires when the current tick's
    /// fetch settles.
    pub fn ensure_range(
        &mut self,
        cache: &TickCache,
        current_tick: Tick,
        count: usize,
        recompute: bool,
    ) -> bool {
        let mut compose_now = false;
        for offset in 0..count as i64 {
            let tick = current_tick - offset;
            if tick < 0 {
                break;
            }
            if cache.has(tick) {
                if recompute && tick == current_tick {
                    compose_now = true;
                }
                continue;
            }
            if recompute && tick == current_tick {
                self.recompute_tick = Some(tick);
            }
            if self.pending.insert(tick) {
                self.outstanding += 1;
                let _ = self.cmd_tx.send(ProviderCommand::FetchRanking { tick });
            }
        }
        compose_now
    }

    /// Fetch the full table for the current tick (aggregate included), used
    /// when the newest tick advances. The subject cache is irrelevant here:
    /// even a cached subject row does not contain the neighbors.
    pub fn request_current(&mut self, tick: Tick) {
        if tick < AGGREGATE_TICK {
            return;
        }
        if self.pending.insert(tick) {
            self.outstanding += 1;
            let _ = self.cmd_tx.send(ProviderCommand::FetchRanking { tick });
        }
    }

    /// Completion handler for one ranking fetch, success or failure.
    /// Returns true when this tick's arrival should trigger a recompose.
    pub fn on_settled(&mut self, tick: Tick) -> bool {
        if self.pending.remove(&tick) {
            self.outstanding = self.outstanding.saturating_sub(1);
        }
        if self.recompute_tick == Some(tick) {
            self.recompute_tick = None;
            return true;
        }
        false
    }
}
