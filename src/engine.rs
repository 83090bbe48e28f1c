use std::collections::{HashMap, VecDeque};
use std::env;
use std::sync::mpsc::Sender;

use crate::backfill::BACKFILL_INCREMENT;
use crate::cache::TickCache;
use crate::composer::{ComposedDataset, Composer, HistoryRequest};
use crate::models::{Delta, ProviderCommand, RoundInformation, Team, Tick};
use crate::palette::Palette;
use crate::scheduler::Scheduler;

const MAX_LOG_LINES: usize = 50;

/// Incremental history engine for one subject team. Owns the tick cache,
/// the fetch scheduler and the dataset composer, and merges every
/// asynchronous completion through `apply_delta`, the single place shared
/// state changes, so arbitrary completion order cannot corrupt it.
pub struct Engine {
    subject_id: u32,
    current_tick: Option<Tick>,
    current_round: Option<RoundInformation>,
    cache: TickCache,
    scheduler: Scheduler,
    composer: Composer,
    teams: HashMap<u32, Team>,
    window: usize,
    initial_window: usize,
    palette: Palette,
    // Set while the newest-tick fetch is in flight; its arrival widens the
    // window and recomposes.
    awaiting_current: bool,
    cmd_tx: Sender<ProviderCommand>,
    logs: VecDeque<String>,
}

impl Engine {
    pub fn new(subject_id: u32, cmd_tx: Sender<ProviderCommand>) -> Self {
        let initial_window = env::var("HISTORY_WINDOW")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(7)
            .max(1);
        Self {
            subject_id,
            current_tick: None,
            current_round: None,
            cache: TickCache::new(),
            scheduler: Scheduler::new(cmd_tx.clone()),
            composer: Composer::new(),
            teams: HashMap::new(),
            window: initial_window,
            initial_window,
            palette: Palette::light(),
            awaiting_current: false,
            cmd_tx,
            logs: VecDeque::new(),
        }
    }

    pub fn subject_id(&self) -> u32 {
        self.subject_id
    }

    pub fn current_tick(&self) -> Option<Tick> {
        self.current_tick
    }

    pub fn current_round(&self) -> Option<&RoundInformation> {
        self.current_round.as_ref()
    }

    pub fn cache(&self) -> &TickCache {
        &self.cache
    }

    pub fn teams(&self) -> &HashMap<u32, Team> {
        &self.teams
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn outstanding(&self) -> u32 {
        self.scheduler.outstanding()
    }

    pub fn dataset(&self) -> &ComposedDataset {
        self.composer.dataset()
    }

    pub fn revision(&self) -> u64 {
        self.composer.dataset().revision()
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn logs(&self) -> impl Iterator<Item = &str> {
        self.logs.iter().map(String::as_str)
    }

    /// Bind the view to a different team. The old cache is useless for the
    /// new subject and is dropped wholesale; the window resets; in-flight
    /// history replies are invalidated via their tokens. In-flight ranking
    /// fetches stay useful (the table they return covers all teams) and
    /// will merge for the new subject on arrival.
    pub fn set_subject(&mut self, team_id: u32) {
        self.subject_id = team_id;
        self.cache = TickCache::new();
        self.window = self.initial_window;
        self.composer.invalidate_tokens();
        if let Some(tick) = self.current_tick
            && tick >= 0
            && self
                .scheduler
                .ensure_range(&self.cache, tick, self.window, true)
        {
            self.compose();
        }
    }

    /// Backfill: widen the window by the fixed increment and fill the gaps.
    pub fn load_more(&mut self) {
        self.window += BACKFILL_INCREMENT;
        if let Some(tick) = self.current_tick
            && tick >= 0
        {
            self.scheduler
                .ensure_range(&self.cache, tick, self.window, false);
        }
    }

    /// Theme hook: swap the palette and restyle every series in place.
    pub fn set_dark_mode(&mut self, dark: bool) {
        self.palette = Palette::for_mode(dark);
        self.composer.restyle(&self.palette);
    }

    /// Merge one asynchronous completion. Each variant only ever writes its
    /// own tick/slot, so completions are safe in any order and repeats are
    /// no-ops.
    pub fn apply_delta(&mut self, delta: Delta) {
        match delta {
            Delta::NewestTick(tick) => {
                self.current_tick = Some(tick);
                self.awaiting_current = true;
                self.scheduler.request_current(tick);
            }
            Delta::SetTeams(teams) => {
                self.push_log(format!("[INFO] Loaded {} teams", teams.len()));
                self.teams = teams.into_iter().map(|t| (t.id, t)).collect();
            }
            Delta::SetRoundInfo { tick, info } => {
                let recompute = self.scheduler.on_settled(tick);
                if tick >= 0 {
                    self.cache.merge_round(&info, self.subject_id);
                }
                let is_current = self.current_tick == Some(tick);
                let mut compose_now = recompute && is_current;
                if is_current {
                    self.current_round = Some(info);
                    if self.awaiting_current {
                        self.awaiting_current = false;
                        if tick >= 0 {
                            compose_now |= self.scheduler.ensure_range(
                                &self.cache,
                                tick,
                                self.window,
                                true,
                            );
                        } else {
                            // Aggregate view: compose bails out early, the
                            // table header still shows the overall ranking.
                            compose_now = true;
                        }
                    }
                }
                if compose_now {
                    self.compose();
                }
            }
            Delta::RoundInfoFailed { tick, error } => {
                self.scheduler.on_settled(tick);
                if self.current_tick == Some(tick) {
                    self.awaiting_current = false;
                }
                // The tick stays absent; the next ensure_range or backfill
                // cadence re-attempts it.
                self.push_log(format!("[WARN] Ranking fetch for tick {tick} failed: {error}"));
            }
            Delta::SetTeamHistory {
                team_id,
                seq,
                series,
            } => {
                if !self.composer.apply_subject_history(team_id, seq, &series) {
                    self.push_log(format!(
                        "[INFO] Discarded stale history reply for team {team_id}"
                    ));
                }
            }
            Delta::TeamHistoryFailed { team_id, error } => {
                self.push_log(format!(
                    "[WARN] History fetch for team {team_id} failed: {error}"
                ));
            }
            Delta::SetNeighborHistory { token, points } => {
                if !self.composer.apply_neighbor_history(token, &points) {
                    self.push_log(format!(
                        "[INFO] Discarded stale neighbor reply for team {}",
                        token.team
                    ));
                }
            }
            Delta::NeighborHistoryFailed { token, error } => {
                self.push_log(format!(
                    "[WARN] Neighbor history fetch for team {} failed: {error}",
                    token.team
                ));
            }
            Delta::Log(line) => self.push_log(line),
        }
    }

    fn compose(&mut self) {
        let Some(round) = &self.current_round else {
            return;
        };
        let requests = self
            .composer
            .compose(round, self.subject_id, &self.teams, &self.palette);
        for request in requests {
            let command = match request {
                HistoryRequest::Neighbor { token } => {
                    ProviderCommand::FetchNeighborHistory { token }
                }
                HistoryRequest::Subject { team_id, seq } => {
                    ProviderCommand::FetchTeamHistory { team_id, seq }
                }
            };
            let _ = self.cmd_tx.send(command);
        }
    }

    fn push_log(&mut self, line: String) {
        self.logs.push_back(line);
        while self.logs.len() > MAX_LOG_LINES {
            self.logs.pop_front();
        }
    }
}
