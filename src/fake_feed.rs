use std::collections::HashMap;
use std::env;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use rand::Rng;

use crate::models::{
    AGGREGATE_TICK, Delta, ProviderCommand, Rank, RoundInformation, Service, Team, Tick,
};

const TEAM_NAMES: &[&str] = &[
    "StackSmashers",
    "Null Division",
    "Red Pandas",
    "Shellcollective",
    "Bitrot",
    "Packet Heads",
    "Kernel Space",
    "Mov Eax",
    "Overflowers",
    "Cold Boot",
    "Ring Zero",
    "Heap of Trouble",
];

const SERVICE_NAMES: &[&str] = &["auth", "filestore", "exchange", "telemetry"];

/// How many rounds already exist when the demo starts, so there is history
/// to backfill into right away.
const SEED_ROUNDS: Tick = 9;

/// Synthetic competition provider for offline/demo runs. Serves the same
/// command set as the live provider, but each reply is delivered from its
/// own short-lived thread after a random delay, so completions genuinely
/// interleave out of order the way a busy scoreboard's do.
pub fn spawn_fake_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let mut rng = rand::thread_rng();
        let round_interval = Duration::from_secs(
            env::var("FAKE_ROUND_SECS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(15)
                .max(3),
        );
        let fail_pct = env::var("FAKE_FAIL_PCT")
            .ok()
            .and_then(|val| val.parse::<f64>().ok())
            .unwrap_or(0.0)
            .clamp(0.0, 0.9);

        let mut world = FakeWorld::seeded(&mut rng);
        let mut last_round = Instant::now();

        let _ = tx.send(Delta::SetTeams(world.teams.clone()));
        let _ = tx.send(Delta::NewestTick(world.latest_tick));

        loop {
            thread::sleep(Duration::from_millis(100));

            if last_round.elapsed() >= round_interval {
                world.advance(&mut rng);
                let _ = tx.send(Delta::NewestTick(world.latest_tick));
                last_round = Instant::now();
            }

            loop {
                match cmd_rx.try_recv() {
                    Ok(cmd) => {
                        let delta = world.serve(cmd, fail_pct, &mut rng);
                        let delay = Duration::from_millis(rng.gen_range(20..250));
                        let tx = tx.clone();
                        thread::spawn(move || {
                            thread::sleep(delay);
                            let _ = tx.send(delta);
                        });
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return,
                }
            }
        }
    });
}

struct FakeWorld {
    teams: Vec<Team>,
    services: Vec<Service>,
    // team id -> per service -> cumulative points, index = tick
    points: HashMap<u32, Vec<Vec<f64>>>,
    latest_tick: Tick,
}

impl FakeWorld {
    fn seeded(rng: &mut impl Rng) -> Self {
        let teams: Vec<Team> = TEAM_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| Team {
                id: i as u32 + 1,
                name: (*name).to_string(),
            })
            .collect();
        let services: Vec<Service> = SERVICE_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| Service {
                id: i as u32 + 1,
                name: (*name).to_string(),
            })
            .collect();
        let points = teams
            .iter()
            .map(|t| (t.id, vec![Vec::new(); services.len()]))
            .collect();

        let mut world = Self {
            teams,
            services,
            points,
            latest_tick: -1,
        };
        for _ in 0..=SEED_ROUNDS {
            world.advance(rng);
        }
        world
    }

    fn advance(&mut self, rng: &mut impl Rng) {
        self.latest_tick += 1;
        for (team_id, series) in self.points.iter_mut() {
            // A per-team skill bias keeps the table from being pure noise.
            let skill = 4.0 + f64::from(*team_id * 7 % 13);
            for per_service in series.iter_mut() {
                let last = per_service.last().copied().unwrap_or(0.0);
                per_service.push(last + skill + rng.gen_range(0.0..20.0));
            }
        }
    }

    fn serve(&self, cmd: ProviderCommand, fail_pct: f64, rng: &mut impl Rng) -> Delta {
        match cmd {
            ProviderCommand::FetchRanking { tick } => {
                if rng.gen_bool(fail_pct) {
                    return Delta::RoundInfoFailed {
                        tick,
                        error: "simulated outage".to_string(),
                    };
                }
                match self.round_info(tick) {
                    Some(info) => Delta::SetRoundInfo { tick, info },
                    None => Delta::RoundInfoFailed {
                        tick,
                        error: format!("round {tick} not finished"),
                    },
                }
            }
            ProviderCommand::FetchTeams => Delta::SetTeams(self.teams.clone()),
            ProviderCommand::FetchTeamHistory { team_id, seq } => Delta::SetTeamHistory {
                team_id,
                seq,
                series: self.team_history(team_id),
            },
            ProviderCommand::FetchNeighborHistory { token } => Delta::SetNeighborHistory {
                token,
                points: self.team_points(token.team),
            },
        }
    }

    fn round_info(&self, tick: Tick) -> Option<RoundInformation> {
        let effective = if tick == AGGREGATE_TICK {
            self.latest_tick
        } else {
            tick
        };
        if effective < 0 || effective > self.latest_tick {
            return None;
        }
        let idx = effective as usize;

        let mut rows: Vec<(u32, f64, f64)> = self
            .teams
            .iter()
            .map(|team| {
                let series = &self.points[&team.id];
                let total: f64 = series.iter().map(|s| s[idx]).sum();
                let offense: f64 = series.iter().map(|s| s[idx] * 0.4).sum();
                (team.id, total, offense)
            })
            .collect();
        rows.sort_by(|a, b| b.1.total_cmp(&a.1));

        let scoreboard = rows
            .into_iter()
            .enumerate()
            .map(|(i, (team_id, points, offense))| Rank {
                team_id,
                rank: i as u32 + 1,
                points,
                offense,
                defense: points * 0.3,
                sla: points * 0.3,
                tick,
            })
            .collect();

        Some(RoundInformation {
            tick,
            scoreboard,
            services: self.services.clone(),
            started_at: Some(Utc::now()),
        })
    }

    fn team_history(&self, team_id: u32) -> Vec<Vec<f64>> {
        self.points.get(&team_id).cloned().unwrap_or_default()
    }

    fn team_points(&self, team_id: u32) -> Vec<f64> {
        let Some(series) = self.points.get(&team_id) else {
            return Vec::new();
        };
        let rounds = self.latest_tick.max(0) as usize + 1;
        (0..rounds)
            .map(|tick| series.iter().map(|s| s[tick]).sum())
            .collect()
    }
}
