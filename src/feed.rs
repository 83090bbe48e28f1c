use std::env;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use crate::models::{Delta, ProviderCommand, Tick};
use crate::ranking_fetch;

/// Worker thread against a live scoreboard. Polls the current tick on an
/// interval and emits `Delta::NewestTick` when it advances; serves fetch
/// commands as they arrive. Every command produces exactly one completion
/// delta, success or failure, so the engine's outstanding counter stays
/// balanced no matter what the network does.
pub fn spawn_live_provider(base_url: String, tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let poll_interval = Duration::from_secs(
            env::var("TICK_POLL_SECS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(10)
                .max(2),
        );
        let mut last_poll = Instant::now() - poll_interval;
        let mut newest: Option<Tick> = None;

        match ranking_fetch::fetch_teams(&base_url) {
            Ok(teams) => {
                let _ = tx.send(Delta::SetTeams(teams));
            }
            Err(err) => {
                let _ = tx.send(Delta::Log(format!("[WARN] Team list fetch error: {err}")));
            }
        }

        loop {
            if last_poll.elapsed() >= poll_interval {
                match ranking_fetch::fetch_current_tick(&base_url) {
                    Ok(tick) if newest != Some(tick) => {
                        newest = Some(tick);
                        let _ = tx.send(Delta::NewestTick(tick));
                    }
                    Ok(_) => {}
                    Err(err) => {
                        let _ = tx.send(Delta::Log(format!("[WARN] Tick poll error: {err}")));
                    }
                }
                last_poll = Instant::now();
            }

            loop {
                match cmd_rx.try_recv() {
                    Ok(cmd) => {
                        // One thread per command: a slow round fetch must not
                        // stall the rest of a backfill window or the tick poll.
                        let base_url = base_url.clone();
                        let tx = tx.clone();
                        thread::spawn(move || handle_command(&base_url, &tx, cmd));
                    }
                    Err(TryRecvError::Empty) => break,
                    // View closed; in-flight work dies with the channel.
                    Err(TryRecvError::Disconnected) => return,
                }
            }

            thread::sleep(Duration::from_millis(150));
        }
    });
}

fn handle_command(base_url: &str, tx: &Sender<Delta>, cmd: ProviderCommand) {
    match cmd {
        ProviderCommand::FetchRanking { tick } => {
            match ranking_fetch::fetch_round(base_url, tick) {
                Ok(info) => {
                    let _ = tx.send(Delta::SetRoundInfo { tick, info });
                }
                Err(err) => {
                    let _ = tx.send(Delta::RoundInfoFailed {
                        tick,
                        error: err.to_string(),
                    });
                }
            }
        }
        ProviderCommand::FetchTeams => match ranking_fetch::fetch_teams(base_url) {
            Ok(teams) => {
                let _ = tx.send(Delta::SetTeams(teams));
            }
            Err(err) => {
                let _ = tx.send(Delta::Log(format!("[WARN] Team list fetch error: {err}")));
            }
        },
        ProviderCommand::FetchTeamHistory { team_id, seq } => {
            match ranking_fetch::fetch_team_history(base_url, team_id) {
                Ok(series) => {
                    let _ = tx.send(Delta::SetTeamHistory {
                        team_id,
                        seq,
                        series,
                    });
                }
                Err(err) => {
                    let _ = tx.send(Delta::TeamHistoryFailed {
                        team_id,
                        error: err.to_string(),
                    });
                }
            }
        }
        ProviderCommand::FetchNeighborHistory { token } => {
            match ranking_fetch::fetch_team_points(base_url, token.team) {
                Ok(points) => {
                    let _ = tx.send(Delta::SetNeighborHistory { token, points });
                }
                Err(err) => {
                    let _ = tx.send(Delta::NeighborHistoryFailed {
                        token,
                        error: err.to_string(),
                    });
                }
            }
        }
    }
}
