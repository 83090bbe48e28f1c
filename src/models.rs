use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discrete round index. `-1` is the overall/aggregate view.
pub type Tick = i64;

pub const AGGREGATE_TICK: Tick = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rank {
    pub team_id: u32,
    pub rank: u32,
    pub points: f64,
    #[serde(default)]
    pub offense: f64,
    #[serde(default)]
    pub defense: f64,
    #[serde(default)]
    pub sla: f64,
    /// Back-reference to the round this entry belongs to. Not part of the
    /// per-row wire payload; filled in from the surrounding round.
    #[serde(default = "aggregate_tick")]
    pub tick: Tick,
}

fn aggregate_tick() -> Tick {
    AGGREGATE_TICK
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: u32,
    pub name: String,
}

/// Full ranking table for one round, ordered by rank, plus the services
/// scored that round. Produced by the backend; consumed read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundInformation {
    pub tick: Tick,
    pub scoreboard: Vec<Rank>,
    pub services: Vec<Service>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborSlot {
    Before,
    After,
}

/// Generation token for an in-flight neighbor point-history fetch. A reply
/// is applied only while the slot still expects exactly this token, so a
/// slow reply for a neighbor that has since changed is discarded instead of
/// landing in a repurposed slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryToken {
    pub subject: u32,
    pub team: u32,
    pub slot: NeighborSlot,
    pub seq: u64,
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchRanking { tick: Tick },
    FetchTeams,
    FetchTeamHistory { team_id: u32, seq: u64 },
    FetchNeighborHistory { token: HistoryToken },
}

/// Asynchronous completion messages merged by the engine. Every issued
/// command produces exactly one completion variant, success or failure, in
/// whatever order the backend settles them.
#[derive(Debug, Clone)]
pub enum Delta {
    /// Authoritative "latest known tick" advanced.
    NewestTick(Tick),
    SetTeams(Vec<Team>),
    SetRoundInfo {
        tick: Tick,
        info: RoundInformation,
    },
    RoundInfoFailed {
        tick: Tick,
        error: String,
    },
    SetTeamHistory {
        team_id: u32,
        seq: u64,
        series: Vec<Vec<f64>>,
    },
    TeamHistoryFailed {
        team_id: u32,
        error: String,
    },
    SetNeighborHistory {
        token: HistoryToken,
        points: Vec<f64>,
    },
    NeighborHistoryFailed {
        token: HistoryToken,
        error: String,
    },
    Log(String),
}
