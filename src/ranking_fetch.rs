use anyhow::{Context, Result};
use serde::Deserialize;

use crate::http_client::http_client;
use crate::models::{AGGREGATE_TICK, RoundInformation, Team, Tick};

pub fn fetch_current_tick(base: &str) -> Result<Tick> {
    let body = get(&format!("{base}/api/scoreboard/current.json"))?;
    parse_current_json(&body)
}

pub fn fetch_teams(base: &str) -> Result<Vec<Team>> {
    let body = get(&format!("{base}/api/scoreboard/teams.json"))?;
    parse_teams_json(&body)
}

/// Tick `-1` maps to the overall (aggregate) ranking endpoint.
pub fn fetch_round(base: &str, tick: Tick) -> Result<RoundInformation> {
    let url = if tick == AGGREGATE_TICK {
        format!("{base}/api/scoreboard/overall.json")
    } else {
        format!("{base}/api/scoreboard/round_{tick}.json")
    };
    let body = get(&url)?;
    parse_round_json(&body)
}

/// Per-service cumulative point arrays for one team, service order matching
/// the round's service list.
pub fn fetch_team_history(base: &str, team_id: u32) -> Result<Vec<Vec<f64>>> {
    let body = get(&format!("{base}/api/scoreboard/team_{team_id}_history.json"))?;
    parse_team_history_json(&body)
}

/// Single aggregate point trajectory for one team (neighbor trend lines).
pub fn fetch_team_points(base: &str, team_id: u32) -> Result<Vec<f64>> {
    let body = get(&format!("{base}/api/scoreboard/team_{team_id}_points.json"))?;
    parse_team_points_json(&body)
}

fn get(url: &str) -> Result<String> {
    let client = http_client()?;
    let resp = client.get(url).send().context("request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow::anyhow!("http {}: {}", status, body));
    }
    Ok(body)
}

#[derive(Debug, Deserialize)]
struct CurrentPayload {
    current_tick: Tick,
}

pub fn parse_current_json(raw: &str) -> Result<Tick> {
    let payload: CurrentPayload =
        serde_json::from_str(raw).context("malformed current-tick payload")?;
    if payload.current_tick < AGGREGATE_TICK {
        return Err(anyhow::anyhow!(
            "current tick out of range: {}",
            payload.current_tick
        ));
    }
    Ok(payload.current_tick)
}

#[derive(Debug, Deserialize)]
struct TeamsPayload {
    #[serde(default)]
    teams: Vec<Team>,
}

pub fn parse_teams_json(raw: &str) -> Result<Vec<Team>> {
    let payload: TeamsPayload = serde_json::from_str(raw).context("malformed teams payload")?;
    Ok(payload.teams)
}

pub fn parse_round_json(raw: &str) -> Result<RoundInformation> {
    let mut info: RoundInformation =
        serde_json::from_str(raw).context("malformed round payload")?;
    // Rows carry no tick of their own on the wire; stamp the round's.
    for rank in &mut info.scoreboard {
        rank.tick = info.tick;
    }
    Ok(info)
}

#[derive(Debug, Deserialize)]
struct HistoryPayload {
    #[serde(default)]
    series: Vec<Vec<f64>>,
}

pub fn parse_team_history_json(raw: &str) -> Result<Vec<Vec<f64>>> {
    let payload: HistoryPayload =
        serde_json::from_str(raw).context("malformed history payload")?;
    Ok(payload.series)
}

#[derive(Debug, Deserialize)]
struct PointsPayload {
    #[serde(default)]
    points: Vec<f64>,
}

pub fn parse_team_points_json(raw: &str) -> Result<Vec<f64>> {
    let payload: PointsPayload =
        serde_json::from_str(raw).context("malformed points payload")?;
    Ok(payload.points)
}
