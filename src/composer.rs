use std::collections::HashMap;

use ratatui::style::Color;

use crate::models::{HistoryToken, NeighborSlot, RoundInformation, Team, Tick};
use crate::palette::Palette;

/// Stable identity of one chart series, used to decide whether a slot can
/// be reused or must be replaced. Neighbor slots always lead the list in
/// (before, after) order, services follow in their round order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    NeighborBefore,
    NeighborAfter,
    Service(usize),
}

#[derive(Debug, Clone)]
pub struct ChartSeries {
    pub kind: SeriesKind,
    pub label: String,
    /// (tick, value) pairs, tick 0 first.
    pub data: Vec<(f64, f64)>,
    pub color_index: usize,
    pub color: Color,
    /// Trend lines (neighbors) draw as bare lines; service series fill.
    pub line_only: bool,
}

impl ChartSeries {
    fn line(kind: SeriesKind) -> Self {
        Self {
            kind,
            label: String::new(),
            data: Vec::new(),
            color_index: 0,
            color: Color::Reset,
            line_only: true,
        }
    }

    fn area(kind: SeriesKind, label: String) -> Self {
        Self {
            kind,
            label,
            data: Vec::new(),
            color_index: 0,
            color: Color::Reset,
            line_only: false,
        }
    }
}

/// The ordered series list plus the shared tick axis handed to the
/// renderer. `revision` is the redraw signal: it bumps on every mutation,
/// and an unchanged revision means there is nothing new to paint.
#[derive(Debug, Default)]
pub struct ComposedDataset {
    pub series: Vec<ChartSeries>,
    pub labels: Vec<Tick>,
    revision: u64,
}

impl ComposedDataset {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

/// Point-history fetches a compose pass wants issued. The engine forwards
/// them to the provider; replies come back as deltas carrying the same
/// token/sequence and are applied through `apply_*` below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRequest {
    Neighbor { token: HistoryToken },
    Subject { team_id: u32, seq: u64 },
}

/// Derives the chart series list from the current round's table and keeps
/// the previously rendered dataset in sync with minimal structural edits,
/// so the renderer never sees a full rebuild.
#[derive(Debug, Default)]
pub struct Composer {
    dataset: ComposedDataset,
    // Neighbor series keep their accumulated data while spliced out; the
    // parked slot is where a removed series waits for its next insert.
    parked_before: Option<ChartSeries>,
    parked_after: Option<ChartSeries>,
    expected_before: Option<HistoryToken>,
    expected_after: Option<HistoryToken>,
    expected_subject: Option<(u32, u64)>,
    next_seq: u64,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dataset(&self) -> &ComposedDataset {
        &self.dataset
    }

    /// Recompute the series list for `round`. Returns the history fetches
    /// to issue. Calling this twice with the same inputs yields the same
    /// series identities and length; only the tokens advance.
    pub fn compose(
        &mut self,
        round: &RoundInformation,
        subject_id: u32,
        teams: &HashMap<u32, Team>,
        palette: &Palette,
    ) -> Vec<HistoryRequest> {
        let mut requests = Vec::new();
        if round.tick < 0 {
            // Aggregate view: no per-tick table to derive series from.
            return requests;
        }

        let mut before = None;
        let mut after = None;
        if let Some(i) = round
            .scoreboard
            .iter()
            .position(|r| r.team_id == subject_id)
        {
            if i > 0 {
                before = Some(round.scoreboard[i - 1].team_id);
            }
            if i + 1 < round.scoreboard.len() {
                after = Some(round.scoreboard[i + 1].team_id);
            }
        }

        let mut pos = 0;
        pos = self.sync_neighbor_slot(
            NeighborSlot::Before,
            before,
            pos,
            subject_id,
            teams,
            palette,
            &mut requests,
        );
        pos = self.sync_neighbor_slot(
            NeighborSlot::After,
            after,
            pos,
            subject_id,
            teams,
            palette,
            &mut requests,
        );

        for (i, service) in round.services.iter().enumerate() {
            let slot = pos + i;
            if self.dataset.series.len() <= slot {
                let mut series = ChartSeries::area(SeriesKind::Service(i), service.name.clone());
                palette.apply_scheme(&mut series, (i % (palette.series_colors() - 2)) + 2);
                self.dataset.series.push(series);
            } else {
                let series = &mut self.dataset.series[slot];
                series.kind = SeriesKind::Service(i);
                series.label = service.name.clone();
            }
        }
        self.dataset.series.truncate(pos + round.services.len());

        while self.dataset.labels.len() <= round.tick as usize {
            self.dataset.labels.push(self.dataset.labels.len() as Tick);
        }

        let seq = self.bump_seq();
        self.expected_subject = Some((subject_id, seq));
        requests.push(HistoryRequest::Subject {
            team_id: subject_id,
            seq,
        });

        self.dataset.touch();
        requests
    }

    #[allow(clippy::too_many_arguments)]
    fn sync_neighbor_slot(
        &mut self,
        slot: NeighborSlot,
        neighbor: Option<u32>,
        pos: usize,
        subject_id: u32,
        teams: &HashMap<u32, Team>,
        palette: &Palette,
        requests: &mut Vec<HistoryRequest>,
    ) -> usize {
        let kind = match slot {
            NeighborSlot::Before => SeriesKind::NeighborBefore,
            NeighborSlot::After => SeriesKind::NeighborAfter,
        };
        let Some(team_id) = neighbor else {
            // Slot emptied: splice the series out but keep its data for the
            // next time this neighbor position comes back.
            if self
                .dataset
                .series
                .get(pos)
                .is_some_and(|s| s.kind == kind)
            {
                let series = self.dataset.series.remove(pos);
                *self.parked_mut(slot) = Some(series);
            }
            *self.expected_mut(slot) = None;
            return pos;
        };

        if !self
            .dataset
            .series
            .get(pos)
            .is_some_and(|s| s.kind == kind)
        {
            let mut series = self
                .parked_mut(slot)
                .take()
                .unwrap_or_else(|| ChartSeries::line(kind));
            // Scheme slots 0 and 1 are reserved for the neighbor lines.
            let scheme = match slot {
                NeighborSlot::After => 0,
                NeighborSlot::Before => 1,
            };
            palette.apply_scheme(&mut series, scheme);
            self.dataset.series.insert(pos, series);
        }

        self.dataset.series[pos].label = match teams.get(&team_id) {
            Some(team) => format!("Team {}", team.name),
            None => format!("Team #{team_id}"),
        };

        let token = HistoryToken {
            subject: subject_id,
            team: team_id,
            slot,
            seq: self.bump_seq(),
        };
        *self.expected_mut(slot) = Some(token);
        requests.push(HistoryRequest::Neighbor { token });
        pos + 1
    }

    /// Apply a neighbor point-history reply. Stale tokens (slot since
    /// repurposed, subject since changed) are discarded silently.
    pub fn apply_neighbor_history(&mut self, token: HistoryToken, points: &[f64]) -> bool {
        if *self.expected_mut(token.slot) != Some(token) {
            return false;
        }
        let kind = match token.slot {
            NeighborSlot::Before => SeriesKind::NeighborBefore,
            NeighborSlot::After => SeriesKind::NeighborAfter,
        };
        let Some(series) = self.dataset.series.iter_mut().find(|s| s.kind == kind) else {
            return false;
        };
        series.data = points_to_data(points);
        self.dataset.touch();
        true
    }

    /// Apply the subject's multi-series history: one array per service,
    /// assigned by position after the neighbor slots.
    pub fn apply_subject_history(&mut self, team_id: u32, seq: u64, series: &[Vec<f64>]) -> bool {
        if self.expected_subject != Some((team_id, seq)) {
            return false;
        }
        let offset = self
            .dataset
            .series
            .iter()
            .take_while(|s| !matches!(s.kind, SeriesKind::Service(_)))
            .count();
        let mut applied = false;
        for (i, points) in series.iter().enumerate() {
            if let Some(slot) = self.dataset.series.get_mut(offset + i) {
                slot.data = points_to_data(points);
                applied = true;
            }
        }
        if applied {
            self.dataset.touch();
        }
        applied
    }

    /// Re-resolve every series' colors after a theme change.
    pub fn restyle(&mut self, palette: &Palette) {
        for series in &mut self.dataset.series {
            let index = series.color_index;
            palette.apply_scheme(series, index);
        }
        for parked in [&mut self.parked_before, &mut self.parked_after] {
            if let Some(series) = parked {
                let index = series.color_index;
                palette.apply_scheme(series, index);
            }
        }
        self.dataset.touch();
    }

    /// Invalidate all in-flight history tokens (subject changed). The
    /// series structure is left alone; the next compose rewrites it.
    pub fn invalidate_tokens(&mut self) {
        self.expected_before = None;
        self.expected_after = None;
        self.expected_subject = None;
    }

    fn parked_mut(&mut self, slot: NeighborSlot) -> &mut Option<ChartSeries> {
        match slot {
            NeighborSlot::Before => &mut self.parked_before,
            NeighborSlot::After => &mut self.parked_after,
        }
    }

    fn expected_mut(&mut self, slot: NeighborSlot) -> &mut Option<HistoryToken> {
        match slot {
            NeighborSlot::Before => &mut self.expected_before,
            NeighborSlot::After => &mut self.expected_after,
        }
    }

    fn bump_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

fn points_to_data(points: &[f64]) -> Vec<(f64, f64)> {
    points
        .iter()
        .enumerate()
        .map(|(tick, value)| (tick as f64, *value))
        .collect()
}
