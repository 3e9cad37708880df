use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::AnalysisError;
use crate::pass_event::{PassEvent, PitchPoint};

pub const DEFAULT_TIME_WINDOW_SECS: f64 = 5.0;
pub const DEFAULT_PROGRESSION_RATIO: f64 = 0.75;
pub const DEFAULT_CARRY_DISTANCE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorParams {
    /// Seconds after the opening pass in which the return may arrive (inclusive).
    pub time_window: f64,
    /// Fraction of the "before" distance to goal the "after" distance must undercut.
    pub progression_ratio: f64,
    /// Max gap between where the opening pass lands and the closing pass is struck.
    pub carry_distance: f64,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            time_window: DEFAULT_TIME_WINDOW_SECS,
            progression_ratio: DEFAULT_PROGRESSION_RATIO,
            carry_distance: DEFAULT_CARRY_DISTANCE,
        }
    }
}

impl DetectorParams {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.time_window.is_finite() || self.time_window < 0.0 {
            return Err(AnalysisError::InvalidParameter {
                name: "time window",
                value: self.time_window,
            });
        }
        if !(self.progression_ratio > 0.0 && self.progression_ratio < 1.0) {
            return Err(AnalysisError::InvalidParameter {
                name: "progression ratio",
                value: self.progression_ratio,
            });
        }
        if !self.carry_distance.is_finite() || self.carry_distance <= 0.0 {
            return Err(AnalysisError::InvalidParameter {
                name: "carry distance",
                value: self.carry_distance,
            });
        }
        Ok(())
    }
}

/// A pass selected into a one-two table, with its coordinates split out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneTwoRow {
    pub event: PassEvent,
    pub x_start: f64,
    pub y_start: f64,
    pub x_end: f64,
    pub y_end: f64,
}

impl OneTwoRow {
    fn from_located(event: &PassEvent, start: PitchPoint, end: PitchPoint) -> Self {
        Self {
            event: event.clone(),
            x_start: start.x,
            y_start: start.y,
            x_end: end.x,
            y_end: end.y,
        }
    }

    pub fn start(&self) -> PitchPoint {
        PitchPoint::new(self.x_start, self.y_start)
    }

    pub fn end(&self) -> PitchPoint {
        PitchPoint::new(self.x_end, self.y_end)
    }

    pub fn player(&self) -> &str {
        &self.event.player
    }

    pub fn recipient(&self) -> &str {
        &self.event.pass_recipient
    }
}

/// Detected one-twos for one match, opening row first for every pair.
///
/// Only `detect` builds these, so the row count is always even.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchOneTwoTable {
    pub match_id: u64,
    rows: Vec<OneTwoRow>,
}

impl MatchOneTwoTable {
    pub fn empty(match_id: u64) -> Self {
        Self {
            match_id,
            rows: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_rows(match_id: u64, rows: Vec<OneTwoRow>) -> Self {
        Self { match_id, rows }
    }

    pub fn rows(&self) -> &[OneTwoRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<OneTwoRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn pair_count(&self) -> usize {
        self.rows.len() / 2
    }

    /// (opening, closing) pairs in discovery order.
    pub fn pairs(&self) -> impl Iterator<Item = (&OneTwoRow, &OneTwoRow)> {
        self.rows.chunks_exact(2).map(|pair| (&pair[0], &pair[1]))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairMeasures {
    pub line_before: f64,
    pub line_after: f64,
    pub radial_before: f64,
    pub radial_after: f64,
    pub carry_distance: f64,
}

impl PairMeasures {
    pub fn from_points(
        opening_start: PitchPoint,
        opening_end: PitchPoint,
        closing_start: PitchPoint,
        closing_end: PitchPoint,
    ) -> Self {
        Self {
            line_before: opening_start.distance_to_goal_line(),
            line_after: closing_end.distance_to_goal_line(),
            radial_before: opening_start.distance_to_goal_center(),
            radial_after: closing_end.distance_to_goal_center(),
            carry_distance: opening_end.distance_to(closing_start),
        }
    }

    pub fn between(opening: &OneTwoRow, closing: &OneTwoRow) -> Self {
        Self::from_points(opening.start(), opening.end(), closing.start(), closing.end())
    }

    pub fn line_progressed(&self, ratio: f64) -> bool {
        self.line_after < self.line_before * ratio
    }

    pub fn radial_progressed(&self, ratio: f64) -> bool {
        self.radial_after < self.radial_before * ratio
    }

    pub fn accepts(&self, params: &DetectorParams) -> bool {
        self.carry_distance < params.carry_distance
            && (self.line_progressed(params.progression_ratio)
                || self.radial_progressed(params.progression_ratio))
    }
}

/// Pair every pass with the reciprocal passes inside its time window.
///
/// `events` must be sorted by `timestamp_seconds` (see `sort_passes`). An opening pass
/// that matches several closing passes yields one pair per closing pass.
pub fn detect(
    match_id: u64,
    events: &[PassEvent],
    params: &DetectorParams,
) -> Result<MatchOneTwoTable, AnalysisError> {
    params.validate()?;
    let located = locate_all(match_id, events)?;
    check_ordering(match_id, events)?;

    let timestamps: Vec<f64> = events.iter().map(|e| e.timestamp_seconds).collect();
    let mut accepted: Vec<(usize, usize)> = Vec::new();

    for (i, opening) in events.iter().enumerate() {
        let t = timestamps[i];
        let cutoff = t + params.time_window;
        let lo = timestamps.partition_point(|ts| *ts < t);
        let hi = timestamps.partition_point(|ts| *ts <= cutoff);
        let (opening_start, opening_end) = located[i];

        for j in lo..hi {
            let closing = &events[j];
            if closing.player != opening.pass_recipient
                || closing.pass_recipient != opening.player
            {
                continue;
            }
            let (closing_start, closing_end) = located[j];
            let measures =
                PairMeasures::from_points(opening_start, opening_end, closing_start, closing_end);
            if measures.accepts(params) {
                accepted.push((i, j));
            }
        }
    }

    if accepted.is_empty() {
        info!("match {match_id}: no one-two passes found");
        return Ok(MatchOneTwoTable::empty(match_id));
    }

    let mut rows = Vec::with_capacity(accepted.len() * 2);
    for (i, j) in &accepted {
        rows.push(OneTwoRow::from_located(&events[*i], located[*i].0, located[*i].1));
        rows.push(OneTwoRow::from_located(&events[*j], located[*j].0, located[*j].1));
    }
    debug!(
        "match {match_id}: {} one-two pairs from {} passes",
        accepted.len(),
        events.len()
    );

    Ok(MatchOneTwoTable { match_id, rows })
}

/// Rows in which `player` passed or received. Both rows of a pair involve the same two
/// players, so the opening/closing alternation survives the filter.
pub fn player_one_twos(player: &str, rows: &[OneTwoRow]) -> Vec<OneTwoRow> {
    rows.iter()
        .filter(|row| row.event.involves(player))
        .cloned()
        .collect()
}

fn locate_all(
    match_id: u64,
    events: &[PassEvent],
) -> Result<Vec<(PitchPoint, PitchPoint)>, AnalysisError> {
    events
        .iter()
        .enumerate()
        .map(|(index, event)| {
            let start = event
                .start_location
                .filter(|p| p.is_finite())
                .ok_or(AnalysisError::MalformedEvent {
                    match_id,
                    index,
                    field: "start location",
                })?;
            let end = event
                .end_location
                .filter(|p| p.is_finite())
                .ok_or(AnalysisError::MalformedEvent {
                    match_id,
                    index,
                    field: "end location",
                })?;
            Ok((start, end))
        })
        .collect()
}

fn check_ordering(match_id: u64, events: &[PassEvent]) -> Result<(), AnalysisError> {
    let mut previous = f64::NEG_INFINITY;
    for (index, event) in events.iter().enumerate() {
        let timestamp = event.timestamp_seconds;
        if !timestamp.is_finite() || timestamp < previous {
            return Err(AnalysisError::OrderingViolation {
                match_id,
                index,
                timestamp,
                previous,
            });
        }
        previous = timestamp;
    }
    Ok(())
}
