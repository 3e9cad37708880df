use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const PITCH_LENGTH: f64 = 120.0;
pub const PITCH_WIDTH: f64 = 80.0;
pub const GOAL_CENTER: PitchPoint = PitchPoint {
    x: PITCH_LENGTH,
    y: PITCH_WIDTH / 2.0,
};

/// Per-match pass sequences keyed by match id. Iteration is ascending by id.
pub type SeasonPasses = BTreeMap<u64, Vec<PassEvent>>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchPoint {
    pub x: f64,
    pub y: f64,
}

impl PitchPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: PitchPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Forward distance left to the goal line at x=120.
    pub fn distance_to_goal_line(self) -> f64 {
        PITCH_LENGTH - self.x
    }

    pub fn distance_to_goal_center(self) -> f64 {
        self.distance_to(GOAL_CENTER)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreezeFramePlayer {
    pub location: PitchPoint,
    #[serde(default)]
    pub teammate: bool,
    #[serde(default)]
    pub actor: bool,
    #[serde(default)]
    pub keeper: bool,
}

/// One completed pass. Locations are optional because the provider can omit them;
/// the detector rejects such rows instead of guessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassEvent {
    pub match_id: u64,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub period: u8,
    pub minute: u32,
    pub second: u32,
    pub timestamp_seconds: f64,
    pub team: String,
    pub player: String,
    pub pass_recipient: String,
    pub start_location: Option<PitchPoint>,
    pub end_location: Option<PitchPoint>,
    #[serde(default)]
    pub shot_assist: Option<bool>,
    #[serde(default)]
    pub goal_assist: Option<bool>,
    #[serde(default)]
    pub freeze_frame: Option<Vec<FreezeFramePlayer>>,
}

impl PassEvent {
    pub fn new(
        match_id: u64,
        minute: u32,
        second: u32,
        team: &str,
        player: &str,
        pass_recipient: &str,
        start: PitchPoint,
        end: PitchPoint,
    ) -> Self {
        Self {
            match_id,
            event_id: None,
            period: 1,
            minute,
            second,
            timestamp_seconds: timestamp_seconds(minute, second),
            team: team.to_string(),
            player: player.to_string(),
            pass_recipient: pass_recipient.to_string(),
            start_location: Some(start),
            end_location: Some(end),
            shot_assist: None,
            goal_assist: None,
            freeze_frame: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp_seconds: f64) -> Self {
        self.timestamp_seconds = timestamp_seconds;
        self
    }

    pub fn with_shot_assist(mut self, flag: bool) -> Self {
        self.shot_assist = Some(flag);
        self
    }

    pub fn with_goal_assist(mut self, flag: bool) -> Self {
        self.goal_assist = Some(flag);
        self
    }

    pub fn is_shot_assist(&self) -> bool {
        self.shot_assist == Some(true)
    }

    pub fn is_goal_assist(&self) -> bool {
        self.goal_assist == Some(true)
    }

    pub fn involves(&self, player: &str) -> bool {
        self.player == player || self.pass_recipient == player
    }
}

pub fn timestamp_seconds(minute: u32, second: u32) -> f64 {
    f64::from(minute) * 60.0 + f64::from(second)
}

/// Stable sort by timestamp; passes sharing a second keep their provider order.
pub fn sort_passes(passes: &mut [PassEvent]) {
    passes.sort_by(|a, b| a.timestamp_seconds.total_cmp(&b.timestamp_seconds));
}
