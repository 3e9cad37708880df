use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::http_cache::fetch_text_cached;
use crate::http_client::http_client;
use crate::parallel::with_env_pool;
use crate::pass_event::{
    FreezeFramePlayer, PassEvent, PitchPoint, SeasonPasses, sort_passes, timestamp_seconds,
};

pub const DEFAULT_OPEN_DATA_URL: &str =
    "https://raw.githubusercontent.com/statsbomb/open-data/master/data";

const WOMENS_SUFFIX: &str = " Women's";

/// Where the StatsBomb open-data JSON lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenDataSource {
    /// A checkout of the open-data `data/` directory.
    Local(PathBuf),
    Remote { base_url: String },
}

impl OpenDataSource {
    /// Read `relative` (e.g. `events/123.json`). `Ok(None)` when the file does not exist.
    pub fn read(&self, relative: &str) -> Result<Option<String>> {
        match self {
            OpenDataSource::Local(dir) => {
                let path = dir.join(relative);
                if !path.exists() {
                    return Ok(None);
                }
                fs::read_to_string(&path)
                    .map(Some)
                    .with_context(|| format!("read {}", path.display()))
            }
            OpenDataSource::Remote { base_url } => {
                let url = format!("{}/{}", base_url.trim_end_matches('/'), relative);
                fetch_text_cached(http_client()?, &url).with_context(|| format!("fetch {url}"))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchInfo {
    pub match_id: u64,
    pub match_date: Option<String>,
    pub home_team: String,
    pub away_team: String,
}

impl MatchInfo {
    pub fn involves_team(&self, filter: &str) -> bool {
        team_matches(filter, &self.home_team) || team_matches(filter, &self.away_team)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SeasonRequest {
    pub competition_id: u32,
    pub season_id: u32,
    pub team: Option<String>,
    /// Folder of `{match_id}.json` freeze-frame files, read instead of the source's
    /// `three-sixty/` directory when set.
    pub three_sixty_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct SeasonLoad {
    pub matches: Vec<MatchInfo>,
    pub passes: SeasonPasses,
    /// Per-match failures; those matches are absent from `passes`.
    pub errors: Vec<String>,
}

/// Team filters accept the plain name for women's sides ("England" matches
/// "England Women's").
pub fn team_matches(filter: &str, team: &str) -> bool {
    let filter = filter.trim();
    team == filter
        || team
            .strip_suffix(WOMENS_SUFFIX)
            .is_some_and(|base| base == filter)
}

pub fn matches_path(competition_id: u32, season_id: u32) -> String {
    format!("matches/{competition_id}/{season_id}.json")
}

pub fn events_path(match_id: u64) -> String {
    format!("events/{match_id}.json")
}

pub fn three_sixty_path(match_id: u64) -> String {
    format!("three-sixty/{match_id}.json")
}

/// Completed passes for every requested match, each sorted by timestamp and merged
/// with its freeze frames when a 360 file exists.
pub fn load_season_passes(source: &OpenDataSource, request: &SeasonRequest) -> Result<SeasonLoad> {
    let raw = source
        .read(&matches_path(request.competition_id, request.season_id))?
        .ok_or_else(|| {
            anyhow!(
                "no match list for competition {} season {}",
                request.competition_id,
                request.season_id
            )
        })?;
    let mut matches = parse_matches_json(&raw)?;
    if let Some(team) = request.team.as_deref() {
        matches.retain(|m| m.involves_team(team));
    }
    matches.sort_by_key(|m| m.match_id);
    info!(
        "loading passes for {} matches (competition {}, season {})",
        matches.len(),
        request.competition_id,
        request.season_id
    );

    let three_sixty_dir = request.three_sixty_dir.as_deref();
    let results: Vec<(u64, Result<Vec<PassEvent>>)> = with_env_pool("FETCH_PARALLELISM", 2, || {
        matches
            .par_iter()
            .map(|m| {
                let team = request.team.as_deref();
                (
                    m.match_id,
                    load_match_passes(source, m.match_id, team, three_sixty_dir),
                )
            })
            .collect()
    });

    let mut passes = SeasonPasses::new();
    let mut errors = Vec::new();
    for (match_id, result) in results {
        match result {
            Ok(rows) => {
                passes.insert(match_id, rows);
            }
            Err(err) => errors.push(format!("match {match_id}: {err:#}")),
        }
    }

    Ok(SeasonLoad {
        matches,
        passes,
        errors,
    })
}

pub fn load_match_passes(
    source: &OpenDataSource,
    match_id: u64,
    team: Option<&str>,
    three_sixty_dir: Option<&Path>,
) -> Result<Vec<PassEvent>> {
    let raw = source
        .read(&events_path(match_id))?
        .ok_or_else(|| anyhow!("no event file"))?;
    let mut passes = parse_events_json(match_id, &raw)?;
    if let Some(team) = team {
        passes.retain(|p| team_matches(team, &p.team));
    }

    if let Some(raw_frames) = read_freeze_frames(source, match_id, three_sixty_dir)? {
        let frames = parse_three_sixty_json(&raw_frames)?;
        debug!("match {match_id}: {} freeze frames", frames.len());
        passes = merge_freeze_frames(passes, &frames);
    }

    sort_passes(&mut passes);
    Ok(passes)
}

fn read_freeze_frames(
    source: &OpenDataSource,
    match_id: u64,
    three_sixty_dir: Option<&Path>,
) -> Result<Option<String>> {
    match three_sixty_dir {
        Some(dir) => OpenDataSource::Local(dir.to_path_buf()).read(&format!("{match_id}.json")),
        None => source.read(&three_sixty_path(match_id)),
    }
}

#[derive(Debug, Deserialize)]
struct RawNamed {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawMatch {
    match_id: u64,
    #[serde(default)]
    match_date: Option<String>,
    home_team: RawHomeTeam,
    away_team: RawAwayTeam,
}

#[derive(Debug, Deserialize)]
struct RawHomeTeam {
    home_team_name: String,
}

#[derive(Debug, Deserialize)]
struct RawAwayTeam {
    away_team_name: String,
}

pub fn parse_matches_json(raw: &str) -> Result<Vec<MatchInfo>> {
    let rows: Option<Vec<RawMatch>> = serde_json::from_str(raw).context("parse match list")?;
    Ok(rows
        .unwrap_or_default()
        .into_iter()
        .map(|m| MatchInfo {
            match_id: m.match_id,
            match_date: m.match_date,
            home_team: m.home_team.home_team_name,
            away_team: m.away_team.away_team_name,
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    period: u8,
    #[serde(default)]
    minute: u32,
    #[serde(default)]
    second: u32,
    #[serde(rename = "type")]
    kind: Option<RawNamed>,
    #[serde(default)]
    team: Option<RawNamed>,
    #[serde(default)]
    player: Option<RawNamed>,
    #[serde(default)]
    location: Option<Vec<f64>>,
    #[serde(default)]
    pass: Option<RawPass>,
}

#[derive(Debug, Deserialize)]
struct RawPass {
    #[serde(default)]
    recipient: Option<RawNamed>,
    #[serde(default)]
    end_location: Option<Vec<f64>>,
    #[serde(default)]
    outcome: Option<RawNamed>,
    #[serde(default)]
    shot_assist: Option<bool>,
    #[serde(default)]
    goal_assist: Option<bool>,
}

/// Completed passes with a recipient, in file order. Anything else is dropped.
pub fn parse_events_json(match_id: u64, raw: &str) -> Result<Vec<PassEvent>> {
    let events: Option<Vec<RawEvent>> =
        serde_json::from_str(raw).with_context(|| format!("parse events for match {match_id}"))?;
    let mut out = Vec::new();
    for event in events.unwrap_or_default() {
        if event.kind.as_ref().is_none_or(|k| k.name != "Pass") {
            continue;
        }
        let Some(pass) = event.pass else { continue };
        if pass.outcome.is_some() {
            continue;
        }
        let Some(recipient) = pass.recipient else { continue };
        let (Some(team), Some(player)) = (event.team, event.player) else {
            continue;
        };
        out.push(PassEvent {
            match_id,
            event_id: event.id,
            period: event.period,
            minute: event.minute,
            second: event.second,
            timestamp_seconds: timestamp_seconds(event.minute, event.second),
            team: team.name,
            player: player.name,
            pass_recipient: recipient.name,
            start_location: event.location.as_deref().and_then(point_from),
            end_location: pass.end_location.as_deref().and_then(point_from),
            shot_assist: pass.shot_assist,
            goal_assist: pass.goal_assist,
            freeze_frame: None,
        });
    }
    Ok(out)
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    event_uuid: String,
    #[serde(default)]
    freeze_frame: Vec<RawFramePlayer>,
}

#[derive(Debug, Deserialize)]
struct RawFramePlayer {
    #[serde(default)]
    teammate: bool,
    #[serde(default)]
    actor: bool,
    #[serde(default)]
    keeper: bool,
    location: Vec<f64>,
}

pub fn parse_three_sixty_json(raw: &str) -> Result<HashMap<String, Vec<FreezeFramePlayer>>> {
    let frames: Option<Vec<RawFrame>> =
        serde_json::from_str(raw).context("parse 360 frames")?;
    let mut out = HashMap::new();
    for frame in frames.unwrap_or_default() {
        let players = frame
            .freeze_frame
            .into_iter()
            .filter_map(|p| {
                point_from(&p.location).map(|location| FreezeFramePlayer {
                    location,
                    teammate: p.teammate,
                    actor: p.actor,
                    keeper: p.keeper,
                })
            })
            .collect::<Vec<_>>();
        out.insert(frame.event_uuid, players);
    }
    Ok(out)
}

/// New pass records carrying the freeze frame of their event, when one exists.
pub fn merge_freeze_frames(
    passes: Vec<PassEvent>,
    frames: &HashMap<String, Vec<FreezeFramePlayer>>,
) -> Vec<PassEvent> {
    passes
        .into_iter()
        .map(|mut pass| {
            if let Some(frame) = pass.event_id.as_ref().and_then(|id| frames.get(id)) {
                pass.freeze_frame = Some(frame.clone());
            }
            pass
        })
        .collect()
}

fn point_from(raw: &[f64]) -> Option<PitchPoint> {
    match raw {
        [x, y, ..] => Some(PitchPoint::new(*x, *y)),
        _ => None,
    }
}
