use std::collections::{BTreeMap, BTreeSet};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::detector::OneTwoRow;
use crate::errors::{AnalysisError, TableScope};
use crate::roles::split_roles;
use crate::season::SeasonOneTwoTable;

pub const PLAYER_STAT_COLUMNS: [&str; 6] = [
    "player",
    "team",
    "open_count",
    "close_count",
    "total_count",
    "key_pass_percentage",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStat {
    pub player: String,
    pub team: String,
    pub open_count: usize,
    pub close_count: usize,
    pub total_count: usize,
    pub key_pass_percentage: f64,
}

#[derive(Debug, Clone, Default)]
pub struct PlayerStats {
    pub by_player: BTreeMap<String, PlayerStat>,
    /// Players whose stats could not be derived; the rest of the batch is unaffected.
    pub failures: BTreeMap<String, AnalysisError>,
}

impl PlayerStats {
    pub fn get(&self, player: &str) -> Option<&PlayerStat> {
        self.by_player.get(player)
    }

    pub fn len(&self) -> usize {
        self.by_player.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_player.is_empty()
    }

    /// Top `n` by total one-twos, ties broken by openings then name.
    pub fn ranked(&self, n: usize) -> Vec<&PlayerStat> {
        let mut out: Vec<&PlayerStat> = self.by_player.values().collect();
        out.sort_by(|a, b| {
            b.total_count
                .cmp(&a.total_count)
                .then(b.open_count.cmp(&a.open_count))
                .then_with(|| a.player.cmp(&b.player))
        });
        out.truncate(n);
        out
    }
}

pub fn compute_player_stats(table: &SeasonOneTwoTable) -> Result<PlayerStats, AnalysisError> {
    compute_from_rows(table.rows(), TableScope::Season)
}

/// Per-player role counts, team and key-pass share for a flat one-two table.
///
/// Fails only on a structural problem (odd row count). Anything specific to one player
/// lands in `failures`.
pub fn compute_from_rows(
    rows: &[OneTwoRow],
    scope: TableScope,
) -> Result<PlayerStats, AnalysisError> {
    let split = split_roles(rows, scope)?;
    let open_counts = count_passers(&split.opening);
    let close_counts = count_passers(&split.closing);

    let players: BTreeSet<&str> = open_counts
        .keys()
        .chain(close_counts.keys())
        .copied()
        .collect();

    let mut stats = PlayerStats::default();
    for player in players {
        match player_stat(rows, player, &open_counts, &close_counts) {
            Ok(stat) => {
                stats.by_player.insert(player.to_string(), stat);
            }
            Err(err) => {
                warn!("player stats skipped for {player}: {err}");
                stats.failures.insert(player.to_string(), err);
            }
        }
    }
    Ok(stats)
}

/// Stats for a named list of players. Names with no one-two rows report
/// `UnknownPlayer` without affecting the others.
pub fn stats_for_players(
    table: &SeasonOneTwoTable,
    players: &[String],
) -> Result<BTreeMap<String, Result<PlayerStat, AnalysisError>>, AnalysisError> {
    let all = compute_player_stats(table)?;
    let mut out = BTreeMap::new();
    for player in players {
        let result = if let Some(stat) = all.by_player.get(player) {
            Ok(stat.clone())
        } else if let Some(err) = all.failures.get(player) {
            Err(err.clone())
        } else {
            Err(AnalysisError::UnknownPlayer {
                player: player.clone(),
            })
        };
        out.insert(player.clone(), result);
    }
    Ok(out)
}

/// `100 * (shot assists + goal assists) / (0.5 * rows)` over the rows the player
/// passed or received in. Each one-two contributes two rows, hence the half.
pub fn key_pass_percentage(rows: &[OneTwoRow], player: &str) -> Result<f64, AnalysisError> {
    let mut involved = 0usize;
    let mut shot_assists = 0usize;
    let mut goal_assists = 0usize;
    for row in rows.iter().filter(|row| row.event.involves(player)) {
        involved += 1;
        if row.event.is_shot_assist() {
            shot_assists += 1;
        }
        if row.event.is_goal_assist() {
            goal_assists += 1;
        }
    }
    if involved == 0 {
        return Err(AnalysisError::UnknownPlayer {
            player: player.to_string(),
        });
    }
    let events = 0.5 * involved as f64;
    Ok(100.0 * (shot_assists + goal_assists) as f64 / events)
}

fn player_stat(
    rows: &[OneTwoRow],
    player: &str,
    open_counts: &BTreeMap<&str, usize>,
    close_counts: &BTreeMap<&str, usize>,
) -> Result<PlayerStat, AnalysisError> {
    let team = first_team(rows, player).ok_or_else(|| AnalysisError::UnknownPlayer {
        player: player.to_string(),
    })?;
    let open_count = open_counts.get(player).copied().unwrap_or(0);
    let close_count = close_counts.get(player).copied().unwrap_or(0);
    Ok(PlayerStat {
        player: player.to_string(),
        team: team.to_string(),
        open_count,
        close_count,
        total_count: open_count + close_count,
        key_pass_percentage: key_pass_percentage(rows, player)?,
    })
}

// Assumes one team per player for the whole table.
fn first_team<'a>(rows: &'a [OneTwoRow], player: &str) -> Option<&'a str> {
    rows.iter()
        .find(|row| row.event.player == player)
        .map(|row| row.event.team.as_str())
        .filter(|team| !team.trim().is_empty())
}

fn count_passers<'a>(rows: &[&'a OneTwoRow]) -> BTreeMap<&'a str, usize> {
    let mut counts = BTreeMap::new();
    for row in rows {
        *counts.entry(row.event.player.as_str()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass_event::{PassEvent, PitchPoint};

    fn row(team: &str, from: &str, to: &str) -> OneTwoRow {
        OneTwoRow {
            event: PassEvent::new(
                1,
                10,
                0,
                team,
                from,
                to,
                PitchPoint::new(60.0, 40.0),
                PitchPoint::new(70.0, 40.0),
            ),
            x_start: 60.0,
            y_start: 40.0,
            x_end: 70.0,
            y_end: 40.0,
        }
    }

    #[test]
    fn blank_team_is_reported_per_player() {
        let rows = vec![
            row("", "Kelly", "Stanway"),
            row("England", "Stanway", "Kelly"),
        ];
        let stats = compute_from_rows(&rows, TableScope::Season).unwrap();
        assert!(stats.get("Stanway").is_some());
        assert!(stats.get("Kelly").is_none());
        assert!(matches!(
            stats.failures.get("Kelly"),
            Some(AnalysisError::UnknownPlayer { .. })
        ));
    }

    #[test]
    fn ranking_breaks_ties_on_openings_then_name() {
        let rows = vec![
            row("T", "B", "A"),
            row("T", "A", "B"),
            row("T", "C", "D"),
            row("T", "D", "C"),
            row("T", "C", "D"),
            row("T", "D", "C"),
        ];
        let stats = compute_from_rows(&rows, TableScope::Season).unwrap();
        let names: Vec<&str> = stats.ranked(10).iter().map(|s| s.player.as_str()).collect();
        assert_eq!(names, vec!["C", "D", "B", "A"]);
        assert_eq!(stats.ranked(1).len(), 1);
    }

    #[test]
    fn key_pass_share_counts_shot_and_goal_flags() {
        let mut rows = vec![
            row("T", "A", "B"),
            row("T", "B", "A"),
            row("T", "A", "B"),
            row("T", "B", "A"),
        ];
        rows[1].event.shot_assist = Some(true);
        rows[3].event.shot_assist = Some(true);
        rows[3].event.goal_assist = Some(true);
        assert_eq!(key_pass_percentage(&rows, "A").unwrap(), 150.0);
        assert!(matches!(
            key_pass_percentage(&rows, "Nobody"),
            Err(AnalysisError::UnknownPlayer { .. })
        ));
    }
}
