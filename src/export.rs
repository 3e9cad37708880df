use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;

use crate::detector::{DetectorParams, OneTwoRow};
use crate::player_stats::{PLAYER_STAT_COLUMNS, PlayerStat, PlayerStats};
use crate::roles::OneTwoRole;
use crate::season::SeasonOneTwoTable;

pub struct ExportReport {
    pub players: usize,
    pub one_two_rows: usize,
}

enum Cell {
    Text(String),
    Number(f64),
}

/// Workbook with a `PlayerStats` sheet (ranked) and a `OneTwos` sheet (one line per
/// season row, with its role).
pub fn write_workbook(
    path: &Path,
    stats: &PlayerStats,
    season: &SeasonOneTwoTable,
) -> Result<ExportReport> {
    let mut stats_rows = vec![header(&PLAYER_STAT_COLUMNS)];
    let ranked = stats.ranked(stats.len());
    for stat in &ranked {
        stats_rows.push(stat_row(stat));
    }

    let mut one_two_rows = vec![header(&[
        "match_id",
        "pair",
        "role",
        "minute",
        "second",
        "team",
        "player",
        "pass_recipient",
        "x_start",
        "y_start",
        "x_end",
        "y_end",
        "shot_assist",
        "goal_assist",
    ])];
    for (idx, row) in season.rows().iter().enumerate() {
        one_two_rows.push(one_two_row(idx, row));
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("PlayerStats")?;
        write_rows(sheet, &stats_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("OneTwos")?;
        write_rows(sheet, &one_two_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        players: ranked.len(),
        one_two_rows: season.len(),
    })
}

#[derive(Debug, Serialize)]
pub struct SeasonReport<'a> {
    pub generated_at: String,
    pub label: String,
    pub params: DetectorParams,
    pub pairs: usize,
    pub players: Vec<&'a PlayerStat>,
    pub failures: Vec<PlayerFailure>,
    pub season: &'a SeasonOneTwoTable,
}

#[derive(Debug, Serialize)]
pub struct PlayerFailure {
    pub player: String,
    pub error: String,
}

impl<'a> SeasonReport<'a> {
    pub fn new(
        label: &str,
        params: DetectorParams,
        stats: &'a PlayerStats,
        season: &'a SeasonOneTwoTable,
    ) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            label: label.to_string(),
            params,
            pairs: season.pair_count(),
            players: stats.ranked(stats.len()),
            failures: stats
                .failures
                .iter()
                .map(|(player, err)| PlayerFailure {
                    player: player.clone(),
                    error: err.to_string(),
                })
                .collect(),
            season,
        }
    }
}

pub fn write_json(path: &Path, report: &SeasonReport<'_>) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report).context("serialize season report")?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn header(columns: &[&str]) -> Vec<Cell> {
    columns.iter().map(|c| Cell::Text(c.to_string())).collect()
}

fn stat_row(stat: &PlayerStat) -> Vec<Cell> {
    vec![
        Cell::Text(stat.player.clone()),
        Cell::Text(stat.team.clone()),
        Cell::Number(stat.open_count as f64),
        Cell::Number(stat.close_count as f64),
        Cell::Number(stat.total_count as f64),
        Cell::Number(stat.key_pass_percentage),
    ]
}

fn one_two_row(idx: usize, row: &OneTwoRow) -> Vec<Cell> {
    let event = &row.event;
    vec![
        Cell::Number(event.match_id as f64),
        Cell::Number((idx / 2) as f64),
        Cell::Text(OneTwoRole::at(idx).label().to_string()),
        Cell::Number(f64::from(event.minute)),
        Cell::Number(f64::from(event.second)),
        Cell::Text(event.team.clone()),
        Cell::Text(event.player.clone()),
        Cell::Text(event.pass_recipient.clone()),
        Cell::Number(row.x_start),
        Cell::Number(row.y_start),
        Cell::Number(row.x_end),
        Cell::Number(row.y_end),
        Cell::Text(flag_text(event.shot_assist)),
        Cell::Text(flag_text(event.goal_assist)),
    ]
}

fn flag_text(flag: Option<bool>) -> String {
    match flag {
        Some(true) => "yes".to_string(),
        Some(false) => "no".to_string(),
        None => String::new(),
    }
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<Cell>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            let written = match value {
                Cell::Text(text) => worksheet.write_string(r, c, text),
                Cell::Number(number) => worksheet.write_number(r, c, *number),
            };
            written.with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
