use anyhow::{Context, Result};

use one_twos::config::{AnalysisConfig, has_flag};
use one_twos::export::{self, SeasonReport};
use one_twos::pass_cache;
use one_twos::player_stats::{self, PlayerStat};
use one_twos::season;

const USAGE: &str = "\
usage: one_twos [--config FILE] [--competition-id N --season-id N]
                [--team NAME | --all-teams] [--players \"A, B\"]
                [--data-dir DIR] [--three-sixty-dir DIR]
                [--time-window S] [--progression-ratio R]
                [--carry-distance D] [--top N] [--xlsx FILE] [--json FILE] [--no-cache]";

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("{USAGE}");
        return Ok(());
    }

    let config = AnalysisConfig::resolve(&args).context("invalid configuration")?;
    let params = config.detector_params();

    let loaded = pass_cache::load_or_fetch(&config)?;
    for err in loaded.errors.iter().take(10) {
        eprintln!("[WARN] {err}");
    }
    if loaded.errors.len() > 10 {
        eprintln!("[WARN] ... {} more match errors", loaded.errors.len() - 10);
    }

    let table = season::aggregate(&loaded.passes, &params).context("one-two detection failed")?;
    let stats = player_stats::compute_player_stats(&table)?;

    println!("One-twos: {}", config.label());
    println!(
        "Thresholds: window={}s progression={} carry={}",
        params.time_window, params.progression_ratio, params.carry_distance
    );
    println!(
        "Matches: {}  passes: {}  one-twos: {}",
        table.match_count(),
        loaded.passes.values().map(Vec::len).sum::<usize>(),
        table.pair_count()
    );
    println!();
    print_stats_header();
    for stat in stats.ranked(config.top_n) {
        print_stat(stat);
    }
    for (player, err) in &stats.failures {
        eprintln!("[WARN] {player}: {err}");
    }

    if !config.players.is_empty() {
        println!();
        println!("Requested players");
        print_stats_header();
        let requested = player_stats::stats_for_players(&table, &config.players)?;
        for (player, result) in &requested {
            match result {
                Ok(stat) => print_stat(stat),
                Err(err) => eprintln!("[WARN] {player}: {err}"),
            }
        }
    }

    if let Some(path) = config.output.xlsx.as_deref() {
        let report = export::write_workbook(path, &stats, &table)?;
        println!(
            "Wrote {} ({} players, {} rows)",
            path.display(),
            report.players,
            report.one_two_rows
        );
    }
    if let Some(path) = config.output.json.as_deref() {
        let report = SeasonReport::new(&config.label(), params, &stats, &table);
        export::write_json(path, &report)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

fn print_stats_header() {
    println!(
        "{:<32} {:<24} {:>5} {:>6} {:>6} {:>8}",
        "player", "team", "open", "close", "total", "key %"
    );
}

fn print_stat(stat: &PlayerStat) {
    println!(
        "{:<32} {:<24} {:>5} {:>6} {:>6} {:>8.1}",
        stat.player,
        stat.team,
        stat.open_count,
        stat.close_count,
        stat.total_count,
        stat.key_pass_percentage
    );
}
