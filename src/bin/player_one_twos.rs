use anyhow::{Context, Result, anyhow};

use one_twos::config::{AnalysisConfig, arg_value, has_flag};
use one_twos::detector::{OneTwoRow, PairMeasures, player_one_twos};
use one_twos::pass_cache;
use one_twos::season;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut config = AnalysisConfig::resolve(&args).context("invalid configuration")?;
    if let Some(player) = arg_value(&args, "--player") {
        config.players = vec![player];
    }
    if config.players.is_empty() {
        return Err(anyhow!("no players given (use --player NAME or `players` in the config)"));
    }
    let key_only = has_flag(&args, "--key-only");

    let loaded = pass_cache::load_or_fetch(&config)?;
    for err in &loaded.errors {
        eprintln!("[WARN] {err}");
    }
    let table = season::aggregate(&loaded.passes, &config.detector_params())?;

    for player in &config.players {
        let rows = player_one_twos(player, table.rows());
        println!("{player}: {} one-twos", rows.len() / 2);
        for pair in rows.chunks_exact(2) {
            let (opening, closing) = (&pair[0], &pair[1]);
            if key_only && !is_key(opening) && !is_key(closing) {
                continue;
            }
            print_pair(opening, closing);
        }
        println!();
    }
    Ok(())
}

fn is_key(row: &OneTwoRow) -> bool {
    row.event.is_shot_assist() || row.event.is_goal_assist()
}

fn print_pair(opening: &OneTwoRow, closing: &OneTwoRow) {
    let m = PairMeasures::between(opening, closing);
    let tag = if closing.event.is_goal_assist() || opening.event.is_goal_assist() {
        " [goal assist]"
    } else if is_key(opening) || is_key(closing) {
        " [shot assist]"
    } else {
        ""
    };
    let frame = closing
        .event
        .freeze_frame
        .as_ref()
        .map(|f| format!(" 360:{}", f.len()))
        .unwrap_or_default();
    println!(
        "  match {} {:02}:{:02}  {} -> {} -> {}  ({:.1},{:.1}) -> ({:.1},{:.1})  carry {:.1}{}{}",
        opening.event.match_id,
        opening.event.minute,
        opening.event.second,
        opening.player(),
        opening.recipient(),
        closing.recipient(),
        opening.x_start,
        opening.y_start,
        closing.x_end,
        closing.y_end,
        m.carry_distance,
        tag,
        frame
    );
}
