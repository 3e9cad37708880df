use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::http_cache::app_cache_dir;
use crate::open_data::{self, SeasonLoad};
use crate::pass_event::SeasonPasses;

const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    competition_id: u32,
    season_id: u32,
    team: Option<String>,
    saved_at: String,
    passes: SeasonPasses,
}

/// Cache file for one competition/season/team selection, under `dir` or the app
/// cache directory.
pub fn cache_path(
    dir: Option<&Path>,
    competition_id: u32,
    season_id: u32,
    team: Option<&str>,
) -> Option<PathBuf> {
    let base = match dir {
        Some(dir) => dir.to_path_buf(),
        None => app_cache_dir()?.join("passes"),
    };
    let team_key = team.map(slug).unwrap_or_else(|| "all".to_string());
    Some(base.join(format!("{competition_id}_{season_id}_{team_key}.json")))
}

/// Cached passes, or `None` when absent, unreadable, from another cache version or
/// for a different selection.
pub fn load(
    path: &Path,
    competition_id: u32,
    season_id: u32,
    team: Option<&str>,
) -> Option<SeasonPasses> {
    let raw = fs::read_to_string(path).ok()?;
    let cache = serde_json::from_str::<CacheFile>(&raw).ok()?;
    if cache.version != CACHE_VERSION
        || cache.competition_id != competition_id
        || cache.season_id != season_id
        || cache.team.as_deref() != team
    {
        return None;
    }
    Some(cache.passes)
}

pub fn save(
    path: &Path,
    competition_id: u32,
    season_id: u32,
    team: Option<&str>,
    passes: &SeasonPasses,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create cache dir {}", parent.display()))?;
    }
    let cache = CacheFile {
        version: CACHE_VERSION,
        competition_id,
        season_id,
        team: team.map(str::to_string),
        saved_at: Utc::now().to_rfc3339(),
        passes: passes.clone(),
    };
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(&cache).context("serialize pass cache")?;
    fs::write(&tmp, json).context("write pass cache")?;
    fs::rename(&tmp, path).context("swap pass cache")?;
    Ok(())
}

/// Season passes for `config`, from the cache when allowed and present, otherwise
/// from the open-data source. A complete fetch is written back to the cache.
pub fn load_or_fetch(config: &AnalysisConfig) -> Result<SeasonLoad> {
    let team = config.team.as_deref();
    let path = cache_path(
        config.cache_dir.as_deref(),
        config.competition_id,
        config.season_id,
        team,
    );

    if config.use_cache
        && let Some(path) = path.as_deref()
        && let Some(passes) = load(path, config.competition_id, config.season_id, team)
    {
        info!("using cached passes from {}", path.display());
        return Ok(SeasonLoad {
            matches: Vec::new(),
            passes,
            errors: Vec::new(),
        });
    }

    let loaded = open_data::load_season_passes(&config.source(), &config.season_request())?;

    if let Some(path) = path.as_deref() {
        if loaded.errors.is_empty() {
            let saved = save(
                path,
                config.competition_id,
                config.season_id,
                team,
                &loaded.passes,
            );
            if let Err(err) = saved {
                warn!("pass cache not written: {err:#}");
            }
        } else {
            warn!(
                "pass cache not written: {} matches failed to load",
                loaded.errors.len()
            );
        }
    }
    Ok(loaded)
}

fn slug(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass_event::{PassEvent, PitchPoint};

    #[test]
    fn round_trips_only_for_the_same_selection() {
        let dir = tempfile::tempdir().unwrap();
        let path = cache_path(Some(dir.path()), 37, 42, Some("Arsenal WFC")).unwrap();
        assert!(path.ends_with("37_42_arsenal_wfc.json"));

        let mut passes = SeasonPasses::new();
        passes.insert(
            7,
            vec![PassEvent::new(
                7,
                1,
                2,
                "Arsenal WFC",
                "Little",
                "Miedema",
                PitchPoint::new(60.0, 40.0),
                PitchPoint::new(70.0, 40.0),
            )],
        );
        save(&path, 37, 42, Some("Arsenal WFC"), &passes).unwrap();

        assert_eq!(load(&path, 37, 42, Some("Arsenal WFC")), Some(passes));
        assert_eq!(load(&path, 37, 42, None), None);
        assert_eq!(load(&path, 37, 43, Some("Arsenal WFC")), None);
    }
}
