use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::detector::{
    DEFAULT_CARRY_DISTANCE, DEFAULT_PROGRESSION_RATIO, DEFAULT_TIME_WINDOW_SECS, DetectorParams,
};
use crate::open_data::{DEFAULT_OPEN_DATA_URL, OpenDataSource, SeasonRequest};

const DEFAULT_TOP_N: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub xlsx: Option<PathBuf>,
    #[serde(default)]
    pub json: Option<PathBuf>,
}

/// Everything one analysis run needs. Field aliases accept the older input files
/// (`threshold_seconds`, `path_to_360`, `n`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub competition_name: Option<String>,
    pub competition_id: u32,
    pub season_id: u32,
    /// Only this team's matches and passes; `None` analyses every team.
    #[serde(default, alias = "team_name")]
    pub team: Option<String>,
    #[serde(default)]
    pub players: Vec<String>,
    /// Local open-data checkout (the directory holding `matches/`, `events/`, ...).
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Folder of `{match_id}.json` 360 files. Match lists and events still come from
    /// `data_dir` or the remote mirror.
    #[serde(default, alias = "path_to_360")]
    pub three_sixty_dir: Option<PathBuf>,
    #[serde(default)]
    pub open_data_url: Option<String>,
    #[serde(default = "default_time_window", alias = "threshold_seconds")]
    pub time_window: f64,
    #[serde(default = "default_progression_ratio", alias = "threshold_progression")]
    pub progression_ratio: f64,
    #[serde(default = "default_carry_distance", alias = "threshold_carry")]
    pub carry_distance: f64,
    #[serde(default = "default_top_n", alias = "n")]
    pub top_n: usize,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default, alias = "data_save_path")]
    pub cache_dir: Option<PathBuf>,
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
}

fn default_time_window() -> f64 {
    DEFAULT_TIME_WINDOW_SECS
}

fn default_progression_ratio() -> f64 {
    DEFAULT_PROGRESSION_RATIO
}

fn default_carry_distance() -> f64 {
    DEFAULT_CARRY_DISTANCE
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_use_cache() -> bool {
    true
}

impl AnalysisConfig {
    pub fn new(competition_id: u32, season_id: u32) -> Self {
        Self {
            competition_name: None,
            competition_id,
            season_id,
            team: None,
            players: Vec::new(),
            data_dir: None,
            three_sixty_dir: None,
            open_data_url: None,
            time_window: DEFAULT_TIME_WINDOW_SECS,
            progression_ratio: DEFAULT_PROGRESSION_RATIO,
            carry_distance: DEFAULT_CARRY_DISTANCE,
            top_n: DEFAULT_TOP_N,
            output: OutputConfig::default(),
            cache_dir: None,
            use_cache: true,
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("parse analysis config json")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("in {}", path.display()))
    }

    /// Config file (from `--config` or `ONE_TWO_CONFIG`) overlaid with env vars and
    /// then command-line flags, validated.
    pub fn resolve(args: &[String]) -> Result<Self> {
        let path = arg_value(args, "--config")
            .or_else(|| env::var("ONE_TWO_CONFIG").ok())
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        let mut config = match path {
            Some(path) => Self::load(&path)?,
            None => Self::new(0, 0),
        };
        config.apply_env();
        config.apply_args(args)?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        if let Ok(dir) = env::var("OPEN_DATA_DIR")
            && !dir.trim().is_empty()
        {
            self.data_dir = Some(PathBuf::from(dir.trim()));
        }
        if let Ok(url) = env::var("OPEN_DATA_BASE_URL")
            && !url.trim().is_empty()
        {
            self.open_data_url = Some(url.trim().to_string());
        }
    }

    pub fn apply_args(&mut self, args: &[String]) -> Result<()> {
        if let Some(v) = parse_arg::<u32>(args, "--competition-id")? {
            self.competition_id = v;
        }
        if let Some(v) = parse_arg::<u32>(args, "--season-id")? {
            self.season_id = v;
        }
        if let Some(team) = arg_value(args, "--team") {
            self.team = Some(team);
        }
        if has_flag(args, "--all-teams") {
            self.team = None;
        }
        if let Some(raw) = arg_value(args, "--players") {
            self.players = raw
                .split([',', ';'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(dir) = arg_value(args, "--data-dir") {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = arg_value(args, "--three-sixty-dir") {
            self.three_sixty_dir = Some(PathBuf::from(dir));
        }
        if let Some(v) = parse_arg::<f64>(args, "--time-window")? {
            self.time_window = v;
        }
        if let Some(v) = parse_arg::<f64>(args, "--progression-ratio")? {
            self.progression_ratio = v;
        }
        if let Some(v) = parse_arg::<f64>(args, "--carry-distance")? {
            self.carry_distance = v;
        }
        if let Some(v) = parse_arg::<usize>(args, "--top")? {
            self.top_n = v;
        }
        if let Some(path) = arg_value(args, "--xlsx") {
            self.output.xlsx = Some(PathBuf::from(path));
        }
        if let Some(path) = arg_value(args, "--json") {
            self.output.json = Some(PathBuf::from(path));
        }
        if has_flag(args, "--no-cache") {
            self.use_cache = false;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.competition_id == 0 {
            return Err(anyhow!("competition id is required"));
        }
        if self.season_id == 0 {
            return Err(anyhow!("season id is required"));
        }
        if self.top_n == 0 {
            return Err(anyhow!("top n must be at least 1"));
        }
        if self.team.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(anyhow!("team filter is blank"));
        }
        self.detector_params()
            .validate()
            .context("invalid one-two thresholds")?;
        Ok(())
    }

    pub fn detector_params(&self) -> DetectorParams {
        DetectorParams {
            time_window: self.time_window,
            progression_ratio: self.progression_ratio,
            carry_distance: self.carry_distance,
        }
    }

    pub fn source(&self) -> OpenDataSource {
        match &self.data_dir {
            Some(dir) => OpenDataSource::Local(dir.clone()),
            None => OpenDataSource::Remote {
                base_url: self
                    .open_data_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_OPEN_DATA_URL.to_string()),
            },
        }
    }

    pub fn season_request(&self) -> SeasonRequest {
        SeasonRequest {
            competition_id: self.competition_id,
            season_id: self.season_id,
            team: self.team.clone(),
            three_sixty_dir: self.three_sixty_dir.clone(),
        }
    }

    pub fn label(&self) -> String {
        let competition = self
            .competition_name
            .clone()
            .unwrap_or_else(|| format!("competition {}", self.competition_id));
        match &self.team {
            Some(team) => format!("{competition} season {} ({team})", self.season_id),
            None => format!("{competition} season {}", self.season_id),
        }
    }
}

/// `--name value` or `--name=value`.
pub fn arg_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&prefix) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
            && !next.starts_with("--")
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

pub fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|arg| arg == name)
}

fn parse_arg<T>(args: &[String], name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match arg_value(args, name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|err| anyhow!("{name}: cannot parse {raw:?}: {err}")),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn legacy_input_keys_are_accepted() {
        let raw = r#"{
            "competition_name": "FA WSL",
            "competition_id": 37,
            "season_id": 42,
            "team_name": "Arsenal WFC",
            "path_to_360": "open-data/data/three-sixty",
            "threshold_seconds": 4,
            "threshold_progression": 0.8,
            "threshold_carry": 3.5,
            "n": 15,
            "data_save_path": "data/"
        }"#;
        let config = AnalysisConfig::from_json_str(raw).unwrap();
        assert_eq!(config.team.as_deref(), Some("Arsenal WFC"));
        assert_eq!(config.time_window, 4.0);
        assert_eq!(config.progression_ratio, 0.8);
        assert_eq!(config.carry_distance, 3.5);
        assert_eq!(config.top_n, 15);
        assert_eq!(config.cache_dir, Some(PathBuf::from("data/")));
        assert_eq!(
            config.three_sixty_dir,
            Some(PathBuf::from("open-data/data/three-sixty"))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn path_to_360_only_redirects_freeze_frames() {
        let raw = r#"{
            "competition_id": 53,
            "season_id": 106,
            "path_to_360": "open-data/data/three-sixty"
        }"#;
        let config = AnalysisConfig::from_json_str(raw).unwrap();
        assert_eq!(config.data_dir, None);
        assert_eq!(
            config.source(),
            OpenDataSource::Remote {
                base_url: DEFAULT_OPEN_DATA_URL.to_string()
            }
        );
        let request = config.season_request();
        assert_eq!(
            request.three_sixty_dir,
            Some(PathBuf::from("open-data/data/three-sixty"))
        );
        assert_eq!((request.competition_id, request.season_id), (53, 106));
    }

    #[test]
    fn missing_thresholds_fall_back_to_defaults() {
        let raw = r#"{"competition_id": 53, "season_id": 106, "team": null}"#;
        let config = AnalysisConfig::from_json_str(raw).unwrap();
        assert_eq!(config.detector_params(), DetectorParams::default());
        assert_eq!(config.team, None);
        assert!(config.use_cache);
        assert!(matches!(config.source(), OpenDataSource::Remote { .. }));
    }

    #[test]
    fn flags_override_file_values() {
        let mut config = AnalysisConfig::new(37, 42);
        config
            .apply_args(&args(&[
                "--team",
                "Chelsea FCW",
                "--time-window=6.5",
                "--players",
                "Sam Kerr, Fran Kirby",
                "--no-cache",
            ]))
            .unwrap();
        assert_eq!(config.team.as_deref(), Some("Chelsea FCW"));
        assert_eq!(config.time_window, 6.5);
        assert_eq!(config.players, vec!["Sam Kerr", "Fran Kirby"]);
        assert!(!config.use_cache);
    }

    #[test]
    fn bad_values_are_rejected() {
        let mut config = AnalysisConfig::new(37, 42);
        assert!(config.apply_args(&args(&["--time-window", "soon"])).is_err());

        config.progression_ratio = 1.2;
        assert!(config.validate().is_err());

        let unset = AnalysisConfig::new(0, 42);
        assert!(unset.validate().is_err());

        let mut no_rows = AnalysisConfig::new(37, 42);
        no_rows.top_n = 0;
        assert!(no_rows.validate().is_err());
    }
}
