pub mod config;
pub mod detector;
pub mod errors;
pub mod export;
pub mod http_cache;
pub mod http_client;
pub mod open_data;
pub mod parallel;
pub mod pass_cache;
pub mod pass_event;
pub mod player_stats;
pub mod roles;
pub mod season;
pub mod synthetic;

pub use detector::{DetectorParams, MatchOneTwoTable, OneTwoRow, detect};
pub use errors::{AnalysisError, TableScope};
pub use pass_event::{PassEvent, PitchPoint, SeasonPasses};
pub use player_stats::{PlayerStat, PlayerStats, compute_player_stats};
pub use season::{SeasonOneTwoTable, aggregate};
