use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Which table a parity check ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TableScope {
    Match(u64),
    Season,
}

impl fmt::Display for TableScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableScope::Match(id) => write!(f, "match {id}"),
            TableScope::Season => write!(f, "season"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("match {match_id}: pass at row {index} is missing {field}")]
    MalformedEvent {
        match_id: u64,
        index: usize,
        field: &'static str,
    },

    #[error(
        "match {match_id}: pass at row {index} is out of order or untimed \
         ({timestamp}s after {previous}s)"
    )]
    /// `previous` is negative infinity when the first row is the bad one.
    OrderingViolation {
        match_id: u64,
        index: usize,
        timestamp: f64,
        previous: f64,
    },

    #[error("{scope}: one-two table has an odd row count ({rows})")]
    ParityViolation { scope: TableScope, rows: usize },

    #[error("no one-two rows involve player {player}")]
    UnknownPlayer { player: String },

    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

impl AnalysisError {
    /// Match the error belongs to, if it is tied to one.
    pub fn match_id(&self) -> Option<u64> {
        match self {
            AnalysisError::MalformedEvent { match_id, .. }
            | AnalysisError::OrderingViolation { match_id, .. } => Some(*match_id),
            AnalysisError::ParityViolation {
                scope: TableScope::Match(id),
                ..
            } => Some(*id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_match() {
        let err = AnalysisError::ParityViolation {
            scope: TableScope::Match(3788741),
            rows: 5,
        };
        assert_eq!(
            err.to_string(),
            "match 3788741: one-two table has an odd row count (5)"
        );
        assert_eq!(err.match_id(), Some(3788741));

        let season = AnalysisError::ParityViolation {
            scope: TableScope::Season,
            rows: 3,
        };
        assert!(season.to_string().starts_with("season:"));
        assert_eq!(season.match_id(), None);
    }
}
