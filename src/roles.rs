use serde::Serialize;

use crate::detector::OneTwoRow;
use crate::errors::{AnalysisError, TableScope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OneTwoRole {
    Opening,
    Closing,
}

impl OneTwoRole {
    /// Role of a row by position alone: even rows open, odd rows close.
    pub fn at(index: usize) -> Self {
        if index % 2 == 0 {
            OneTwoRole::Opening
        } else {
            OneTwoRole::Closing
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OneTwoRole::Opening => "open",
            OneTwoRole::Closing => "close",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoleSplit<'a> {
    pub opening: Vec<&'a OneTwoRow>,
    pub closing: Vec<&'a OneTwoRow>,
}

/// Positional split of a one-two table. Trusts the producer's opening-first layout
/// rather than re-deriving roles from pass direction.
pub fn split_roles(
    rows: &[OneTwoRow],
    scope: TableScope,
) -> Result<RoleSplit<'_>, AnalysisError> {
    if rows.len() % 2 != 0 {
        return Err(AnalysisError::ParityViolation {
            scope,
            rows: rows.len(),
        });
    }
    let mut opening = Vec::with_capacity(rows.len() / 2);
    let mut closing = Vec::with_capacity(rows.len() / 2);
    for (idx, row) in rows.iter().enumerate() {
        match OneTwoRole::at(idx) {
            OneTwoRole::Opening => opening.push(row),
            OneTwoRole::Closing => closing.push(row),
        }
    }
    Ok(RoleSplit { opening, closing })
}
