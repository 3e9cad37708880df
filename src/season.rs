use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::detector::{DetectorParams, MatchOneTwoTable, OneTwoRow, detect};
use crate::errors::{AnalysisError, TableScope};
use crate::parallel::with_env_pool;
use crate::pass_event::{PassEvent, SeasonPasses};

/// Rows contributed by one match to the season table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSpan {
    pub match_id: u64,
    pub start: usize,
    pub len: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeasonOneTwoTable {
    rows: Vec<OneTwoRow>,
    spans: Vec<MatchSpan>,
}

impl SeasonOneTwoTable {
    /// Concatenate match tables in the order given. Fails on the first odd table.
    pub fn from_match_tables<I>(tables: I) -> Result<Self, AnalysisError>
    where
        I: IntoIterator<Item = MatchOneTwoTable>,
    {
        let mut season = Self::default();
        for table in tables {
            season.push_match(table)?;
        }
        Ok(season)
    }

    fn push_match(&mut self, table: MatchOneTwoTable) -> Result<(), AnalysisError> {
        if table.len() % 2 != 0 {
            return Err(AnalysisError::ParityViolation {
                scope: TableScope::Match(table.match_id),
                rows: table.len(),
            });
        }
        self.spans.push(MatchSpan {
            match_id: table.match_id,
            start: self.rows.len(),
            len: table.len(),
        });
        self.rows.extend(table.into_rows());
        Ok(())
    }

    pub fn rows(&self) -> &[OneTwoRow] {
        &self.rows
    }

    pub fn spans(&self) -> &[MatchSpan] {
        &self.spans
    }

    pub fn match_rows(&self, match_id: u64) -> &[OneTwoRow] {
        self.spans
            .iter()
            .find(|span| span.match_id == match_id)
            .and_then(|span| self.rows.get(span.start..span.start + span.len))
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn pair_count(&self) -> usize {
        self.rows.len() / 2
    }

    pub fn match_count(&self) -> usize {
        self.spans.len()
    }
}

/// Detect one-twos in every match and concatenate in ascending match id order.
///
/// Matches run in parallel; results are collected back into key order before
/// concatenation so the output does not depend on scheduling.
pub fn aggregate(
    matches: &SeasonPasses,
    params: &DetectorParams,
) -> Result<SeasonOneTwoTable, AnalysisError> {
    params.validate()?;
    let inputs: Vec<(u64, &[PassEvent])> = matches
        .iter()
        .map(|(id, passes)| (*id, passes.as_slice()))
        .collect();

    let results: Vec<Result<MatchOneTwoTable, AnalysisError>> =
        with_env_pool("ANALYSIS_PARALLELISM", 1, || {
            inputs
                .par_iter()
                .map(|(match_id, passes)| detect(*match_id, passes, params))
                .collect()
        });

    let mut tables = Vec::with_capacity(results.len());
    for result in results {
        tables.push(result?);
    }
    let season = SeasonOneTwoTable::from_match_tables(tables)?;
    info!(
        "season: {} one-two pairs across {} matches",
        season.pair_count(),
        season.match_count()
    );
    Ok(season)
}
