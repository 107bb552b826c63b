//! Search Engine (Tantivy retrieval with progressive relaxation)
//!
//! A query runs as typed first. Only if that finds nothing does it run again
//! with a trailing wildcard, and only if that finds nothing with edit
//! distance 1 on the last term. Syntax and execution faults in any stage
//! count as zero hits and the chain moves on.

use crate::config::FieldWeights;
use crate::indexer::{Indexer, IndexerError};
use crate::interface::{FolioError, QueryHit, Relaxation, SearchOutcome};
use crate::query::{self, QueryError};
use crate::snapshot::IndexSnapshot;
use thiserror::Error;
use tracing::debug;

/// Maximum results rendered in the panel.
pub const MAX_RESULTS: usize = 8;

/// Shorter (trimmed) queries close the panel instead of searching.
pub const MIN_QUERY_CHARS: usize = 2;

/// Why a single relaxation stage produced no hit list
#[derive(Debug, Error)]
pub enum SearchFault {
    #[error("query syntax: {0}")]
    Syntax(#[from] QueryError),
    #[error("query execution: {0}")]
    Execution(#[from] IndexerError),
}

/// Limits applied around the relaxation chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    pub max_results: usize,
    pub min_query_chars: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_results: MAX_RESULTS,
            min_query_chars: MIN_QUERY_CHARS,
        }
    }
}

/// The loaded index: ranking structures plus the records they point at.
pub struct SearchEngine {
    indexer: Indexer,
    snapshot: IndexSnapshot,
}

impl SearchEngine {
    pub fn build(snapshot: IndexSnapshot, weights: FieldWeights) -> Result<Self, FolioError> {
        let indexer = Indexer::build(&snapshot, weights)?;
        Ok(Self { indexer, snapshot })
    }

    pub fn snapshot(&self) -> &IndexSnapshot {
        &self.snapshot
    }

    pub fn num_docs(&self) -> u64 {
        self.indexer.num_docs()
    }

    /// Run one relaxation stage: the typed query plus the stage's suffix.
    pub fn run_stage(&self, query: &str, stage: Relaxation) -> Result<Vec<QueryHit>, SearchFault> {
        let relaxed = format!("{}{}", query, stage.suffix());
        let parsed = query::parse(&relaxed)?;
        let ranked = self.indexer.search(&parsed)?;
        Ok(ranked
            .into_iter()
            .map(|r| QueryHit {
                permalink: r.permalink,
                score: r.score,
            })
            .collect())
    }

    /// Walk the relaxation chain; the first stage with hits wins.
    /// Returns `None` when every stage came back empty or faulted.
    pub fn search(&self, query: &str, limit: usize) -> Option<(Relaxation, Vec<QueryHit>)> {
        for stage in Relaxation::CHAIN {
            let mut hits = match self.run_stage(query, stage) {
                Ok(hits) => hits,
                Err(fault) => {
                    debug!(query, ?stage, %fault, "search stage faulted, treating as no hits");
                    Vec::new()
                }
            };
            if hits.is_empty() {
                debug!(query, ?stage, "no hits, relaxing");
                continue;
            }
            hits.truncate(limit);
            return Some((stage, hits));
        }
        None
    }
}

/// Decide what a keystroke should show, given the (possibly absent) engine.
pub fn evaluate(engine: Option<&SearchEngine>, input: &str, limits: QueryLimits) -> SearchOutcome {
    let query = input.trim();
    if query.chars().count() < limits.min_query_chars {
        return SearchOutcome::Idle;
    }

    let Some(engine) = engine else {
        return SearchOutcome::Loading;
    };

    match engine.search(query, limits.max_results) {
        Some((stage, hits)) => SearchOutcome::Hits { stage, hits },
        None => SearchOutcome::NoResults,
    }
}
