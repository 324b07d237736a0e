//! The relevance-feedback loop: search, collect judgments, expand, repeat.

pub mod format;

use std::io::{self, Write};

use tracing::{info, warn};

use crate::expansion::{Expander, ExpansionError, select};
use crate::feedback::Judge;
use crate::google::{SearchClient, SearchError};
use format::format_summary;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("search failed: {0}")]
    Search(#[from] SearchError),

    #[error("console I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("query expansion failed: {0}")]
    Expansion(#[from] ExpansionError),
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub query: String,
    pub target_precision: f64,
    /// Stop after this many search rounds even if the target is not met.
    pub max_rounds: Option<u32>,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    TargetReached,
    NoResults,
    NoRelevant,
    NoNewTerms,
    RoundLimit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundReport {
    pub query: String,
    pub returned: usize,
    pub relevant: usize,
}

impl RoundReport {
    pub fn precision(&self) -> f64 {
        if self.returned == 0 {
            return 0.0;
        }
        self.relevant as f64 / self.returned as f64
    }
}

#[derive(Debug)]
pub struct SessionReport {
    pub outcome: Outcome,
    /// The query as it stood when the session ended.
    pub query: String,
    pub rounds: Vec<RoundReport>,
}

/// One refinement session. Progress text goes to `output`.
pub struct Session<W> {
    config: SessionConfig,
    output: W,
}

impl<W: Write> Session<W> {
    pub fn new(config: SessionConfig, output: W) -> Self {
        Self { config, output }
    }

    pub async fn run(
        &mut self,
        search: &impl SearchClient,
        judge: &mut impl Judge,
        expander: &Expander,
    ) -> Result<SessionReport, SessionError> {
        let mut query = self.config.query.clone();
        let mut rounds: Vec<RoundReport> = Vec::new();

        let outcome = loop {
            info!(round = rounds.len() + 1, query = %query, "searching");
            let items = search.search(&query).await?;
            if items.is_empty() {
                writeln!(self.output, "No results found for \"{query}\".")?;
                break Outcome::NoResults;
            }

            let mut relevant_docs = Vec::new();
            for (index, item) in items.iter().enumerate() {
                if judge.judge(index + 1, item)? {
                    relevant_docs.push(item.document_text());
                }
            }

            let report = RoundReport {
                query: query.clone(),
                returned: items.len(),
                relevant: relevant_docs.len(),
            };
            let precision = report.precision();
            write!(self.output, "{}", format_summary(&report))?;
            rounds.push(report);

            if precision >= self.config.target_precision {
                writeln!(self.output, "Desired precision reached, done")?;
                break Outcome::TargetReached;
            }
            if relevant_docs.is_empty() {
                writeln!(
                    self.output,
                    "Below desired precision, but can no longer augment the query"
                )?;
                break Outcome::NoRelevant;
            }

            writeln!(
                self.output,
                "Still below the desired precision of {}",
                self.config.target_precision
            )?;
            // The last allowed round is not expanded: its query would never be searched.
            if let Some(max) = self.config.max_rounds
                && rounds.len() >= max as usize
            {
                writeln!(self.output, "Stopping after {max} rounds.")?;
                break Outcome::RoundLimit;
            }
            writeln!(self.output, "Indexing results ....")?;

            let terms = expansion_terms(expander, &query, &relevant_docs)?;
            if terms.is_empty() {
                writeln!(self.output, "No new terms to augment the query with")?;
                break Outcome::NoNewTerms;
            }

            let added = terms.join(" ");
            writeln!(self.output, "Augmenting by  {added}")?;
            info!(precision, added = %added, "query expanded");
            query = format!("{query} {added}");
        };

        Ok(SessionReport {
            outcome,
            query,
            rounds,
        })
    }
}

/// Expand the query, falling back to lexical order when the semantic
/// tie-break cannot embed a term.
fn expansion_terms(
    expander: &Expander,
    query: &str,
    relevant_docs: &[String],
) -> Result<Vec<String>, ExpansionError> {
    match expander.expand(query, relevant_docs) {
        Err(ExpansionError::EmbeddingLookup(term)) => {
            warn!(%term, "semantic tie-break failed; using lexical order");
            let weights = expander.compute_term_weights(query, relevant_docs)?;
            Ok(select::select_lexical(&weights))
        }
        other => other,
    }
}
