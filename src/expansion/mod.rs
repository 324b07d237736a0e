//! Query expansion: TF-IDF term weighting over relevant documents and
//! selection of the next terms to append to the query.

pub mod embedding;
pub mod select;
pub mod text;
pub mod weights;

use std::collections::HashSet;

use clap::ValueEnum;
use tracing::debug;

use embedding::{EmbeddingParams, SubwordEmbedder};
pub use text::StopWords;
pub use weights::{CandidateSource, TermWeights};

#[derive(Debug, thiserror::Error)]
pub enum ExpansionError {
    #[error("no relevant documents to expand from")]
    InsufficientData,

    #[error("relevant documents contain no usable terms after stopword removal")]
    EmptyVocabulary,

    #[error("no embedding available for '{0}'")]
    EmbeddingLookup(String),
}

/// How equally-weighted candidates are ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum TieBreak {
    /// Descending lexical order.
    #[default]
    Lexical,
    /// Cosine similarity to the query under an embedding trained on the relevant documents.
    Semantic,
}

#[derive(Debug, Clone, Default)]
pub struct ExpansionOptions {
    pub tie_break: TieBreak,
    pub candidates: CandidateSource,
    /// Add the query to the corpus as a pseudo-document before fitting.
    pub include_query: bool,
    pub embedding: EmbeddingParams,
}

/// Computes expansion terms for one feedback round.
///
/// Holds the process-wide stopword set; every call is a pure function of its
/// arguments.
#[derive(Debug)]
pub struct Expander {
    stopwords: StopWords,
    options: ExpansionOptions,
}

impl Expander {
    pub fn new(stopwords: StopWords, options: ExpansionOptions) -> Self {
        Self { stopwords, options }
    }

    pub fn options(&self) -> &ExpansionOptions {
        &self.options
    }

    pub fn compute_term_weights<D: AsRef<str>>(
        &self,
        query: &str,
        relevant_docs: &[D],
    ) -> Result<TermWeights, ExpansionError> {
        weights::compute_term_weights(
            query,
            relevant_docs,
            &self.stopwords,
            self.options.candidates,
            self.options.include_query,
        )
    }

    /// Choose up to two new terms. Terms already in `original_query` are never returned.
    pub fn select_expansion_terms<D: AsRef<str>>(
        &self,
        weights: &TermWeights,
        original_query: &str,
        relevant_docs: &[D],
    ) -> Result<Vec<String>, ExpansionError> {
        let query_terms: HashSet<&str> = original_query.split_whitespace().collect();
        let candidates: TermWeights = weights
            .iter()
            .filter(|(term, _)| !query_terms.contains(term.as_str()))
            .map(|(term, &weight)| (term.clone(), weight))
            .collect();

        let terms = match self.options.tie_break {
            TieBreak::Lexical => select::select_lexical(&candidates),
            TieBreak::Semantic => {
                let sentences: Vec<Vec<String>> = relevant_docs
                    .iter()
                    .flat_map(|doc| text::sentences(doc.as_ref()))
                    .collect();
                let embedder = SubwordEmbedder::train(&sentences, self.options.embedding);
                select::select_semantic(&candidates, original_query, &embedder)?
            }
        };
        debug!(tie_break = ?self.options.tie_break, ?terms, "expansion terms selected");
        Ok(terms)
    }

    pub fn expand<D: AsRef<str>>(
        &self,
        query: &str,
        relevant_docs: &[D],
    ) -> Result<Vec<String>, ExpansionError> {
        let weights = self.compute_term_weights(query, relevant_docs)?;
        self.select_expansion_terms(&weights, query, relevant_docs)
    }
}
