use std::collections::{BTreeMap, BTreeSet, HashSet};

use clap::ValueEnum;
use tracing::debug;

use super::ExpansionError;
use super::text::{StopWords, normalize_document, tokenize_terms};

/// Aggregate TF-IDF weight per candidate term, ordered by term.
pub type TermWeights = BTreeMap<String, f64>;

/// Which vocabulary terms become candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum CandidateSource {
    /// Every term of the fitted vocabulary.
    #[default]
    Vocabulary,
    /// Only the terms of the relevant document most similar to the query.
    #[value(name = "most-similar")]
    MostSimilarDocument,
}

/// TF-IDF model fitted over a small corpus: raw counts, smoothed IDF and
/// L2-normalised rows. The vocabulary is sorted, so column order is stable.
#[derive(Debug)]
pub struct TfIdfModel {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
    rows: Vec<Vec<f64>>,
}

impl TfIdfModel {
    pub fn fit(documents: &[String], stopwords: &StopWords) -> Result<Self, ExpansionError> {
        let tokenized: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| analyze(doc, stopwords))
            .collect();

        let vocabulary: BTreeMap<String, usize> = tokenized
            .iter()
            .flatten()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(column, term)| (term.clone(), column))
            .collect();

        if vocabulary.is_empty() {
            return Err(ExpansionError::EmptyVocabulary);
        }

        let mut doc_freq = vec![0usize; vocabulary.len()];
        for tokens in &tokenized {
            let unique: HashSet<&String> = tokens.iter().collect();
            for term in unique {
                doc_freq[vocabulary[term]] += 1;
            }
        }

        let n = documents.len() as f64;
        let idf: Vec<f64> = doc_freq
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let mut model = Self {
            vocabulary,
            idf,
            rows: Vec::new(),
        };
        let rows = tokenized.iter().map(|tokens| model.weigh(tokens)).collect();
        model.rows = rows;
        Ok(model)
    }

    /// Project unseen text into the fitted vector space.
    pub fn transform(&self, text: &str, stopwords: &StopWords) -> Vec<f64> {
        self.weigh(&analyze(text, stopwords))
    }

    fn weigh(&self, tokens: &[String]) -> Vec<f64> {
        let mut row = vec![0.0; self.vocabulary.len()];
        for token in tokens {
            if let Some(&column) = self.vocabulary.get(token) {
                row[column] += 1.0;
            }
        }
        for (value, idf) in row.iter_mut().zip(&self.idf) {
            *value *= idf;
        }
        let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in &mut row {
                *value /= norm;
            }
        }
        row
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Sum of a term's score over every document of the corpus.
    pub fn aggregate_weight(&self, term: &str) -> Option<f64> {
        let column = *self.vocabulary.get(term)?;
        Some(self.rows.iter().map(|row| row[column]).sum())
    }

    /// Index of the first row with the highest dot product against `vector`,
    /// looking only at the first `limit` rows. Ties, including a query with
    /// no known terms, resolve to the earliest row.
    fn most_similar_row(&self, vector: &[f64], limit: usize) -> usize {
        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (index, row) in self.rows.iter().take(limit).enumerate() {
            let score: f64 = row.iter().zip(vector).map(|(a, b)| a * b).sum();
            if score > best_score {
                best = index;
                best_score = score;
            }
        }
        best
    }
}

fn analyze(text: &str, stopwords: &StopWords) -> Vec<String> {
    tokenize_terms(text)
        .into_iter()
        .filter(|term| !stopwords.contains(term))
        .collect()
}

/// Weigh candidate expansion terms for `query` over the relevant documents.
///
/// Terms already in the query (exact match on its whitespace split) never
/// appear in the result. The caller's documents are never modified; the
/// query pseudo-document goes into a private copy of the corpus.
pub fn compute_term_weights<D: AsRef<str>>(
    query: &str,
    relevant_docs: &[D],
    stopwords: &StopWords,
    candidates: CandidateSource,
    include_query: bool,
) -> Result<TermWeights, ExpansionError> {
    if relevant_docs.is_empty() {
        return Err(ExpansionError::InsufficientData);
    }

    let mut corpus: Vec<String> = relevant_docs
        .iter()
        .map(|doc| normalize_document(doc.as_ref(), stopwords))
        .collect();
    if include_query {
        corpus.push(normalize_document(query, stopwords));
    }

    let model = TfIdfModel::fit(&corpus, stopwords)?;
    let query_terms: HashSet<&str> = query.split_whitespace().collect();

    let mut weights = TermWeights::new();
    match candidates {
        CandidateSource::Vocabulary => {
            for term in model.vocabulary.keys() {
                if query_terms.contains(term.as_str()) {
                    continue;
                }
                if let Some(weight) = model.aggregate_weight(term) {
                    weights.insert(term.clone(), weight);
                }
            }
        }
        CandidateSource::MostSimilarDocument => {
            let query_vector = model.transform(query, stopwords);
            let best = model.most_similar_row(&query_vector, relevant_docs.len());
            debug!(document = best, "most similar relevant document");
            for word in corpus[best].split_whitespace() {
                if query_terms.contains(word) || weights.contains_key(word) {
                    continue;
                }
                if let Some(weight) = model.aggregate_weight(word) {
                    weights.insert(word.to_string(), weight);
                }
            }
        }
    }

    debug!(
        documents = corpus.len(),
        vocabulary = model.vocabulary_len(),
        candidates = weights.len(),
        "term weights computed"
    );
    Ok(weights)
}
