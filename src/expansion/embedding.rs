use std::collections::HashMap;
use std::hash::Hasher;

use tracing::debug;
use twox_hash::XxHash64;

use super::ExpansionError;

/// Maps a term to a dense vector for similarity scoring.
pub trait Embedder {
    fn embed(&self, term: &str) -> Result<Vec<f32>, ExpansionError>;

    /// Embed multi-word text as the mean of its word embeddings.
    fn embed_text(&self, text: &str) -> Result<Vec<f32>, ExpansionError> {
        let mut sum: Option<Vec<f32>> = None;
        let mut count = 0usize;
        for word in text.split_whitespace() {
            let vector = self.embed(word)?;
            match sum.as_mut() {
                Some(acc) => add_assign(acc, &vector),
                None => sum = Some(vector),
            }
            count += 1;
        }
        let mut mean = sum.ok_or_else(|| ExpansionError::EmbeddingLookup(text.to_string()))?;
        for value in &mut mean {
            *value /= count as f32;
        }
        Ok(mean)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EmbeddingParams {
    pub dimensions: usize,
    /// Words on each side of the centre word that count as context.
    pub window: usize,
    pub min_ngram: usize,
    pub max_ngram: usize,
}

impl Default for EmbeddingParams {
    fn default() -> Self {
        Self {
            dimensions: 128,
            window: 5,
            min_ngram: 3,
            max_ngram: 5,
        }
    }
}

/// Random-indexing word model with character n-gram fallback.
///
/// Every word and n-gram owns a fixed pseudo-random index vector derived from
/// an xxHash64 of its text. Training sums the index vectors of each word's
/// neighbours into its context vector. A term embeds as its normalised
/// context vector (when it was seen with neighbours) plus the normalised mean
/// of its subword vectors, so unseen terms still get a position.
#[derive(Debug)]
pub struct SubwordEmbedder {
    params: EmbeddingParams,
    contexts: HashMap<String, Vec<f32>>,
}

impl SubwordEmbedder {
    pub fn train(sentences: &[Vec<String>], params: EmbeddingParams) -> Self {
        let mut contexts: HashMap<String, Vec<f32>> = HashMap::new();
        let mut index_cache: HashMap<&str, Vec<f32>> = HashMap::new();

        for sentence in sentences {
            for (position, word) in sentence.iter().enumerate() {
                let start = position.saturating_sub(params.window);
                let end = (position + params.window + 1).min(sentence.len());
                for (offset, neighbour) in sentence[start..end].iter().enumerate() {
                    if start + offset == position {
                        continue;
                    }
                    let index = index_cache
                        .entry(neighbour.as_str())
                        .or_insert_with(|| index_vector(neighbour, params.dimensions));
                    let context = contexts
                        .entry(word.clone())
                        .or_insert_with(|| vec![0.0; params.dimensions]);
                    add_assign(context, index);
                }
            }
        }

        contexts.retain(|_, vector| normalize(vector));
        debug!(
            sentences = sentences.len(),
            words = contexts.len(),
            "embedding model trained"
        );
        Self { params, contexts }
    }

    fn subword_vector(&self, term: &str) -> Option<Vec<f32>> {
        let grams = char_ngrams(term, self.params.min_ngram, self.params.max_ngram);
        let mut vector = vec![0.0; self.params.dimensions];
        for gram in &grams {
            add_assign(&mut vector, &index_vector(gram, self.params.dimensions));
        }
        normalize(&mut vector).then_some(vector)
    }
}

impl Embedder for SubwordEmbedder {
    fn embed(&self, term: &str) -> Result<Vec<f32>, ExpansionError> {
        let term = term.to_lowercase();
        let lookup_error = || ExpansionError::EmbeddingLookup(term.clone());
        let mut vector = self.subword_vector(&term).ok_or_else(lookup_error)?;
        if let Some(context) = self.contexts.get(&term) {
            add_assign(&mut vector, context);
        }
        Ok(vector)
    }
}

/// Character n-grams of `<term>` with lengths in `min..=max`.
fn char_ngrams(term: &str, min: usize, max: usize) -> Vec<String> {
    if term.is_empty() {
        return Vec::new();
    }
    let chars: Vec<char> = format!("<{term}>").chars().collect();
    let mut grams = Vec::new();
    for n in min..=max {
        if n > chars.len() {
            break;
        }
        grams.extend(chars.windows(n).map(|w| w.iter().collect::<String>()));
    }
    grams
}

fn index_vector(key: &str, dimensions: usize) -> Vec<f32> {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(key.as_bytes());
    let mut rng = fastrand::Rng::with_seed(hasher.finish());
    (0..dimensions).map(|_| rng.f32() * 2.0 - 1.0).collect()
}

fn add_assign(acc: &mut [f32], other: &[f32]) {
    for (a, b) in acc.iter_mut().zip(other) {
        *a += b;
    }
}

/// Scale to unit length. Returns false for the zero vector.
fn normalize(vector: &mut [f32]) -> bool {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm <= f32::EPSILON {
        return false;
    }
    for value in vector.iter_mut() {
        *value /= norm;
    }
    true
}

pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0f32;
    let mut norm_a = 0f32;
    let mut norm_b = 0f32;
    for (ai, bi) in a.iter().zip(b) {
        dot += ai * bi;
        norm_a += ai * ai;
        norm_b += bi * bi;
    }
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Vec<String>> {
        [
            "fast red car drives home",
            "fast red auto drives home",
            "green leaf tree grows tall",
        ]
        .iter()
        .map(|s| s.split_whitespace().map(String::from).collect())
        .collect()
    }

    #[test]
    fn ngrams_include_boundary_markers() {
        let grams = char_ngrams("car", 3, 4);
        assert_eq!(grams, vec!["<ca", "car", "ar>", "<car", "car>"]);
    }

    #[test]
    fn ngrams_of_empty_term_are_empty() {
        assert!(char_ngrams("", 3, 5).is_empty());
    }

    #[test]
    fn training_is_deterministic() {
        let a = SubwordEmbedder::train(&corpus(), EmbeddingParams::default());
        let b = SubwordEmbedder::train(&corpus(), EmbeddingParams::default());
        assert_eq!(a.embed("car").unwrap(), b.embed("car").unwrap());
    }

    #[test]
    fn shared_contexts_are_similar() {
        let model = SubwordEmbedder::train(&corpus(), EmbeddingParams::default());
        let car = model.embed("car").unwrap();
        let auto = model.embed("auto").unwrap();
        let leaf = model.embed("leaf").unwrap();
        assert!(cosine(&car, &auto) > cosine(&car, &leaf));
    }

    #[test]
    fn unseen_terms_fall_back_to_subwords() {
        let params = EmbeddingParams {
            dimensions: 512,
            ..EmbeddingParams::default()
        };
        let model = SubwordEmbedder::train(&corpus(), params);
        let cars = model.embed("cars").unwrap();
        let car = model.embed("car").unwrap();
        let leaf = model.embed("leaf").unwrap();
        assert!(cosine(&cars, &car) > cosine(&cars, &leaf));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let model = SubwordEmbedder::train(&corpus(), EmbeddingParams::default());
        assert_eq!(model.embed("Car").unwrap(), model.embed("car").unwrap());
    }

    #[test]
    fn empty_term_is_a_lookup_error() {
        let model = SubwordEmbedder::train(&corpus(), EmbeddingParams::default());
        assert!(matches!(
            model.embed(""),
            Err(ExpansionError::EmbeddingLookup(_))
        ));
        assert!(matches!(
            model.embed_text("   "),
            Err(ExpansionError::EmbeddingLookup(_))
        ));
    }

    #[test]
    fn embed_text_averages_words() {
        let model = SubwordEmbedder::train(&corpus(), EmbeddingParams::default());
        let red = model.embed("red").unwrap();
        let car = model.embed("car").unwrap();
        let phrase = model.embed_text("red car").unwrap();
        for i in 0..phrase.len() {
            assert!((phrase[i] - (red[i] + car[i]) / 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn cosine_of_mismatched_lengths_is_zero() {
        assert_eq!(cosine(&[1.0, 0.0], &[1.0]), 0.0);
        assert!((cosine(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-6);
    }
}
