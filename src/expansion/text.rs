use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

/// Terms are runs of two or more non-whitespace characters, so tokens with
/// internal punctuation (`e-mail`, `u.s`) survive as single terms.
static TERM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S\S+").expect("term pattern is a valid regex"));

/// ASCII punctuation and symbols plus every Unicode punctuation character
/// (curly quotes, dashes, ellipses, guillemets).
static PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[[:punct:]\p{P}]+").expect("punctuation pattern is a valid regex")
});

/// Stopword list shipped with the binary, used when no `--stopwords` path is given.
const BUNDLED_STOPWORDS: &str = include_str!("../../resources/stopwords.txt");

#[derive(Debug, thiserror::Error)]
pub enum StopWordsError {
    #[error("failed to read stopword list {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Read-only stopword set, loaded once at startup and shared by every round.
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// Load a newline-delimited list. Entries are trimmed; blank lines are skipped.
    pub fn load(path: &Path) -> Result<Self, StopWordsError> {
        let contents = std::fs::read_to_string(path).map_err(|source| StopWordsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let stopwords = Self::parse(&contents);
        debug!(path = %path.display(), count = stopwords.len(), "stopwords loaded");
        Ok(stopwords)
    }

    /// The built-in English list.
    pub fn bundled() -> Self {
        Self::parse(BUNDLED_STOPWORDS)
    }

    pub fn parse(contents: &str) -> Self {
        contents.lines().collect()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for StopWords {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let words = iter
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }
}

/// Lowercase, split on whitespace, drop stopwords, then strip punctuation
/// (ASCII and Unicode) from what remains. Tokens emptied by stripping are dropped.
///
/// Stopwords are matched before punctuation is stripped, so `"the,"` survives
/// as `"the"`; the vectorizer's own stopword pass catches those.
pub fn normalize_document(text: &str, stopwords: &StopWords) -> String {
    text.to_lowercase()
        .split_whitespace()
        .filter(|word| !stopwords.contains(word))
        .map(strip_punctuation)
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn strip_punctuation(word: &str) -> String {
    PUNCTUATION.replace_all(word, "").into_owned()
}

/// Split text into vectorizer terms (lowercased, length >= 2, no whitespace).
pub fn tokenize_terms(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TERM_PATTERN
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Split a document into sentences of lowercase words, for embedding training.
pub fn sentences(text: &str) -> Vec<Vec<String>> {
    text.unicode_sentences()
        .map(|sentence| {
            sentence
                .unicode_words()
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
        })
        .filter(|words| !words.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stopwords(words: &[&str]) -> StopWords {
        words.iter().collect()
    }

    #[test]
    fn parse_trims_and_skips_blank_lines() {
        let sw = StopWords::parse("the\n  a \n\nof\r\n");
        assert_eq!(sw.len(), 3);
        assert!(sw.contains("the"));
        assert!(sw.contains("a"));
        assert!(sw.contains("of"));
        assert!(!sw.contains(""));
    }

    #[test]
    fn load_bundled_list() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("resources/stopwords.txt");
        let sw = StopWords::load(&path).unwrap();
        assert!(sw.contains("the"));
        assert!(!sw.contains("jaguar"));
    }

    #[test]
    fn bundled_list_matches_resource_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("resources/stopwords.txt");
        let from_file = StopWords::load(&path).unwrap();
        let bundled = StopWords::bundled();
        assert_eq!(bundled.len(), from_file.len());
        assert!(bundled.contains("the"));
    }

    #[test]
    fn load_missing_file_reports_path() {
        let err = StopWords::load(Path::new("/nonexistent/stop.txt")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/stop.txt"));
    }

    #[test]
    fn normalize_lowercases_and_drops_stopwords() {
        let sw = stopwords(&["the", "of"]);
        assert_eq!(
            normalize_document("The Price OF the Jaguar", &sw),
            "price jaguar"
        );
    }

    #[test]
    fn normalize_strips_punctuation_after_stopword_check() {
        let sw = stopwords(&["the"]);
        assert_eq!(normalize_document("the, car's (new) ...", &sw), "the cars new");
    }

    #[test]
    fn normalize_drops_tokens_emptied_by_stripping() {
        let sw = StopWords::default();
        assert_eq!(normalize_document("fast -- cars !!", &sw), "fast cars");
    }

    #[test]
    fn normalize_strips_unicode_punctuation() {
        let sw = StopWords::default();
        assert_eq!(
            normalize_document("Jaguar — “best” price… «deal»", &sw),
            "jaguar best price deal"
        );
        assert_eq!(strip_punctuation("‘car’"), "car");
    }

    #[test]
    fn tokenize_keeps_internal_punctuation_and_skips_single_chars() {
        assert_eq!(
            tokenize_terms("A e-mail to U.S office x"),
            vec!["e-mail", "to", "u.s", "office"]
        );
    }

    #[test]
    fn sentences_split_on_boundaries() {
        let s = sentences("Jaguar cars are fast. The jaguar is a cat!");
        assert_eq!(s.len(), 2);
        assert_eq!(s[0], vec!["jaguar", "cars", "are", "fast"]);
        assert_eq!(s[1][1], "jaguar");
    }
}
