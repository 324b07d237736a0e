use std::path::PathBuf;

use clap::Parser;

use crate::expansion::{CandidateSource, ExpansionOptions, TieBreak};
use crate::refine::SessionConfig;

/// Refine a web search query with relevance feedback until the results reach
/// a target precision.
#[derive(Debug, Parser)]
#[command(name = "refine", version, about)]
pub struct Cli {
    /// Target precision for the top ten results, in (0, 1]
    #[arg(value_parser = parse_precision)]
    pub precision: f64,

    /// Initial search query
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Custom Search JSON API key
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Programmable Search Engine ID
    #[arg(long, env = "GOOGLE_ENGINE_ID")]
    pub engine_id: String,

    /// Newline-delimited stopword list [default: built-in English list]
    #[arg(long)]
    pub stopwords: Option<PathBuf>,

    /// How to order candidate terms that share a weight
    #[arg(long, value_enum, default_value_t = TieBreak::Lexical)]
    pub tie_break: TieBreak,

    /// Which terms are considered for expansion
    #[arg(long, value_enum, default_value_t = CandidateSource::Vocabulary)]
    pub candidates: CandidateSource,

    /// Weigh terms over a corpus that also contains the query
    #[arg(long)]
    pub include_query: bool,

    /// Give up after this many search rounds
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_rounds: Option<u32>,
}

impl Cli {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            query: self.query.join(" "),
            target_precision: self.precision,
            max_rounds: self.max_rounds,
        }
    }

    pub fn expansion_options(&self) -> ExpansionOptions {
        ExpansionOptions {
            tie_break: self.tie_break,
            candidates: self.candidates,
            include_query: self.include_query,
            ..ExpansionOptions::default()
        }
    }
}

fn parse_precision(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(format!("precision must be in (0, 1], got {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        let base = ["refine", "--api-key", "k", "--engine-id", "cx"];
        Cli::try_parse_from(base.iter().chain(args))
    }

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn joins_query_words() {
        let cli = parse(&["0.9", "per", "se"]).unwrap();
        let config = cli.session_config();
        assert_eq!(config.query, "per se");
        assert_eq!(config.target_precision, 0.9);
        assert_eq!(config.max_rounds, None);
        assert_eq!(cli.stopwords, None);
    }

    #[test]
    fn defaults_to_lexical_vocabulary_expansion() {
        let options = parse(&["0.5", "jaguar"]).unwrap().expansion_options();
        assert_eq!(options.tie_break, TieBreak::Lexical);
        assert_eq!(options.candidates, CandidateSource::Vocabulary);
        assert!(!options.include_query);
    }

    #[test]
    fn parses_expansion_flags() {
        let cli = parse(&[
            "--tie-break",
            "semantic",
            "--candidates",
            "most-similar",
            "--include-query",
            "--max-rounds",
            "3",
            "0.7",
            "jaguar",
        ])
        .unwrap();
        let options = cli.expansion_options();
        assert_eq!(options.tie_break, TieBreak::Semantic);
        assert_eq!(options.candidates, CandidateSource::MostSimilarDocument);
        assert!(options.include_query);
        assert_eq!(cli.session_config().max_rounds, Some(3));
    }

    #[test]
    fn rejects_out_of_range_precision() {
        assert!(parse(&["1.5", "jaguar"]).is_err());
        assert!(parse(&["0", "jaguar"]).is_err());
        assert!(parse(&["abc", "jaguar"]).is_err());
    }

    #[test]
    fn rejects_zero_max_rounds() {
        let err = parse(&["--max-rounds", "0", "0.9", "jaguar"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn accepts_stopword_path() {
        let cli = parse(&["--stopwords", "/tmp/stop.txt", "0.9", "jaguar"]).unwrap();
        assert_eq!(cli.stopwords, Some(PathBuf::from("/tmp/stop.txt")));
    }

    #[test]
    fn requires_a_query() {
        assert!(parse(&["0.9"]).is_err());
    }
}
