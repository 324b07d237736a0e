mod cli;
mod expansion;
mod feedback;
mod google;
mod refine;

pub const USER_AGENT: &str = concat!("refine/", env!("CARGO_PKG_VERSION"));

use std::io::{self, Write};
use std::time::Duration;

use clap::Parser;
use reqwest::Client;
use tracing::{info, warn};

use cli::Cli;
use expansion::{Expander, StopWords};
use feedback::ConsoleJudge;
use google::GoogleClient;
use refine::Session;
use refine::format::{Parameters, format_parameters};

/// TCP connection establishment timeout. The whole-request deadline is set
/// per request by `GoogleClient`.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Added on top of `RUST_LOG`.
const LOG_DIRECTIVE: &str = "refine=info";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(LOG_DIRECTIVE.parse()?),
        )
        .init();

    let cli = Cli::parse();

    let stopwords = match &cli.stopwords {
        Some(path) => {
            let stopwords = StopWords::load(path)?;
            if stopwords.is_empty() {
                warn!(path = %path.display(), "stopword list is empty");
            }
            stopwords
        }
        None => StopWords::bundled(),
    };
    let expander = Expander::new(stopwords, cli.expansion_options());

    let http = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
    let google = GoogleClient::new(http, &cli.api_key, &cli.engine_id)?;

    let config = cli.session_config();
    let mut stdout = io::stdout();
    write!(
        stdout,
        "{}",
        format_parameters(&Parameters {
            engine_id: google.engine_id(),
            query: &config.query,
            target_precision: config.target_precision,
        })
    )?;

    info!(options = ?expander.options(), "starting refinement session");
    let mut judge = ConsoleJudge::stdio();
    let report = Session::new(config, stdout)
        .run(&google, &mut judge, &expander)
        .await
        .inspect_err(|e| tracing::error!("session failed: {e}"))?;

    info!(outcome = ?report.outcome, rounds = report.rounds.len(), query = %report.query, "session finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::Directive;

    #[test]
    fn default_log_directive_targets_this_crate_at_info() {
        let directive: Directive = LOG_DIRECTIVE.parse().unwrap();
        assert_eq!(directive.to_string(), format!("{}=info", env!("CARGO_PKG_NAME")));
    }
}
