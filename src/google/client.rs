use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use super::types::{ApiError, SearchItem, SearchResponse};

const API_BASE: &str = "https://www.googleapis.com";
/// The Custom Search API caps a single page at ten results.
const RESULTS_PER_PAGE: u8 = 10;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("missing {0}: pass it as an option or set the environment variable")]
    MissingCredential(&'static str),

    #[error("API rate limit exceeded. Please retry later.")]
    RateLimited,

    #[error("API quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Abstraction over the web search backend.
/// Implemented by `GoogleClient` for production; mock implementations used in tests.
pub trait SearchClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchItem>, SearchError>;
}

#[derive(Clone)]
struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Client for the Custom Search JSON API. One request per call, no retries.
#[derive(Debug, Clone)]
pub struct GoogleClient {
    http: Client,
    api_key: ApiKey,
    engine_id: String,
    base_url: String,
    timeout: Duration,
}

impl GoogleClient {
    pub fn new(http: Client, api_key: &str, engine_id: &str) -> Result<Self, SearchError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(SearchError::MissingCredential("API key"));
        }
        let engine_id = engine_id.trim();
        if engine_id.is_empty() {
            return Err(SearchError::MissingCredential("search engine ID"));
        }
        Ok(Self {
            http,
            api_key: ApiKey(api_key.to_string()),
            engine_id: engine_id.to_string(),
            base_url: API_BASE.to_string(),
            timeout: REQUEST_TIMEOUT,
        })
    }

    pub fn engine_id(&self) -> &str {
        &self.engine_id
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey("test-key".to_string()),
            engine_id: "test-engine".to_string(),
            base_url: base_url.to_string(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn request_url(&self, query: &str) -> Result<Url, SearchError> {
        let num = RESULTS_PER_PAGE.to_string();
        let url = Url::parse_with_params(
            &format!("{}/customsearch/v1", self.base_url),
            [
                ("key", self.api_key.0.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ],
        )?;
        Ok(url)
    }
}

impl SearchClient for GoogleClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchItem>, SearchError> {
        let url = self.request_url(query)?;

        debug_assert!(
            url.scheme() == "https" || cfg!(test),
            "API key must only be sent over HTTPS"
        );

        let response = self
            .http
            .get(url)
            .header("User-Agent", crate::USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Custom Search API rate limited");
            return Err(SearchError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if let Ok(body) = serde_json::from_str::<SearchResponse>(&text)
                && let Some(err) = &body.error
            {
                let classified = classify_api_error(err);
                warn!(error = %classified, "Custom Search API error");
                return Err(classified);
            }
            let end = text.floor_char_boundary(200);
            warn!(status = %status, "Custom Search API error (no structured body)");
            return Err(SearchError::Api {
                code: status.as_u16(),
                message: format!("HTTP {status}: {}", &text[..end]),
            });
        }

        let text = response.text().await?;
        let body: SearchResponse =
            serde_json::from_str(&text).map_err(|e| SearchError::Api {
                code: status.as_u16(),
                message: format!("invalid response body: {e}"),
            })?;
        if let Some(err) = &body.error {
            let classified = classify_api_error(err);
            warn!(error = %classified, "Custom Search API error in 200 response");
            return Err(classified);
        }

        debug!(query, results = body.items.len(), "search complete");
        Ok(body.items)
    }
}

fn classify_api_error(err: &ApiError) -> SearchError {
    let message = err
        .message
        .clone()
        .unwrap_or_else(|| "Unknown error".to_string());

    match err.code {
        Some(429) => SearchError::RateLimited,
        Some(403) => SearchError::QuotaExhausted(message),
        Some(code) => SearchError::Api { code, message },
        None => SearchError::Api {
            code: 0,
            message: format!("Unknown error (no status code): {message}"),
        },
    }
}
