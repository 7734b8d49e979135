//! Semantic Scholar Graph API client for TLDR lookups.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

use super::{EnrichError, TldrLookup, TldrSource};

const SEMANTIC_API_BASE: &str = "https://api.semanticscholar.org/graph/v1";

/// Search-by-title client against the Semantic Scholar Graph API.
///
/// One GET per lookup, requesting the single top match with its `tldr`
/// and `abstract` fields. Works without an API key at a lower rate limit.
#[derive(Debug, Clone)]
pub struct SemanticScholarClient {
    client: Client,
    api_key: Option<String>,
}

impl SemanticScholarClient {
    /// Create a client, optionally carrying an API key.
    pub fn new(api_key: Option<String>) -> Result<Self, EnrichError> {
        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| EnrichError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, api_key })
    }
}

#[async_trait]
impl TldrSource for SemanticScholarClient {
    async fn lookup(&self, title: &str) -> Result<TldrLookup, EnrichError> {
        let url = format!(
            "{}/paper/search?query={}&fields=tldr,abstract&limit=1",
            SEMANTIC_API_BASE,
            urlencoding::encode(title)
        );

        let mut request = self.client.get(&url);
        if let Some(ref key) = self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EnrichError::Network(format!("failed to query Semantic Scholar: {}", e)))?;

        // A non-success status is a miss, not an error: the record stays
        // unenriched and retryable on a future run.
        if !response.status().is_success() {
            warn!(
                status = %response.status(),
                "Semantic Scholar returned non-success status, treating as miss"
            );
            return Ok(TldrLookup::default());
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| EnrichError::Parse(format!("failed to parse JSON: {}", e)))?;

        if body.total == 0 {
            return Ok(TldrLookup::default());
        }

        let tldr = body
            .data
            .into_iter()
            .next()
            .and_then(|m| m.tldr)
            .and_then(|t| t.text)
            .filter(|t| !t.is_empty());

        Ok(TldrLookup { tldr })
    }
}

// ===== Semantic Scholar API types =====

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    data: Vec<SearchMatch>,
}

#[derive(Debug, Deserialize)]
struct SearchMatch {
    tldr: Option<TldrField>,
}

#[derive(Debug, Deserialize)]
struct TldrField {
    text: Option<String>,
}
