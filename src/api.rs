use std::time::Duration;

use serde::Deserialize;

/// Discord REST API base.
pub const DEFAULT_BASE_URL: &str = "https://discord.com/api/v9";

/// Messages requested per search page.
pub const PAGE_SIZE: usize = 25;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 5;
const USER_AGENT: &str = "Mozilla/5.0";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAuthor {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub discriminator: Option<String>,
}

/// One message object as returned by the search endpoint. Every field is
/// optional; absent fields get display defaults downstream.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub author: Option<RawAuthor>,
    #[serde(default)]
    pub content: Option<String>,
}

/// One page of search results. Each entry in `messages` is a tuple-like
/// array whose first element is the matching message; the rest is
/// surrounding context and is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub messages: Vec<Vec<RawMessage>>,
    #[serde(default)]
    pub total_results: Option<u64>,
}

/// Blocking client for the guild message-search endpoint.
pub struct SearchClient {
    http: reqwest::blocking::Client,
    base_url: String,
    token: String,
}

impl SearchClient {
    /// Build a client against the live Discord API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(token: &str) -> anyhow::Result<Self> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Build a client against an arbitrary base URL (used by tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn with_base_url(token: &str, base_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| anyhow::anyhow!("could not build HTTP client: {e}"))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Fetch one page of search results for `query` in `guild_id`,
    /// skipping the first `offset` matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is unreachable, responds with a
    /// non-success status (the error includes the server's JSON payload when
    /// the body parses, else the raw text), or the body cannot be decoded.
    pub fn fetch_page(
        &self,
        guild_id: &str,
        query: &str,
        offset: usize,
    ) -> anyhow::Result<SearchPage> {
        let url = format!("{}/guilds/{guild_id}/messages/search", self.base_url);
        let limit = PAGE_SIZE.to_string();
        let offset = offset.to_string();
        let resp = self
            .http
            .get(&url)
            .header("Authorization", &self.token)
            .query(&[
                ("content", query),
                ("include_nsfw", "true"),
                ("limit", limit.as_str()),
                ("offset", offset.as_str()),
            ])
            .send()
            .map_err(|e| anyhow::anyhow!("could not reach {url}: {e}"))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp
                .text()
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            // Rate-limit and permission errors come back as JSON; surface the
            // structured payload when there is one.
            if let Ok(payload) = serde_json::from_str::<serde_json::Value>(&text) {
                anyhow::bail!("search returned HTTP {status}: {payload}");
            }
            anyhow::bail!("search returned HTTP {status}: {text}");
        }

        resp.json::<SearchPage>()
            .map_err(|e| anyhow::anyhow!("invalid response from search endpoint: {e}"))
    }
}
