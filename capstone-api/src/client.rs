//! Thin HTTP client for the capstone repository API.
//!
//! Endpoints used by the search page:
//!   * POST /api/search?page={page}&per_page={per_page}
//!   * GET  /api/capstones/summary/{query_id}
//!   * POST /api/summarize
//!
//! The capstone/user/auth resources live in [`crate::resources`] as a second
//! `impl` block over the same client.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, header};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::config::ApiConfig;
use crate::errors::{ApiResult, CapstoneApiError, ConfigError};
use crate::types::{
    SearchRequest, SearchResponse, SummarizeRequest, SummarizeResponse, SummaryPayload,
    SummaryStatus,
};

/// Reusable client bound to one service base URL.
///
/// Cheap to clone: the underlying `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct CapstoneClient {
    http: Client,
    base: String,
    token: Option<String>,
}

impl CapstoneClient {
    /// Creates a client from the given config.
    ///
    /// # Errors
    /// - [`ConfigError::InvalidFormat`] if `cfg.base_url` is not http(s)
    /// - [`CapstoneApiError::Network`] if the HTTP client cannot be built
    pub fn new(cfg: ApiConfig) -> ApiResult<Self> {
        let base = cfg.base_url.trim();
        if base.is_empty() || !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::InvalidFormat {
                var: "base_url",
                reason: "must start with http:// or https://",
            }
            .into());
        }

        let http = Client::builder()
            .user_agent("capstone-search/0.1")
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .gzip(true)
            .build()?;

        debug!(base_url = %base, has_token = cfg.token.is_some(), "CapstoneClient initialized");

        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
            token: cfg.token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Service base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// Returns a copy of this client that sends `token` with every request.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            http: self.http.clone(),
            base: self.base.clone(),
            token: Some(token.into()),
        }
    }

    /// Fetches one page of semantic-search results for `text`.
    ///
    /// The response carries a `query_id` when the server started a summary
    /// job for this query.
    ///
    /// # Errors
    /// - [`CapstoneApiError::HttpStatus`] for non-2xx responses
    /// - [`CapstoneApiError::Network`] / [`CapstoneApiError::Timeout`] for transport failures
    /// - [`CapstoneApiError::Decode`] if the body cannot be parsed
    #[instrument(skip_all, fields(page = page, per_page = per_page))]
    pub async fn search(&self, text: &str, page: u32, per_page: u32) -> ApiResult<SearchResponse> {
        let url = format!("{}/api/search?page={page}&per_page={per_page}", self.base);
        debug!("POST {}", url);
        let req = self.http.post(&url).json(&SearchRequest { text });
        self.send_json(req, url).await
    }

    /// Polls the status of a summary job.
    ///
    /// A `null` body or an empty `summary_text` means the job is still running.
    ///
    /// # Errors
    /// Any non-2xx status is an error; the caller treats it as job failure.
    #[instrument(skip_all, fields(query_id = %query_id))]
    pub async fn summary_status(&self, query_id: &str) -> ApiResult<SummaryStatus> {
        let url = format!(
            "{}/api/capstones/summary/{}",
            self.base,
            urlencoding::encode(query_id)
        );
        debug!("GET {}", url);
        let body = self.send_checked(self.http.get(&url), url).await?.text().await?;
        if body.trim().is_empty() {
            return Ok(SummaryStatus::Pending);
        }
        let payload: Option<SummaryPayload> = serde_json::from_str(&body)
            .map_err(|e| CapstoneApiError::Decode(format!("serde error: {e}")))?;

        Ok(match payload {
            Some(p) if !p.summary_text.trim().is_empty() => SummaryStatus::Ready(p),
            _ => SummaryStatus::Pending,
        })
    }

    /// Runs the synchronous summarizer for `query` and waits for its answer.
    ///
    /// This keeps one request open for the whole LLM run; callers that need
    /// to abandon it simply drop the returned future.
    #[instrument(skip_all)]
    pub async fn summarize(&self, query: &str) -> ApiResult<SummarizeResponse> {
        let url = format!("{}/api/summarize", self.base);
        debug!("POST {}", url);
        let req = self.http.post(&url).json(&SummarizeRequest { query, k: None });
        self.send_json(req, url).await
    }

    /* --------------------- Internals --------------------- */

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Sends the request with the credential attached and decodes a JSON body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        url: String,
    ) -> ApiResult<T> {
        let resp = self.send_checked(req, url).await?;
        resp.json::<T>()
            .await
            .map_err(|e| CapstoneApiError::Decode(format!("serde error: {e}")))
    }

    /// Sends the request and turns non-2xx statuses into errors.
    pub(crate) async fn send_checked(&self, req: RequestBuilder, url: String) -> ApiResult<Response> {
        let req = match &self.token {
            Some(t) => req.header(header::AUTHORIZATION, format!("Bearer {t}")),
            None => req,
        };

        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_default();
        warn!(%url, %status, "request returned non-success status");
        Err(CapstoneApiError::from_status(status, url, &text))
    }
}
