//! Wire types for the capstone repository API.
//!
//! Field names follow the JSON the service emits; Rust-side names differ only
//! where the JSON name is a keyword (`abstract`).

use serde::{Deserialize, Serialize};

/* ==========================
Search
========================== */

/// Body of `POST /api/search`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest<'a> {
    pub text: &'a str,
}

/// Response of `POST /api/search?page&per_page`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchHit>,
    #[serde(default)]
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    /// Present when the server started a summary job for this query.
    #[serde(default, deserialize_with = "de_opt_job_id")]
    pub query_id: Option<String>,
}

/// One semantic-search match.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub authors: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    /// Cosine similarity in `0.0..=1.0`.
    pub similarity: f32,
}

/* ==========================
Summary jobs
========================== */

/// Ready payload of `GET /api/capstones/summary/{query_id}`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SummaryPayload {
    #[serde(default)]
    pub summary_text: String,
    #[serde(default)]
    pub references: Vec<SummaryReference>,
}

/// A cited capstone inside a summary.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SummaryReference {
    /// The `n` of the `[n]` marker in `summary_text`.
    pub index: u32,
    pub capstone_id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: String,
    #[serde(default)]
    pub year: Option<i32>,
}

/// Result of one status poll.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryStatus {
    /// Job still running (server answered `null` or an empty summary).
    Pending,
    /// Job finished.
    Ready(SummaryPayload),
}

/// Body of `POST /api/summarize`.
#[derive(Debug, Clone, Serialize)]
pub struct SummarizeRequest<'a> {
    pub query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k: Option<u32>,
}

/// Response of `POST /api/summarize`.
#[derive(Debug, Clone, Deserialize)]
pub struct SummarizeResponse {
    #[serde(default)]
    pub query: Option<String>,
    pub summary: String,
    #[serde(default)]
    pub used_sources: Vec<UsedSource>,
}

/// A source the direct summarizer fed to the model.
#[derive(Debug, Clone, Deserialize)]
pub struct UsedSource {
    pub index: u32,
    pub project_id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
}

/* ==========================
Resources
========================== */

/// Paginated list envelope shared by `/api/capstones` and `/api/users`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Page<T> {
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Capstone record as returned by the list and detail endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Capstone {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub external_links: Option<String>,
}

/// Fields accepted when creating or updating a capstone.
#[derive(Debug, Clone, Serialize)]
pub struct CapstoneDraft {
    pub title: String,
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    /// Comma-separated author names.
    pub authors: String,
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_link: Option<String>,
}

/// User record.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub role: String,
}

/// Fields accepted when creating a user.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub role: String,
}

/// Partial update of a user; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Response of `GET /api/users/current`; `email` is `None` when anonymous.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CurrentUser {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Response of `POST /api/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: String,
    pub data: LoginData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub access_token: String,
    /// Lifetime of the token in seconds.
    #[serde(default)]
    pub access_token_expires: f64,
    pub user: LoginUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginUser {
    pub email: String,
    pub role: String,
}

/// Plain `{ "message": ... }` acknowledgement.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub message: String,
}

/// Job ids are strings on the wire, but accept numbers too.
fn de_opt_job_id<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(d)?;
    Ok(match v {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
