//! Domain model shared by the executor, the summary strategies and views.

use std::fmt;

use capstone_api::types::{SearchResponse, SummarizeResponse};
use capstone_api::{SummaryPayload, SummaryReference};

/// One search match.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: i64,
    pub title: String,
    /// Abstract or snippet text, untruncated.
    pub snippet: String,
    /// Cosine similarity in `0.0..=1.0`.
    pub similarity: f32,
}

impl Hit {
    /// Similarity as a whole percentage, the way result cards show it.
    pub fn similarity_percent(&self) -> u32 {
        (self.similarity.clamp(0.0, 1.0) * 100.0).round() as u32
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    pub hits: Vec<Hit>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    /// Summary job the server started for this query, if any.
    pub job_id: Option<JobId>,
}

impl SearchPage {
    /// `ceil(total / per_page)`; zero when either side is zero.
    pub fn total_pages(&self) -> u32 {
        total_pages(self.total, self.per_page)
    }
}

impl From<SearchResponse> for SearchPage {
    fn from(r: SearchResponse) -> Self {
        Self {
            hits: r
                .results
                .into_iter()
                .map(|h| Hit {
                    id: h.id,
                    title: h.title,
                    snippet: h.abstract_text.unwrap_or_default(),
                    similarity: h.similarity,
                })
                .collect(),
            page: r.page,
            per_page: r.per_page,
            total: r.total,
            job_id: r.query_id.map(JobId),
        }
    }
}

/// `ceil(total / per_page)`; zero when either side is zero.
pub fn total_pages(total: u64, per_page: u32) -> u32 {
    if per_page == 0 {
        return 0;
    }
    u32::try_from(total.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX)
}

/// A page selector entry, bound to the query it re-runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageControl {
    pub query: String,
    pub page: u32,
    pub active: bool,
}

/// Builds the selector for every page of `results`, marking the current one.
pub fn page_controls(query: &str, results: &SearchPage) -> Vec<PageControl> {
    (1..=results.total_pages())
        .map(|page| PageControl {
            query: query.to_string(),
            page,
            active: page == results.page,
        })
        .collect()
}

/// Shortens `text` to `max_words` whitespace-separated words, appending `...`.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split(' ').collect();
    if words.len() > max_words {
        format!("{}...", words[..max_words].join(" "))
    } else {
        text.to_string()
    }
}

/// Opaque, server-assigned summary job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(pub String);

impl JobId {
    /// Local id for a direct summarize request of the given generation.
    pub fn direct(generation: Generation) -> Self {
        Self(format!("direct-{}", generation.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monotonic counter identifying one query's lifetime in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

impl Generation {
    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a summary job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Ready,
    Failed,
    Cancelled,
    TimedOut,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobState::Pending)
    }
}

/// A cited entity inside a summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub citation_index: u32,
    pub target_id: i64,
    pub title: String,
    pub authors: String,
    pub year: Option<i32>,
}

/// Generated summary text plus the references its `[n]` markers point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub body: String,
    pub references: Vec<Reference>,
}

impl From<SummaryReference> for Reference {
    fn from(r: SummaryReference) -> Self {
        Self {
            citation_index: r.index,
            target_id: r.capstone_id,
            title: r.title,
            authors: r.authors,
            year: r.year,
        }
    }
}

impl From<SummaryPayload> for Summary {
    fn from(p: SummaryPayload) -> Self {
        Self {
            body: p.summary_text,
            references: p.references.into_iter().map(Reference::from).collect(),
        }
    }
}

impl From<SummarizeResponse> for Summary {
    fn from(r: SummarizeResponse) -> Self {
        Self {
            body: r.summary,
            references: r
                .used_sources
                .into_iter()
                .map(|s| Reference {
                    citation_index: s.index,
                    target_id: s.project_id,
                    title: s.title,
                    authors: String::new(),
                    year: s.year,
                })
                .collect(),
        }
    }
}
