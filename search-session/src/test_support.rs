//! In-memory backend and recording view for the executor tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::backend::SearchBackend;
use crate::errors::{SessionError, SessionResult};
use crate::linker::RenderedSummary;
use crate::model::{Hit, JobId, PageControl, Reference, SearchPage, Summary};
use crate::view::SearchView;

const DEFAULT_TOTAL: u64 = 12;

/// How a scripted summary job answers status polls.
#[derive(Debug, Clone, Default)]
pub(crate) struct JobScript {
    ready_after: Option<u32>,
    fail_after: Option<u32>,
    poll_delay: Duration,
}

impl JobScript {
    /// Ready on the `n`-th poll.
    pub(crate) fn ready_after(n: u32) -> Self {
        Self {
            ready_after: Some(n),
            ..Self::default()
        }
    }

    /// Fails on the `n`-th poll.
    pub(crate) fn fail_after(n: u32) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::default()
        }
    }

    pub(crate) fn never() -> Self {
        Self::default()
    }

    pub(crate) fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }
}

#[derive(Debug, Default)]
struct FakeState {
    totals: HashMap<String, u64>,
    search_delays: HashMap<(String, u32), Duration>,
    failing: Vec<String>,
    failing_pages: Vec<(String, u32)>,
    no_job_ids: bool,
    jobs: HashMap<String, JobScript>,
    summarize_delays: HashMap<String, Duration>,

    search_calls: Vec<(String, u32)>,
    polls: HashMap<String, u32>,
    summarize_calls: Vec<String>,
}

/// Scriptable backend; clones share state so tests can inspect call counts.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

fn job_key(query: &str) -> String {
    format!("job-{query}")
}

fn summary_for(query: &str) -> Summary {
    Summary {
        body: format!("Projects about {query} [1], see also [2]."),
        references: vec![Reference {
            citation_index: 1,
            target_id: 7,
            title: format!("{query} capstone"),
            authors: "A. Author".into(),
            year: Some(2024),
        }],
    }
}

impl FakeBackend {
    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub(crate) fn with_total(self, query: &str, total: u64) -> Self {
        self.lock().totals.insert(query.into(), total);
        self
    }

    pub(crate) fn with_search_delay(self, query: &str, page: u32, delay: Duration) -> Self {
        self.lock().search_delays.insert((query.into(), page), delay);
        self
    }

    pub(crate) fn with_failing_search(self, query: &str) -> Self {
        self.lock().failing.push(query.into());
        self
    }

    pub(crate) fn with_failing_search_page(self, query: &str, page: u32) -> Self {
        self.lock().failing_pages.push((query.into(), page));
        self
    }

    pub(crate) fn without_job_ids(self) -> Self {
        self.lock().no_job_ids = true;
        self
    }

    pub(crate) fn with_job(self, query: &str, script: JobScript) -> Self {
        self.lock().jobs.insert(job_key(query), script);
        self
    }

    pub(crate) fn with_summarize_delay(self, query: &str, delay: Duration) -> Self {
        self.lock().summarize_delays.insert(query.into(), delay);
        self
    }

    pub(crate) fn search_calls(&self) -> Vec<(String, u32)> {
        self.lock().search_calls.clone()
    }

    pub(crate) fn polls(&self, job: &str) -> u32 {
        self.lock().polls.get(job).copied().unwrap_or(0)
    }

    pub(crate) fn summarize_calls(&self) -> Vec<String> {
        self.lock().summarize_calls.clone()
    }
}

impl SearchBackend for FakeBackend {
    async fn search(&self, query: &str, page: u32, per_page: u32) -> SessionResult<SearchPage> {
        let (delay, fails, total, no_job_ids) = {
            let mut s = self.lock();
            s.search_calls.push((query.to_string(), page));
            (
                s.search_delays.get(&(query.to_string(), page)).copied(),
                s.failing.iter().any(|q| q == query)
                    || s.failing_pages.iter().any(|(q, p)| q == query && *p == page),
                s.totals.get(query).copied().unwrap_or(DEFAULT_TOTAL),
                s.no_job_ids,
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fails {
            return Err(SessionError::ServerError {
                status: 500,
                message: "search backend unavailable".into(),
            });
        }

        let start = u64::from(page.saturating_sub(1)) * u64::from(per_page);
        let end = (start + u64::from(per_page)).min(total);
        let hits = (start..end)
            .map(|i| Hit {
                id: i as i64 + 1,
                title: format!("{query} #{}", i + 1),
                snippet: "An abstract.".into(),
                similarity: 0.9,
            })
            .collect();

        Ok(SearchPage {
            hits,
            page,
            per_page,
            total,
            job_id: (!no_job_ids).then(|| JobId(job_key(query))),
        })
    }

    async fn poll_summary(&self, job: &JobId) -> SessionResult<Option<Summary>> {
        let (n, script) = {
            let mut s = self.lock();
            let n = {
                let count = s.polls.entry(job.0.clone()).or_insert(0);
                *count += 1;
                *count
            };
            (n, s.jobs.get(&job.0).cloned().unwrap_or_default())
        };
        if !script.poll_delay.is_zero() {
            tokio::time::sleep(script.poll_delay).await;
        }

        if script.fail_after.is_some_and(|k| n >= k) {
            return Err(SessionError::ServerError {
                status: 500,
                message: "summary generation failed".into(),
            });
        }
        if script.ready_after.is_some_and(|k| n >= k) {
            let query = job.0.trim_start_matches("job-");
            return Ok(Some(summary_for(query)));
        }
        Ok(None)
    }

    async fn summarize(&self, query: &str) -> SessionResult<Summary> {
        let delay = {
            let mut s = self.lock();
            s.summarize_calls.push(query.to_string());
            s.summarize_delays.get(query).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(summary_for(query))
    }
}

/* ------------------------------ recording view ----------------------------- */

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ViewEvent {
    Title(String),
    Location(String),
    Fetching,
    Results { query: String, page: u32, ids: Vec<i64> },
    NoResults,
    Pagination(Vec<PageControl>),
    SearchError(SessionError),
    SummaryHidden,
    SummaryLoading,
    Summary(RenderedSummary),
    SummaryError(SessionError),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingView {
    events: Arc<Mutex<Vec<ViewEvent>>>,
}

impl RecordingView {
    fn push(&self, e: ViewEvent) {
        self.events.lock().unwrap().push(e);
    }

    pub(crate) fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub(crate) fn count(&self, pred: impl Fn(&ViewEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }

    pub(crate) fn summaries(&self) -> Vec<RenderedSummary> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Summary(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn last_pagination(&self) -> Option<Vec<PageControl>> {
        self.events().into_iter().rev().find_map(|e| match e {
            ViewEvent::Pagination(c) => Some(c),
            _ => None,
        })
    }

    pub(crate) fn last_location(&self) -> Option<String> {
        self.events().into_iter().rev().find_map(|e| match e {
            ViewEvent::Location(l) => Some(l),
            _ => None,
        })
    }
}

impl SearchView for RecordingView {
    fn set_title(&self, title: &str) {
        self.push(ViewEvent::Title(title.into()));
    }

    fn set_location(&self, location: &str) {
        self.push(ViewEvent::Location(location.into()));
    }

    fn show_fetching(&self) {
        self.push(ViewEvent::Fetching);
    }

    fn show_results(&self, query: &str, results: &SearchPage) {
        self.push(ViewEvent::Results {
            query: query.into(),
            page: results.page,
            ids: results.hits.iter().map(|h| h.id).collect(),
        });
    }

    fn show_no_results(&self) {
        self.push(ViewEvent::NoResults);
    }

    fn show_pagination(&self, controls: &[PageControl]) {
        self.push(ViewEvent::Pagination(controls.to_vec()));
    }

    fn show_search_error(&self, error: &SessionError) {
        self.push(ViewEvent::SearchError(error.clone()));
    }

    fn hide_summary(&self) {
        self.push(ViewEvent::SummaryHidden);
    }

    fn show_summary_loading(&self) {
        self.push(ViewEvent::SummaryLoading);
    }

    fn show_summary(&self, summary: &RenderedSummary) {
        self.push(ViewEvent::Summary(summary.clone()));
    }

    fn show_summary_error(&self, error: &SessionError) {
        self.push(ViewEvent::SummaryError(error.clone()));
    }
}
