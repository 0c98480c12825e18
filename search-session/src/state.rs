//! Session record and the lock-guarded resolver every deferred result goes through.
//!
//! A [`SearchSession`] tracks the current query, the latest page, the summary
//! job and two counters:
//! - `generation` advances when the query text changes and invalidates every
//!   summary job of older generations;
//! - `request_seq` advances on every search request and drops out-of-order
//!   page responses of the same query.

use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{SessionError, SessionResult};
use crate::linker::render_summary;
use crate::model::{Generation, JobId, JobState, SearchPage, Summary};
use crate::view::{SearchView, SummaryPhase};

/// Issued by [`SearchSession::begin_search`]; identifies one search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket {
    pub generation: Generation,
    pub seq: u64,
    /// The query differed from the previously recorded one.
    pub novel: bool,
}

/// Summary job bound to one generation.
#[derive(Debug, Clone)]
pub struct SummaryJob {
    id: JobId,
    generation: Generation,
    state: JobState,
    summary: Option<Summary>,
    cancel: CancellationToken,
}

impl SummaryJob {
    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }
}

/// Client-side record of the search page.
#[derive(Debug, Clone, Default)]
pub struct SearchSession {
    query: Option<String>,
    page: u32,
    results: Option<SearchPage>,
    job: Option<SummaryJob>,
    generation: Generation,
    request_seq: u64,
    summary_claimed: bool,
}

impl SearchSession {
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn results(&self) -> Option<&SearchPage> {
        self.results.as_ref()
    }

    pub fn job(&self) -> Option<&SummaryJob> {
        self.job.as_ref()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Records a new search request. A changed query opens a new generation
    /// and cancels the active summary job.
    pub fn begin_search(&mut self, query: &str, page: u32) -> SearchTicket {
        self.request_seq += 1;
        let novel = self.query.as_deref() != Some(query);

        if novel {
            self.generation = self.generation.next();
            self.cancel_job();
            self.results = None;
            self.summary_claimed = false;
            self.query = Some(query.to_string());
        }
        self.page = page;

        SearchTicket {
            generation: self.generation,
            seq: self.request_seq,
            novel,
        }
    }

    /// Whether a response for `ticket` is still the latest one issued.
    pub fn accepts(&self, ticket: &SearchTicket) -> bool {
        ticket.generation == self.generation && ticket.seq == self.request_seq
    }

    pub fn store_results(&mut self, results: SearchPage) {
        self.results = Some(results);
    }

    /// Grants the single summary acquisition of `generation`. Later calls for
    /// the same generation return `false`.
    pub fn claim_summary_slot(&mut self, generation: Generation) -> bool {
        if generation != self.generation || self.summary_claimed {
            return false;
        }
        self.summary_claimed = true;
        true
    }

    /// Installs a pending job, cancelling whatever was active, and returns the
    /// token its acquisition task must watch. `None` if `generation` is stale.
    pub fn start_job(&mut self, generation: Generation, id: JobId) -> Option<CancellationToken> {
        if generation != self.generation {
            return None;
        }
        self.cancel_job();

        let cancel = CancellationToken::new();
        self.job = Some(SummaryJob {
            id,
            generation,
            state: JobState::Pending,
            summary: None,
            cancel: cancel.clone(),
        });
        Some(cancel)
    }

    /// `true` while `id` is the active, still pending job of `generation`.
    pub fn owns_pending_job(&self, generation: Generation, id: &JobId) -> bool {
        generation == self.generation
            && self.job.as_ref().is_some_and(|j| {
                j.generation == generation
                    && &j.id == id
                    && j.state == JobState::Pending
                    && !j.cancel.is_cancelled()
            })
    }

    fn finish_job(&mut self, state: JobState, summary: Option<Summary>) {
        if let Some(job) = self.job.as_mut() {
            job.state = state;
            job.summary = summary;
            job.cancel.cancel();
        }
    }

    fn cancel_job(&mut self) {
        if let Some(job) = self.job.as_mut() {
            job.cancel.cancel();
            if job.state == JobState::Pending {
                debug!(job = %job.id, generation = %job.generation, "summary job cancelled");
                job.state = JobState::Cancelled;
            }
        }
    }
}

/* ---------------------------- shared resolver ---------------------------- */

/// Session, view and phase channel behind one lock.
///
/// Every mutation of the session and every render happen while `session` is
/// held, so a resolution can never interleave with a generation change.
pub(crate) struct Shared<V> {
    pub(crate) session: Mutex<SearchSession>,
    pub(crate) view: V,
    pub(crate) phase: watch::Sender<SummaryPhase>,
}

impl<V: SearchView> Shared<V> {
    pub(crate) fn new(view: V) -> Self {
        let (phase, _) = watch::channel(SummaryPhase::Idle);
        Self {
            session: Mutex::new(SearchSession::default()),
            view,
            phase,
        }
    }

    pub(crate) fn set_phase(&self, phase: SummaryPhase) {
        self.phase.send_replace(phase);
    }

    /// Applies the terminal outcome of a summary job, at most once.
    ///
    /// Returns `true` if the outcome was rendered; `false` when the job is no
    /// longer current or already settled.
    pub(crate) async fn resolve_summary(
        &self,
        generation: Generation,
        job: &JobId,
        outcome: SessionResult<Summary>,
    ) -> bool {
        let mut session = self.session.lock().await;
        if !session.owns_pending_job(generation, job) {
            debug!(job = %job, generation = %generation, "stale summary outcome ignored");
            return false;
        }

        match outcome {
            Ok(summary) => {
                info!(job = %job, refs = summary.references.len(), "summary ready");
                let rendered = render_summary(&summary);
                session.finish_job(JobState::Ready, Some(summary));
                self.view.show_summary(&rendered);
                self.set_phase(SummaryPhase::Ready);
                true
            }
            Err(SessionError::Cancelled) => {
                debug!(job = %job, "summary cancelled");
                session.finish_job(JobState::Cancelled, None);
                false
            }
            Err(err) => {
                let state = match err {
                    SessionError::Timeout(_) => JobState::TimedOut,
                    _ => JobState::Failed,
                };
                warn!(job = %job, error = %err, "summary failed");
                session.finish_job(state, None);
                self.view.show_summary_error(&err);
                self.set_phase(SummaryPhase::Error);
                true
            }
        }
    }
}
