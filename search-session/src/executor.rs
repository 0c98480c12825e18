//! Search executor: runs one paginated search and decides whether the query
//! opens a new summary acquisition.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::backend::SearchBackend;
use crate::config::{SessionConfig, StrategyKind};
use crate::direct::spawn_direct;
use crate::errors::SessionError;
use crate::location::{query_from_location, search_location};
use crate::model::{Generation, JobId, PageControl, page_controls};
use crate::polling::{PollSettings, spawn_polling};
use crate::state::{SearchSession, Shared};
use crate::view::{SearchView, SummaryPhase};

/// What a call to [`SearchExecutor::run_search`] ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Empty query; nothing was requested or rendered.
    Skipped,
    /// Results (or the empty-results notice) were rendered.
    Rendered {
        generation: Generation,
        page: u32,
        hits: usize,
        total: u64,
        summary_started: bool,
    },
    /// A newer search was issued before the response arrived.
    Superseded,
    /// The search failed; the results region shows the error.
    Failed(SessionError),
}

/// Coordinates searches, pagination and summary jobs over one session.
///
/// Cheap to clone; clones share the session.
pub struct SearchExecutor<B, V> {
    backend: Arc<B>,
    shared: Arc<Shared<V>>,
    cfg: SessionConfig,
}

impl<B, V> Clone for SearchExecutor<B, V> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            shared: Arc::clone(&self.shared),
            cfg: self.cfg.clone(),
        }
    }
}

impl<B: SearchBackend, V: SearchView> SearchExecutor<B, V> {
    pub fn new(backend: B, view: V, cfg: SessionConfig) -> Self {
        Self {
            backend: Arc::new(backend),
            shared: Arc::new(Shared::new(view)),
            cfg,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.cfg
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn view(&self) -> &V {
        &self.shared.view
    }

    /// Phase of the summary region; a front-end can await settlement on it.
    pub fn summary_phase(&self) -> watch::Receiver<SummaryPhase> {
        self.shared.phase.subscribe()
    }

    /// Snapshot of the session record.
    pub async fn session(&self) -> SearchSession {
        self.shared.session.lock().await.clone()
    }

    /// Runs the search for `query` at `page` (1-based; `0` is treated as `1`).
    ///
    /// A changed query starts a new generation: the previous summary job is
    /// cancelled and, if the request that opened the generation returns hits,
    /// exactly one new acquisition starts. Paging through the same query never touches the
    /// summary.
    #[instrument(skip_all, fields(page = page))]
    pub async fn run_search(&self, query: &str, page: u32) -> SearchOutcome {
        if query.is_empty() {
            debug!("empty query ignored");
            return SearchOutcome::Skipped;
        }
        let page = page.max(1);
        let view = &self.shared.view;

        let ticket = {
            let mut session = self.shared.session.lock().await;
            view.set_title(&format!("Search results for \"{query}\""));
            view.set_location(&search_location(query));
            view.show_fetching();

            let ticket = session.begin_search(query, page);
            if ticket.novel {
                info!(generation = %ticket.generation, "new query");
                view.hide_summary();
                self.shared.set_phase(SummaryPhase::Idle);
            }
            ticket
        };

        let result = self.backend.search(query, page, self.cfg.per_page).await;

        let mut session = self.shared.session.lock().await;
        if !session.accepts(&ticket) {
            debug!(seq = ticket.seq, "superseded search response dropped");
            return SearchOutcome::Superseded;
        }

        let results = match result {
            Ok(r) => r,
            Err(err) => {
                warn!(error = %err, "search failed");
                view.show_search_error(&err);
                return SearchOutcome::Failed(err);
            }
        };

        if results.hits.is_empty() {
            view.show_no_results();
        } else {
            view.show_results(query, &results);
        }
        view.show_pagination(&page_controls(query, &results));

        // Only the request that opened the generation may start its summary.
        let summary_started = ticket.novel
            && !results.hits.is_empty()
            && session.claim_summary_slot(ticket.generation)
            && self.start_summary(&mut session, ticket.generation, query, results.job_id.clone());

        let outcome = SearchOutcome::Rendered {
            generation: ticket.generation,
            page: results.page,
            hits: results.hits.len(),
            total: results.total,
            summary_started,
        };
        debug!(hits = results.hits.len(), total = results.total, "results rendered");
        session.store_results(results);
        outcome
    }

    /// Re-runs the query a page control is bound to.
    pub async fn activate(&self, control: &PageControl) -> SearchOutcome {
        self.run_search(&control.query, control.page).await
    }

    /// Runs the search a deep link points at. Locations without a `search`
    /// parameter are ignored.
    pub async fn open_location(&self, location: &str) -> SearchOutcome {
        match query_from_location(location) {
            Some(query) => self.run_search(&query, 1).await,
            None => {
                debug!(location, "location carries no query");
                SearchOutcome::Skipped
            }
        }
    }

    /// Installs the generation's summary job and spawns its acquisition.
    /// Polling needs a server job id; without one no summary is acquired.
    fn start_summary(
        &self,
        session: &mut SearchSession,
        generation: Generation,
        query: &str,
        job_id: Option<JobId>,
    ) -> bool {
        let (job, polling) = match (self.cfg.strategy, job_id) {
            (StrategyKind::Polling, Some(id)) => (id, true),
            (StrategyKind::Polling, None) => {
                debug!("no job id in response, no summary to poll");
                return false;
            }
            (StrategyKind::Direct, _) => (JobId::direct(generation), false),
        };

        let Some(cancel) = session.start_job(generation, job.clone()) else {
            return false;
        };
        self.shared.view.show_summary_loading();
        self.shared.set_phase(SummaryPhase::Loading);

        let backend = Arc::clone(&self.backend);
        let shared = Arc::clone(&self.shared);
        if polling {
            let settings = PollSettings {
                interval: self.cfg.poll_interval,
                timeout: self.cfg.job_timeout,
            };
            spawn_polling(backend, shared, settings, generation, job, cancel);
        } else {
            spawn_direct(backend, shared, generation, job, query.to_string(), cancel);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::model::JobState;
    use crate::test_support::{FakeBackend, JobScript, RecordingView, ViewEvent};

    fn executor(backend: &FakeBackend, strategy: StrategyKind) -> SearchExecutor<FakeBackend, RecordingView> {
        SearchExecutor::new(
            backend.clone(),
            RecordingView::default(),
            SessionConfig::default().with_strategy(strategy),
        )
    }

    async fn settle(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn empty_query_is_a_silent_no_op() {
        let backend = FakeBackend::default();
        let exec = executor(&backend, StrategyKind::Polling);

        assert_eq!(exec.run_search("", 1).await, SearchOutcome::Skipped);

        assert!(backend.search_calls().is_empty());
        assert!(exec.view().events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn whitespace_query_is_searched_verbatim() {
        let backend = FakeBackend::default();
        let exec = executor(&backend, StrategyKind::Polling);

        let outcome = exec.run_search(" ", 1).await;
        assert!(matches!(outcome, SearchOutcome::Rendered { .. }));
        assert_eq!(backend.search_calls(), vec![(" ".to_string(), 1)]);
        assert_eq!(exec.view().events()[0], ViewEvent::Title("Search results for \" \"".into()));

        // Novelty is whitespace-sensitive.
        let outcome = exec.run_search("  ", 1).await;
        assert!(matches!(outcome, SearchOutcome::Rendered { summary_started: true, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn renders_title_location_results_and_pagination() {
        let backend = FakeBackend::default().with_total("solar drones", 23);
        let exec = executor(&backend, StrategyKind::Polling);

        let outcome = exec.run_search("solar drones", 1).await;
        assert!(matches!(outcome, SearchOutcome::Rendered { hits: 5, total: 23, .. }));

        let events = exec.view().events();
        assert_eq!(events[0], ViewEvent::Title("Search results for \"solar drones\"".into()));
        assert_eq!(events[1], ViewEvent::Location("/?search=solar%20drones".into()));
        assert_eq!(events[2], ViewEvent::Fetching);

        let controls = exec.view().last_pagination().unwrap();
        assert_eq!(controls.len(), 5);
        assert_eq!(controls.iter().filter(|c| c.active).count(), 1);
        assert!(controls[0].active);

        exec.activate(&controls[2]).await;
        assert_eq!(backend.search_calls().last(), Some(&("solar drones".to_string(), 3)));
        let controls = exec.view().last_pagination().unwrap();
        assert!(controls[2].active);
        // Location never carries the page.
        assert_eq!(
            exec.view().last_location().as_deref(),
            Some("/?search=solar%20drones")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn zero_hits_render_notice_and_start_no_summary() {
        let backend = FakeBackend::default().with_total("nothing", 0);
        let exec = executor(&backend, StrategyKind::Polling);

        let outcome = exec.run_search("nothing", 1).await;
        assert!(matches!(
            outcome,
            SearchOutcome::Rendered { hits: 0, summary_started: false, .. }
        ));
        assert!(exec.view().events().contains(&ViewEvent::NoResults));
        assert_eq!(exec.view().last_pagination(), Some(Vec::new()));
        assert_eq!(exec.view().count(|e| matches!(e, ViewEvent::SummaryLoading)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn page_change_starts_no_second_acquisition() {
        let backend = FakeBackend::default();
        let exec = executor(&backend, StrategyKind::Polling);

        let first = exec.run_search("drones", 1).await;
        let second = exec.run_search("drones", 2).await;

        assert!(matches!(first, SearchOutcome::Rendered { summary_started: true, .. }));
        assert!(matches!(second, SearchOutcome::Rendered { summary_started: false, .. }));
        assert_eq!(exec.view().count(|e| matches!(e, ViewEvent::SummaryLoading)), 1);
        assert_eq!(exec.view().count(|e| matches!(e, ViewEvent::SummaryHidden)), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_renders_linked_summary() {
        let backend = FakeBackend::default().with_job("drones", JobScript::ready_after(3));
        let exec = executor(&backend, StrategyKind::Polling);
        let mut phase = exec.summary_phase();

        exec.run_search("drones", 1).await;
        assert_eq!(*phase.borrow_and_update(), SummaryPhase::Loading);

        settle(10_000).await;

        let summaries = exec.view().summaries();
        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].body.contains(r#"<a href="/capstone?id=7" target="_blank">[1]</a>"#));
        assert_eq!(summaries[0].references[0].href, "/capstone?id=7");
        assert_eq!(*phase.borrow(), SummaryPhase::Ready);
        assert_eq!(backend.polls("job-drones"), 3);

        let session = exec.session().await;
        assert_eq!(session.job().map(|j| j.state()), Some(JobState::Ready));
    }

    #[tokio::test(start_paused = true)]
    async fn polling_stops_after_terminal_state() {
        let backend = FakeBackend::default()
            .with_job("ready", JobScript::ready_after(2))
            .with_job("broken", JobScript::fail_after(2));
        let exec = executor(&backend, StrategyKind::Polling);

        exec.run_search("ready", 1).await;
        settle(3_000).await;
        assert_eq!(backend.polls("job-ready"), 2);
        settle(20_000).await;
        assert_eq!(backend.polls("job-ready"), 2);

        exec.run_search("broken", 1).await;
        settle(60_000).await;
        assert_eq!(backend.polls("job-broken"), 2);
        assert_eq!(exec.view().count(|e| matches!(e, ViewEvent::SummaryError(_))), 1);

        // A summary failure leaves the results alone.
        assert_eq!(exec.view().count(|e| matches!(e, ViewEvent::SearchError(_))), 0);
        let session = exec.session().await;
        assert_eq!(session.job().map(|j| j.state()), Some(JobState::Failed));
        assert!(session.results().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn job_timeout_reports_exactly_once() {
        let backend = FakeBackend::default().with_job("slow", JobScript::never());
        let exec = executor(&backend, StrategyKind::Polling);

        exec.run_search("slow", 1).await;
        settle(29_000).await;
        assert_eq!(exec.view().count(|e| matches!(e, ViewEvent::SummaryError(_))), 0);

        settle(1_500).await;
        let errors: Vec<_> = exec
            .view()
            .events()
            .into_iter()
            .filter(|e| matches!(e, ViewEvent::SummaryError(_)))
            .collect();
        assert_eq!(
            errors,
            vec![ViewEvent::SummaryError(SessionError::Timeout(Duration::from_secs(30)))]
        );
        // Polls at 0, 2s, .., 28s.
        assert_eq!(backend.polls("job-slow"), 15);

        settle(60_000).await;
        assert_eq!(backend.polls("job-slow"), 15);
        assert_eq!(exec.view().count(|e| matches!(e, ViewEvent::SummaryError(_))), 1);
        assert_eq!(
            exec.session().await.job().map(|j| j.state()),
            Some(JobState::TimedOut)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn late_poll_response_after_timeout_is_ignored() {
        // Every status request takes 7s and reports ready, so the one in
        // flight at the deadline would land after it.
        let script = JobScript::ready_after(5).with_poll_delay(Duration::from_secs(7));
        let backend = FakeBackend::default().with_job("late", script);
        let exec = executor(&backend, StrategyKind::Polling);

        exec.run_search("late", 1).await;
        settle(90_000).await;

        assert!(exec.view().summaries().is_empty());
        assert_eq!(exec.view().count(|e| matches!(e, ViewEvent::SummaryError(_))), 1);
        assert_eq!(*exec.summary_phase().borrow(), SummaryPhase::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_polling_job_is_never_rendered() {
        let backend = FakeBackend::default()
            .with_job("first", JobScript::ready_after(3))
            .with_job("second", JobScript::ready_after(1));
        let exec = executor(&backend, StrategyKind::Polling);

        exec.run_search("first", 1).await;
        settle(1_000).await;
        let old = exec.session().await;
        exec.run_search("second", 1).await;
        settle(60_000).await;

        let summaries = exec.view().summaries();
        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].body.contains("second"));
        assert_eq!(backend.polls("job-first"), 1);
        assert!(old.generation() < exec.session().await.generation());
    }

    #[tokio::test(start_paused = true)]
    async fn identical_query_keeps_ready_summary() {
        let backend = FakeBackend::default().with_job("drones", JobScript::ready_after(1));
        let exec = executor(&backend, StrategyKind::Polling);

        exec.run_search("drones", 1).await;
        settle(100).await;
        assert_eq!(*exec.summary_phase().borrow(), SummaryPhase::Ready);
        exec.view().clear();

        exec.run_search("drones", 2).await;
        exec.run_search("drones", 1).await;
        settle(10_000).await;

        assert_eq!(*exec.summary_phase().borrow(), SummaryPhase::Ready);
        assert_eq!(
            exec.view().count(|e| matches!(
                e,
                ViewEvent::SummaryHidden | ViewEvent::SummaryLoading | ViewEvent::Summary(_)
            )),
            0
        );
        assert_eq!(
            exec.session().await.job().map(|j| j.state()),
            Some(JobState::Ready)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_order_page_responses_render_latest_only() {
        let backend = FakeBackend::default()
            .with_total("drones", 30)
            .with_search_delay("drones", 1, Duration::from_millis(800))
            .with_search_delay("drones", 2, Duration::from_millis(100));
        let exec = executor(&backend, StrategyKind::Polling);

        let (first, second) = tokio::join!(exec.run_search("drones", 1), async {
            settle(10).await;
            exec.run_search("drones", 2).await
        });

        assert_eq!(first, SearchOutcome::Superseded);
        // The page change never starts a summary, even when it wins the race.
        assert!(matches!(second, SearchOutcome::Rendered { page: 2, summary_started: false, .. }));

        let pages: Vec<u32> = exec
            .view()
            .events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Results { page, .. } => Some(page),
                _ => None,
            })
            .collect();
        assert_eq!(pages, vec![2]);
        assert_eq!(exec.session().await.results().map(|r| r.page), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_query_response_is_dropped() {
        let backend = FakeBackend::default()
            .with_search_delay("old", 1, Duration::from_millis(500))
            .with_job("old", JobScript::ready_after(1))
            .with_job("new", JobScript::ready_after(1));
        let exec = executor(&backend, StrategyKind::Polling);

        let (old, new) = tokio::join!(exec.run_search("old", 1), async {
            settle(10).await;
            exec.run_search("new", 1).await
        });
        settle(5_000).await;

        assert_eq!(old, SearchOutcome::Superseded);
        assert!(matches!(new, SearchOutcome::Rendered { summary_started: true, .. }));
        assert_eq!(backend.polls("job-old"), 0);
        let summaries = exec.view().summaries();
        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].body.contains("new"));
    }

    #[tokio::test(start_paused = true)]
    async fn search_failure_renders_in_results_region() {
        let backend = FakeBackend::default().with_failing_search("broken");
        let exec = executor(&backend, StrategyKind::Polling);

        let outcome = exec.run_search("broken", 1).await;
        assert!(matches!(
            outcome,
            SearchOutcome::Failed(SessionError::ServerError { status: 500, .. })
        ));
        assert_eq!(exec.view().count(|e| matches!(e, ViewEvent::SearchError(_))), 1);
        assert_eq!(exec.view().count(|e| matches!(e, ViewEvent::SummaryLoading)), 0);
        assert_eq!(exec.view().count(|e| matches!(e, ViewEvent::SummaryError(_))), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn direct_strategy_renders_latest_query_only() {
        let backend = FakeBackend::default()
            .with_summarize_delay("first", Duration::from_secs(5))
            .with_summarize_delay("second", Duration::from_secs(1));
        let exec = executor(&backend, StrategyKind::Direct);

        exec.run_search("first", 1).await;
        settle(100).await;
        exec.run_search("second", 1).await;
        settle(10_000).await;

        let summaries = exec.view().summaries();
        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].body.contains("second"));
        assert_eq!(backend.summarize_calls(), vec!["first".to_string(), "second".to_string()]);
        assert_eq!(backend.polls("job-first"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_without_job_id_starts_no_summary() {
        let backend = FakeBackend::default().without_job_ids();
        let exec = executor(&backend, StrategyKind::Polling);

        let outcome = exec.run_search("drones", 1).await;
        settle(60_000).await;

        assert!(matches!(outcome, SearchOutcome::Rendered { summary_started: false, .. }));
        assert!(backend.summarize_calls().is_empty());
        assert!(exec.view().summaries().is_empty());
        assert_eq!(exec.view().count(|e| matches!(e, ViewEvent::SummaryLoading)), 0);
        assert_eq!(*exec.summary_phase().borrow(), SummaryPhase::Idle);
        assert!(exec.session().await.job().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn page_change_after_failed_search_starts_no_summary() {
        let backend = FakeBackend::default()
            .with_failing_search_page("drones", 1)
            .with_job("drones", JobScript::ready_after(1));
        let exec = executor(&backend, StrategyKind::Polling);

        let first = exec.run_search("drones", 1).await;
        let second = exec.run_search("drones", 2).await;
        settle(10_000).await;

        assert!(matches!(first, SearchOutcome::Failed(_)));
        assert!(matches!(second, SearchOutcome::Rendered { page: 2, summary_started: false, .. }));
        assert_eq!(backend.polls("job-drones"), 0);
        assert_eq!(exec.view().count(|e| matches!(e, ViewEvent::SummaryLoading)), 0);
        assert!(exec.view().summaries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn open_location_runs_deep_linked_query() {
        let backend = FakeBackend::default();
        let exec = executor(&backend, StrategyKind::Polling);

        exec.open_location("/?search=solar%20drones").await;
        assert_eq!(exec.open_location("/about").await, SearchOutcome::Skipped);

        assert_eq!(backend.search_calls(), vec![("solar drones".to_string(), 1)]);
        assert_eq!(exec.session().await.query(), Some("solar drones"));
    }
}
