//! Rendering seam between the coordination core and a front-end.

use crate::errors::SessionError;
use crate::linker::RenderedSummary;
use crate::model::{PageControl, SearchPage};

/// Phase of the summary region, published on a watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

impl SummaryPhase {
    /// `true` once the region can no longer change without a new query.
    pub fn is_settled(self) -> bool {
        matches!(self, SummaryPhase::Ready | SummaryPhase::Error)
    }
}

/// The regions a search page renders into.
///
/// Calls are made while the session lock is held, so implementations must not
/// call back into the executor synchronously.
pub trait SearchView: Send + Sync + 'static {
    /// Page title, `Search results for "<query>"`.
    fn set_title(&self, title: &str);

    /// Shareable location, `/?search=<query>`.
    fn set_location(&self, location: &str);

    /// Replaces the results region with a placeholder and clears the page selector.
    fn show_fetching(&self);

    fn show_results(&self, query: &str, results: &SearchPage);

    /// Results region shows `No results found.`.
    fn show_no_results(&self);

    fn show_pagination(&self, controls: &[PageControl]);

    fn show_search_error(&self, error: &SessionError);

    fn hide_summary(&self);

    fn show_summary_loading(&self);

    fn show_summary(&self, summary: &RenderedSummary);

    /// Static failure affordance. No retry is offered.
    fn show_summary_error(&self, error: &SessionError);
}
