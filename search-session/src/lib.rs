//! Coordination core of the capstone search page.
//!
//! A [`SearchExecutor`] owns one [`SearchSession`] and renders into a
//! [`SearchView`]. Each search request is tagged with the session generation
//! (bumped when the query text changes) and a request sequence number; every
//! deferred result re-checks both under the session lock before it may touch
//! the view. Summary acquisition runs as a spawned task per generation, either
//! by polling a job status endpoint or through one direct summarize request,
//! and is cancelled through a `CancellationToken` when the query changes.

mod backend;
mod config;
mod debounce;
mod direct;
mod errors;
mod executor;
mod linker;
mod location;
mod model;
mod polling;
mod state;
mod view;

#[cfg(test)]
mod test_support;

pub use backend::SearchBackend;
pub use config::{SessionConfig, StrategyKind};
pub use debounce::{DEFAULT_DEBOUNCE, Debouncer};
pub use errors::{SessionError, SessionResult};
pub use executor::{SearchExecutor, SearchOutcome};
pub use linker::{RenderedReference, RenderedSummary, capstone_href, link_citations, render_summary};
pub use location::{query_from_location, search_location};
pub use model::{
    Generation, Hit, JobId, JobState, PageControl, Reference, SearchPage, Summary, page_controls,
    total_pages, truncate_words,
};
pub use polling::PollSettings;
pub use state::{SearchSession, SearchTicket, SummaryJob};
pub use view::{SearchView, SummaryPhase};
