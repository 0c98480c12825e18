//! Network seam used by the executor and the summary strategies.

use std::future::Future;

use capstone_api::{CapstoneClient, SummaryStatus};
use tracing::debug;

use crate::errors::SessionResult;
use crate::model::{JobId, SearchPage, Summary};

/// Search and summary endpoints the session depends on.
///
/// Implemented for [`CapstoneClient`]; tests substitute an in-memory fake.
pub trait SearchBackend: Send + Sync + 'static {
    /// One page of hits for `query`. The response may carry a summary job id.
    fn search(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> impl Future<Output = SessionResult<SearchPage>> + Send;

    /// Status of a summary job: `None` while it is still pending.
    fn poll_summary(
        &self,
        job: &JobId,
    ) -> impl Future<Output = SessionResult<Option<Summary>>> + Send;

    /// Generates a summary for `query` in a single long-running request.
    fn summarize(&self, query: &str) -> impl Future<Output = SessionResult<Summary>> + Send;
}

impl SearchBackend for CapstoneClient {
    async fn search(&self, query: &str, page: u32, per_page: u32) -> SessionResult<SearchPage> {
        let resp = CapstoneClient::search(self, query, page, per_page).await?;
        Ok(SearchPage::from(resp))
    }

    async fn poll_summary(&self, job: &JobId) -> SessionResult<Option<Summary>> {
        match self.summary_status(job.as_str()).await? {
            SummaryStatus::Pending => {
                debug!(job = %job, "summary pending");
                Ok(None)
            }
            SummaryStatus::Ready(payload) => Ok(Some(Summary::from(payload))),
        }
    }

    async fn summarize(&self, query: &str) -> SessionResult<Summary> {
        let resp = CapstoneClient::summarize(self, query).await?;
        Ok(Summary::from(resp))
    }
}
