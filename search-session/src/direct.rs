//! Summary acquisition through one long-running summarize request.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::backend::SearchBackend;
use crate::model::{Generation, JobId};
use crate::state::Shared;
use crate::view::SearchView;

/// Spawns the summarize request for `query`. Cancelling `cancel` drops the
/// in-flight request; its response is never rendered.
pub(crate) fn spawn_direct<B, V>(
    backend: Arc<B>,
    shared: Arc<Shared<V>>,
    generation: Generation,
    job: JobId,
    query: String,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    B: SearchBackend,
    V: SearchView,
{
    tokio::spawn(async move {
        info!(job = %job, "direct summary requested");
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(job = %job, "direct summary superseded");
                return;
            }
            outcome = backend.summarize(&query) => outcome,
        };
        shared.resolve_summary(generation, &job, outcome).await;
    })
}
