//! Summary acquisition by polling the job status endpoint.
//!
//! The loop polls immediately, then once per interval, until the job is
//! ready, a poll fails, the job deadline passes, or its token is cancelled.
//! The deadline is raced against in-flight polls too, so a slow status
//! request cannot stretch the timeout.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::backend::SearchBackend;
use crate::errors::{SessionError, SessionResult};
use crate::model::{Generation, JobId, Summary};
use crate::state::Shared;
use crate::view::SearchView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

/// Spawns the polling loop for `job`; its outcome goes through the shared resolver.
pub(crate) fn spawn_polling<B, V>(
    backend: Arc<B>,
    shared: Arc<Shared<V>>,
    settings: PollSettings,
    generation: Generation,
    job: JobId,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    B: SearchBackend,
    V: SearchView,
{
    tokio::spawn(async move {
        let Some(outcome) = poll_until_settled(&*backend, settings, &job, &cancel).await else {
            debug!(job = %job, "polling cancelled");
            return;
        };
        shared.resolve_summary(generation, &job, outcome).await;
    })
}

/// `None` when cancelled; otherwise the terminal outcome of the job.
#[instrument(skip_all, fields(job = %job, interval_ms = settings.interval.as_millis() as u64))]
async fn poll_until_settled<B: SearchBackend>(
    backend: &B,
    settings: PollSettings,
    job: &JobId,
    cancel: &CancellationToken,
) -> Option<SessionResult<Summary>> {
    info!("summary polling started");

    let deadline = time::sleep(settings.timeout);
    tokio::pin!(deadline);

    let mut ticker = time::interval(settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut polls: u32 = 0;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            _ = &mut deadline => break,
            _ = ticker.tick() => {}
        }

        polls += 1;
        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            _ = &mut deadline => break,
            status = backend.poll_summary(job) => status,
        };

        match status {
            Ok(None) => debug!(polls, "not ready"),
            Ok(Some(summary)) => {
                debug!(polls, "summary resolved");
                return Some(Ok(summary));
            }
            Err(e) => {
                debug!(polls, error = %e, "status poll failed");
                return Some(Err(e));
            }
        }
    }

    debug!(polls, "summary job deadline reached");
    Some(Err(SessionError::Timeout(settings.timeout)))
}
