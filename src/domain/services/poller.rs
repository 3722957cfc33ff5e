#[cfg(test)]
#[path = "poller_test.rs"]
mod tests;

use std::time::Duration;

use tokio::time;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::domain::models::BackendBox;
use crate::domain::models::JobId;
use crate::domain::models::JobStatus;
use crate::domain::models::PollOutcome;

/// Polls a submitted job until it reaches a terminal status.
///
/// Status checks run every `interval`, the first one `interval` after the
/// loop starts. The loop ends on the first COMPLETE or ERROR, once `timeout`
/// has elapsed, or when the cancellation token fires, whichever comes first.
/// Failed status requests are logged and retried on the next tick. Both
/// timers live inside `run`, so they are released as soon as it returns.
#[derive(Clone)]
pub struct JobPoller {
    backend: BackendBox,
    interval: Duration,
    timeout: Duration,
}

impl JobPoller {
    pub fn new(backend: BackendBox, interval: Duration, timeout: Duration) -> JobPoller {
        return JobPoller {
            backend,
            interval,
            timeout,
        };
    }

    pub fn interval(&self) -> Duration {
        return self.interval;
    }

    pub fn timeout(&self) -> Duration {
        return self.timeout;
    }

    pub async fn run(&self, job_id: &JobId, cancel: CancellationToken) -> PollOutcome {
        let deadline = time::sleep(self.timeout);
        tokio::pin!(deadline);

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut attempt: u32 = 0;
        loop {
            // Cancellation first, then the ceiling, so a tick landing on the
            // deadline never issues another request.
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(job_id = job_id.as_str(), attempt, "Polling cancelled");
                    return PollOutcome::Cancelled;
                }
                _ = &mut deadline => {
                    tracing::warn!(job_id = job_id.as_str(), attempt, "Polling timed out");
                    return PollOutcome::TimedOut;
                }
                _ = ticker.tick() => {}
            }

            attempt += 1;
            let res = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(job_id = job_id.as_str(), attempt, "Polling cancelled mid-request");
                    return PollOutcome::Cancelled;
                }
                _ = &mut deadline => {
                    tracing::warn!(job_id = job_id.as_str(), attempt, "Polling timed out mid-request");
                    return PollOutcome::TimedOut;
                }
                res = self.backend.job_status(job_id) => res,
            };

            let status = match res {
                Ok(status) => status,
                Err(err) => {
                    tracing::warn!(job_id = job_id.as_str(), attempt, error = ?err, "Status check failed, retrying");
                    continue;
                }
            };

            tracing::debug!(
                job_id = job_id.as_str(),
                attempt,
                status = %status.status,
                events = status.events.len(),
                "Job status"
            );
            match status.job_status() {
                JobStatus::Pending => continue,
                JobStatus::Complete => return PollOutcome::Completed(status.display_text()),
                JobStatus::Error => return PollOutcome::Errored(status.error_detail()),
            }
        }
    }
}
