use super::JobId;

/// Lifecycle of the current submission. `Submitted` and `Polling` are the
/// only states in which a job is in flight.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PollState {
    #[default]
    Idle,
    Submitted,
    Polling(JobId),
    Completed(JobId),
    Errored(JobId),
    TimedOut(JobId),
    Cancelled,
}

impl PollState {
    pub fn is_busy(&self) -> bool {
        return matches!(self, PollState::Submitted | PollState::Polling(_));
    }

    pub fn polling_job(&self) -> Option<&JobId> {
        if let PollState::Polling(job_id) = self {
            return Some(job_id);
        }

        return None;
    }
}
