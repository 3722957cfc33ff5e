use super::JobId;
use super::MessageType;
use super::PollOutcome;

/// Messages from the actions service to the ui. Events raised by a
/// submission worker carry that submission's sequence number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    JobFinished(u64, JobId, PollOutcome),
    JobSubmitted(u64, JobId),
    Notice(MessageType, String),
    SessionActive(String, String),
    SessionRenamed(String, String),
    SessionStarted(u64, String, String),
    SubmitFailed(u64, String),
}
