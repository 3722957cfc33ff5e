#[cfg(test)]
#[path = "job_test.rs"]
mod tests;

use std::fmt;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use serde_json::Value;

use super::ClientError;

pub const EMPTY_RESULT_TEXT: &str = "Task completed.";

/// Opaque identifier handed out by the backend when a job is accepted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: &str) -> JobId {
        return JobId(id.to_string());
    }

    pub fn as_str(&self) -> &str {
        return &self.0;
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}", self.0);
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Complete,
    Error,
}

impl JobStatus {
    /// Anything that isn't a terminal status, `STARTED` included, is still
    /// pending.
    pub fn parse(status: &str) -> JobStatus {
        match status.trim().to_uppercase().as_str() {
            "COMPLETE" => return JobStatus::Complete,
            "ERROR" => return JobStatus::Error,
            _ => return JobStatus::Pending,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSubmitResponse {
    pub job_id: JobId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEvent {
    pub timestamp: String,
    pub data: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusResponse {
    #[serde(default)]
    pub job_id: Option<JobId>,
    pub status: String,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub events: Vec<JobEvent>,
}

fn titled(value: &Value) -> Option<String> {
    let title = value.get("title")?.as_str()?;
    let body = value.get("body")?.as_str()?;
    if title.is_empty() || body.is_empty() {
        return None;
    }

    return Some(format!("# {title}\n\n{body}"));
}

impl JobStatusResponse {
    pub fn job_status(&self) -> JobStatus {
        return JobStatus::parse(&self.status);
    }

    /// Renders the result for the transcript. Results shaped as
    /// `{"title", "body"}`, either as an object or as a JSON string, become a
    /// markdown heading followed by the body.
    pub fn display_text(&self) -> String {
        match &self.result {
            None | Some(Value::Null) => {
                return EMPTY_RESULT_TEXT.to_string();
            }
            Some(Value::String(text)) => {
                if text.trim().is_empty() {
                    return EMPTY_RESULT_TEXT.to_string();
                }
                if let Ok(parsed) = serde_json::from_str::<Value>(text) {
                    if let Some(res) = titled(&parsed) {
                        return res;
                    }
                }

                return text.to_string();
            }
            Some(value) => {
                return titled(value).unwrap_or_else(|| return value.to_string());
            }
        }
    }

    /// Failure detail the backend stores in `result` for errored jobs.
    pub fn error_detail(&self) -> String {
        match &self.result {
            Some(Value::String(text)) => return text.to_string(),
            Some(Value::Null) | None => return "".to_string(),
            Some(value) => return value.to_string(),
        }
    }
}

/// How a single poll loop ended. Exactly one is produced per job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    Completed(String),
    Errored(String),
    TimedOut,
    Cancelled,
}

impl PollOutcome {
    pub fn error(&self, job_id: &JobId) -> Option<ClientError> {
        match self {
            PollOutcome::Errored(detail) => {
                return Some(ClientError::Backend(job_id.to_string(), detail.to_string()));
            }
            PollOutcome::TimedOut => return Some(ClientError::Timeout(job_id.to_string())),
            _ => return None,
        }
    }
}
