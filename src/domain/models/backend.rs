use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use super::JobId;
use super::JobStatusResponse;
use super::Role;
use super::Session;
use super::SessionCreated;
use super::Submission;

pub type BackendBox = Arc<dyn Backend + Send + Sync>;

/// REST surface of the crew backend. Transport failures come back as
/// `ClientError::Transport` wrapped in `anyhow::Error`.
#[async_trait]
pub trait Backend {
    /// Used at startup to verify the backend is reachable.
    async fn health_check(&self) -> Result<()>;

    /// Sends a prompt, with any attachments, and returns the id of the job
    /// the backend queued for it.
    async fn submit(&self, submission: &Submission) -> Result<JobId>;

    /// A single status check. Never waits for the job to finish.
    async fn job_status(&self, job_id: &JobId) -> Result<JobStatusResponse>;

    async fn create_session(&self, user_id: &str, title: &str) -> Result<SessionCreated>;

    async fn get_session(&self, session_id: &str) -> Result<Session>;

    async fn update_session(&self, session_id: &str, title: &str) -> Result<()>;

    async fn delete_session(&self, session_id: &str) -> Result<()>;

    async fn list_user_sessions(&self, user_id: &str) -> Result<Vec<Session>>;

    async fn add_message(&self, session_id: &str, role: Role, content: &str) -> Result<()>;
}
