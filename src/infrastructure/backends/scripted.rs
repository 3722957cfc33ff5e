//! In-memory backend that plays back a fixed list of job statuses. Used by the
//! poller, actions and app state tests.

use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::TimeZone;
use chrono::Utc;
use serde_json::json;

use crate::domain::models::Backend;
use crate::domain::models::ClientError;
use crate::domain::models::JobId;
use crate::domain::models::JobStatusResponse;
use crate::domain::models::Role;
use crate::domain::models::Session;
use crate::domain::models::SessionCreated;
use crate::domain::models::Submission;

pub fn pending() -> Option<JobStatusResponse> {
    return Some(JobStatusResponse {
        job_id: None,
        status: "PENDING".to_string(),
        result: None,
        events: vec![],
    });
}

pub fn complete(result: &str) -> Option<JobStatusResponse> {
    return Some(JobStatusResponse {
        job_id: None,
        status: "COMPLETE".to_string(),
        result: Some(json!(result)),
        events: vec![],
    });
}

pub fn failed(detail: &str) -> Option<JobStatusResponse> {
    return Some(JobStatusResponse {
        job_id: None,
        status: "ERROR".to_string(),
        result: Some(json!(detail)),
        events: vec![],
    });
}

/// A status request that fails in transport.
pub fn unreachable() -> Option<JobStatusResponse> {
    return None;
}

pub fn session(session_id: &str, title: &str, updated_hour: u32) -> Session {
    let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    return Session {
        session_id: session_id.to_string(),
        user_id: "tester".to_string(),
        title: title.to_string(),
        created_at,
        updated_at: Utc.with_ymd_and_hms(2024, 3, 1, updated_hour, 0, 0).unwrap(),
        messages: vec![],
        message_count: 0,
    };
}

pub struct Scripted {
    pub job_id: String,
    pub steps: Mutex<VecDeque<Option<JobStatusResponse>>>,
    pub status_delay: Duration,
    pub submit_delay: Duration,
    pub session_delay: Duration,
    pub status_calls: AtomicUsize,
    pub healthy: bool,
    pub fail_submit: bool,
    pub fail_sessions: bool,
    pub fail_messages: bool,
    pub submissions: Mutex<Vec<Submission>>,
    pub stored: Mutex<Vec<(String, Role, String)>>,
    pub sessions: Mutex<Vec<Session>>,
    pub renamed: Mutex<Vec<(String, String)>>,
    pub deleted: Mutex<Vec<String>>,
}

impl Scripted {
    pub fn new(steps: Vec<Option<JobStatusResponse>>) -> Scripted {
        return Scripted {
            job_id: "j1".to_string(),
            steps: Mutex::new(steps.into_iter().collect()),
            status_delay: Duration::ZERO,
            submit_delay: Duration::ZERO,
            session_delay: Duration::ZERO,
            status_calls: AtomicUsize::new(0),
            healthy: true,
            fail_submit: false,
            fail_sessions: false,
            fail_messages: false,
            submissions: Mutex::new(vec![]),
            stored: Mutex::new(vec![]),
            sessions: Mutex::new(vec![]),
            renamed: Mutex::new(vec![]),
            deleted: Mutex::new(vec![]),
        };
    }

    pub fn status_calls(&self) -> usize {
        return self.status_calls.load(Ordering::SeqCst);
    }

    pub fn submissions(&self) -> Vec<Submission> {
        return self.submissions.lock().unwrap().clone();
    }

    pub fn stored(&self) -> Vec<(String, Role, String)> {
        return self.stored.lock().unwrap().clone();
    }

    fn session_failure(&self) -> Result<()> {
        if self.fail_sessions {
            return Err(ClientError::Transport("sessions are down".to_string()).into());
        }

        return Ok(());
    }
}

#[async_trait]
impl Backend for Scripted {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if !self.healthy {
            return Err(ClientError::Transport("connection refused".to_string()).into());
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn submit(&self, submission: &Submission) -> Result<JobId> {
        if self.fail_submit {
            return Err(ClientError::Transport("connection refused".to_string()).into());
        }
        if !self.submit_delay.is_zero() {
            tokio::time::sleep(self.submit_delay).await;
        }

        self.submissions.lock().unwrap().push(submission.clone());
        return Ok(JobId::new(&self.job_id));
    }

    #[allow(clippy::implicit_return)]
    async fn job_status(&self, _job_id: &JobId) -> Result<JobStatusResponse> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if !self.status_delay.is_zero() {
            tokio::time::sleep(self.status_delay).await;
        }

        let step = self.steps.lock().unwrap().pop_front().unwrap_or_else(pending);
        match step {
            Some(res) => return Ok(res),
            None => return Err(ClientError::Transport("connection reset".to_string()).into()),
        }
    }

    #[allow(clippy::implicit_return)]
    async fn create_session(&self, user_id: &str, title: &str) -> Result<SessionCreated> {
        self.session_failure()?;
        if !self.session_delay.is_zero() {
            tokio::time::sleep(self.session_delay).await;
        }

        let mut sessions = self.sessions.lock().unwrap();
        let session_id = format!("s{}", sessions.len() + 1);
        let mut created = session(&session_id, title, 9);
        created.user_id = user_id.to_string();
        sessions.push(created);

        return Ok(SessionCreated {
            session_id,
            title: title.to_string(),
        });
    }

    #[allow(clippy::implicit_return)]
    async fn get_session(&self, session_id: &str) -> Result<Session> {
        self.session_failure()?;

        let sessions = self.sessions.lock().unwrap();
        if let Some(found) = sessions.iter().find(|s| return s.session_id == session_id) {
            return Ok(found.clone());
        }

        return Err(ClientError::Transport(format!("Session {session_id} not found")).into());
    }

    #[allow(clippy::implicit_return)]
    async fn update_session(&self, session_id: &str, title: &str) -> Result<()> {
        self.session_failure()?;

        self.renamed
            .lock()
            .unwrap()
            .push((session_id.to_string(), title.to_string()));
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.session_failure()?;

        self.deleted.lock().unwrap().push(session_id.to_string());
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn list_user_sessions(&self, user_id: &str) -> Result<Vec<Session>> {
        self.session_failure()?;

        let sessions = self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| return s.user_id == user_id)
            .cloned()
            .collect::<Vec<Session>>();
        return Ok(sessions);
    }

    #[allow(clippy::implicit_return)]
    async fn add_message(&self, session_id: &str, role: Role, content: &str) -> Result<()> {
        if self.fail_messages {
            return Err(ClientError::Transport("messages are down".to_string()).into());
        }

        self.stored
            .lock()
            .unwrap()
            .push((session_id.to_string(), role, content.to_string()));
        return Ok(());
    }
}
