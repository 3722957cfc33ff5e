#[cfg(test)]
#[path = "sessions_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use chrono::Local;

use crate::domain::models::BackendBox;
use crate::domain::models::Role;
use crate::domain::models::Session;
use crate::domain::models::SessionCreated;

const TITLE_MAX_CHARS: usize = 30;

/// Title for a session created from its first message. Falls back to a
/// timestamped title when the message has no text.
pub fn default_title(first_message: &str) -> String {
    let text = first_message.trim();
    if text.is_empty() {
        return format!("Chat Session {}", Local::now().format("%Y-%m-%d %H:%M"));
    }

    if text.chars().count() <= TITLE_MAX_CHARS {
        return text.to_string();
    }

    let cut = text.chars().take(TITLE_MAX_CHARS).collect::<String>();
    return format!("{cut}...");
}

pub fn format_session(session: &Session) -> String {
    let mut res = format!(
        "- (ID: {}) {}, {}",
        session.session_id,
        session.updated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
        session.title,
    );

    let count = session.message_count.max(session.messages.len());
    if count > 0 {
        res = format!("{res}, Messages: {count}");
    }

    if let Some(first) = session.messages.iter().find(|msg| return msg.role == Role::User) {
        res = format!("{res}, {}", first.preview(70));
    }

    return res;
}

/// Session bookkeeping on top of the crew backend.
#[derive(Clone)]
pub struct Sessions {
    backend: BackendBox,
}

impl Sessions {
    pub fn new(backend: BackendBox) -> Sessions {
        return Sessions { backend };
    }

    /// The user's sessions, most recently updated first.
    pub async fn list(&self, user_id: &str) -> Result<Vec<Session>> {
        let mut sessions = self.backend.list_user_sessions(user_id).await?;
        sessions.sort_by(|a, b| return b.updated_at.cmp(&a.updated_at));

        return Ok(sessions);
    }

    pub async fn create(&self, user_id: &str, title: &str) -> Result<SessionCreated> {
        let title = if title.trim().is_empty() {
            default_title("")
        } else {
            title.trim().to_string()
        };

        let created = self.backend.create_session(user_id, &title).await?;
        tracing::info!(
            session_id = %created.session_id,
            title = %created.title,
            "Created session"
        );

        return Ok(created);
    }

    pub async fn load(&self, session_id: &str) -> Result<Session> {
        return self.backend.get_session(session_id).await;
    }

    pub async fn rename(&self, session_id: &str, title: &str) -> Result<()> {
        if title.trim().is_empty() {
            bail!("Session title can't be empty");
        }

        self.backend.update_session(session_id, title.trim()).await?;
        return Ok(());
    }

    pub async fn delete(&self, session_id: &str) -> Result<()> {
        self.backend.delete_session(session_id).await?;
        tracing::info!(session_id, "Deleted session");

        return Ok(());
    }

    /// Stores a transcript entry on the session. Failures are logged and
    /// otherwise ignored.
    pub async fn persist_message(&self, session_id: &str, role: Role, content: &str) {
        if let Err(err) = self.backend.add_message(session_id, role, content).await {
            tracing::warn!(session_id, %role, error = ?err, "Failed to store message");
        }
    }
}
