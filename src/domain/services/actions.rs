#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use std::future::Future;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::default_title;
use super::format_session;
use super::JobPoller;
use super::Sessions;
use crate::domain::models::Action;
use crate::domain::models::BackendBox;
use crate::domain::models::Event;
use crate::domain::models::MessageType;
use crate::domain::models::PollOutcome;
use crate::domain::models::Role;
use crate::domain::models::Submission;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /image (/i) [PATH] - Attaches an image to your next message.
- /audio (/au) [PATH] - Attaches an audio file to your next message.
- /cancel (/c) - Stops waiting for the response to the last message.
- /new (/n) [TITLE?] - Starts a new session. The title defaults to the current date and time.
- /title (/t) [TITLE] - Renames the current session.
- /sessions (/s) - Lists your sessions, most recently updated first.
- /quit /exit (/q) - Exit crewchat.
- /help (/h) - Provides this help menu.

Messages can only be sent once the previous response has arrived, failed, timed out or been cancelled.
        "#;

    return text.trim().to_string();
}

/// Everything a submission worker needs, cloned into each spawned task.
#[derive(Clone)]
struct Worker {
    backend: BackendBox,
    poller: JobPoller,
    sessions: Sessions,
    user_id: String,
    tx: mpsc::UnboundedSender<Event>,
}

impl Worker {
    async fn ensure_session(&self, submission: &Submission) -> Result<String> {
        if let Some(session_id) = &submission.session_id {
            return Ok(session_id.to_string());
        }

        let created = self
            .sessions
            .create(&self.user_id, &default_title(&submission.text))
            .await?;
        self.tx.send(Event::SessionStarted(
            submission.seq,
            created.session_id.to_string(),
            created.title,
        ))?;

        return Ok(created.session_id);
    }

    /// Nothing is stored or submitted once `cancel` fires.
    async fn run(&self, mut submission: Submission, cancel: CancellationToken) -> Result<()> {
        let seq = submission.seq;
        let session_id = match unless_cancelled(&cancel, self.ensure_session(&submission)).await {
            None => return Ok(()),
            Some(Ok(session_id)) => session_id,
            Some(Err(err)) => {
                tracing::error!(error = ?err, seq, "Failed to create session for submission");
                self.tx.send(Event::SubmitFailed(seq, err.to_string()))?;
                return Ok(());
            }
        };
        submission.session_id = Some(session_id.to_string());

        let persisted = self
            .sessions
            .persist_message(&session_id, Role::User, &submission.text);
        if unless_cancelled(&cancel, persisted).await.is_none() {
            return Ok(());
        }

        let job_id = match unless_cancelled(&cancel, self.backend.submit(&submission)).await {
            None => return Ok(()),
            Some(Ok(job_id)) => job_id,
            Some(Err(err)) => {
                tracing::error!(error = ?err, seq, session_id = %session_id, "Failed to submit job");
                self.tx.send(Event::SubmitFailed(seq, err.to_string()))?;
                return Ok(());
            }
        };
        tracing::info!(job_id = job_id.as_str(), seq, session_id = %session_id, "Job submitted");
        self.tx.send(Event::JobSubmitted(seq, job_id.clone()))?;

        let outcome = self.poller.run(&job_id, cancel).await;
        if let Some(err) = outcome.error(&job_id) {
            tracing::warn!(error = %err, seq, "Job did not complete");
        }

        // Stored before it is shown, so the next submission can't abort it.
        if let PollOutcome::Completed(text) = &outcome {
            self.sessions
                .persist_message(&session_id, Role::Bot, text)
                .await;
        }
        self.tx.send(Event::JobFinished(seq, job_id, outcome))?;

        return Ok(());
    }
}

/// Runs `fut` unless `cancel` fires first, in which case `fut` is dropped.
async fn unless_cancelled<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => return None,
        res = fut => return Some(res),
    }
}

fn notice(tx: &mpsc::UnboundedSender<Event>, mtype: MessageType, text: &str) -> Result<()> {
    tx.send(Event::Notice(mtype, text.to_string()))?;
    return Ok(());
}

async fn session_create(
    worker: &Worker,
    title: Option<String>,
    tx: &mpsc::UnboundedSender<Event>,
) -> Result<()> {
    match worker
        .sessions
        .create(&worker.user_id, &title.unwrap_or_default())
        .await
    {
        Ok(created) => {
            tx.send(Event::SessionActive(
                created.session_id.to_string(),
                created.title.to_string(),
            ))?;
            notice(
                tx,
                MessageType::Normal,
                &format!(
                    "Started session \"{}\" (ID: {}).",
                    created.title, created.session_id
                ),
            )?;
        }
        Err(err) => {
            tracing::error!(error = ?err, "Failed to create session");
            notice(
                tx,
                MessageType::Error,
                &format!("Failed to create a session: {err}"),
            )?;
        }
    }

    return Ok(());
}

async fn session_list(worker: &Worker, tx: &mpsc::UnboundedSender<Event>) -> Result<()> {
    match worker.sessions.list(&worker.user_id).await {
        Ok(sessions) if sessions.is_empty() => {
            notice(
                tx,
                MessageType::Normal,
                "There are no sessions available. Send a message to start your first one!",
            )?;
        }
        Ok(sessions) => {
            let lines = sessions
                .iter()
                .map(format_session)
                .collect::<Vec<String>>();
            notice(tx, MessageType::Normal, &lines.join("\n"))?;
        }
        Err(err) => {
            tracing::error!(error = ?err, "Failed to list sessions");
            notice(
                tx,
                MessageType::Error,
                &format!("Failed to list sessions: {err}"),
            )?;
        }
    }

    return Ok(());
}

async fn session_rename(
    worker: &Worker,
    session_id: &str,
    title: &str,
    tx: &mpsc::UnboundedSender<Event>,
) -> Result<()> {
    match worker.sessions.rename(session_id, title).await {
        Ok(()) => {
            let title = title.trim();
            tx.send(Event::SessionRenamed(
                session_id.to_string(),
                title.to_string(),
            ))?;
            notice(
                tx,
                MessageType::Normal,
                &format!("Renamed session to \"{title}\"."),
            )?;
        }
        Err(err) => {
            tracing::error!(error = ?err, session_id, "Failed to rename session");
            notice(
                tx,
                MessageType::Error,
                &format!("Failed to rename the session: {err}"),
            )?;
        }
    }

    return Ok(());
}

pub struct ActionsService {}

impl ActionsService {
    /// Runs until the action channel closes. Each submission gets its own
    /// worker task and cancellation token. A new submission or shutdown
    /// cancels the current token and aborts its worker. An explicit cancel
    /// only cancels the token.
    pub async fn start(
        backend: BackendBox,
        poller: JobPoller,
        user_id: &str,
        tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        let worker = Worker {
            backend: backend.clone(),
            poller,
            sessions: Sessions::new(backend),
            user_id: user_id.to_string(),
            tx: tx.clone(),
        };

        let mut cancel = CancellationToken::new();

        // Lazy default.
        let mut handle: JoinHandle<Result<()>> = tokio::spawn(async {
            return Ok(());
        });

        while let Some(action) = rx.recv().await {
            match action {
                Action::CancelJob() => {
                    tracing::debug!("Cancelling job");
                    cancel.cancel();
                }
                Action::Submit(submission) => {
                    cancel.cancel();
                    handle.abort();
                    cancel = CancellationToken::new();

                    let job_worker = worker.clone();
                    let job_cancel = cancel.clone();
                    handle = tokio::spawn(async move {
                        return job_worker.run(submission, job_cancel).await;
                    });
                }
                Action::SessionCreate(title) => {
                    session_create(&worker, title, &tx).await?;
                }
                Action::SessionList() => {
                    session_list(&worker, &tx).await?;
                }
                Action::SessionRename(session_id, title) => {
                    session_rename(&worker, &session_id, &title, &tx).await?;
                }
            }
        }

        tracing::debug!("Action channel closed, shutting down");
        cancel.cancel();
        handle.abort();

        return Ok(());
    }
}
