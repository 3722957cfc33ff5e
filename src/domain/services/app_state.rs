#[cfg(test)]
#[path = "app_state_test.rs"]
mod tests;

use std::path::Path;
use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::mpsc;

use super::actions::help_text;
use crate::domain::models::Action;
use crate::domain::models::BackendBox;
use crate::domain::models::ClientError;
use crate::domain::models::Event;
use crate::domain::models::JobId;
use crate::domain::models::Message;
use crate::domain::models::MessageType;
use crate::domain::models::PollOutcome;
use crate::domain::models::PollState;
use crate::domain::models::Role;
use crate::domain::models::Session;
use crate::domain::models::SlashCommand;
use crate::domain::models::Submission;

pub const GREETING_TEXT: &str = "Hi! I'm the Crew assistant. I can help you analyse and plan your project. Tell me what you need.";
pub const JOB_ERROR_TEXT: &str =
    "Sorry, something went wrong while processing your request. Please try again.";
pub const JOB_TIMEOUT_TEXT: &str =
    "Sorry, the request took too long and timed out. Please try again.";
pub const JOB_CANCELLED_TEXT: &str = "Stopped waiting for the response.";
pub const SUBMIT_ERROR_TEXT: &str = "Sorry, the message could not be sent. Please check that the backend service is running.";

/// Transcript and submission state of a chat. Every transcript change goes
/// through `begin_submission`, `handle_event` or `cancel_job`.
pub struct AppState {
    pub messages: Vec<Message>,
    pub poll_state: PollState,
    pub session_id: Option<String>,
    pub session_title: Option<String>,
    pub pending_image: Option<PathBuf>,
    pub pending_audio: Option<PathBuf>,
    notices: Vec<(MessageType, String)>,
    printed: usize,
    seq: u64,
}

impl Default for AppState {
    fn default() -> AppState {
        return AppState {
            messages: vec![Message::new(Role::Bot, GREETING_TEXT)],
            poll_state: PollState::Idle,
            session_id: None,
            session_title: None,
            pending_image: None,
            pending_audio: None,
            notices: vec![],
            printed: 0,
            seq: 0,
        };
    }
}

impl AppState {
    pub async fn new(backend: &BackendBox, session_id: &str) -> Result<AppState> {
        let mut app_state = AppState::default();

        if let Err(err) = backend.health_check().await {
            tracing::warn!(error = ?err, "Health check failed");
            app_state.messages.push(Message::new_with_type(
                Role::Bot,
                MessageType::Error,
                &format!("Hey, it looks like the crew backend isn't running, I can't connect to it. Double check it before we start talking.\n\nError: {err}"),
            ));
        }

        if !session_id.is_empty() {
            match backend.get_session(session_id).await {
                Ok(session) => app_state.load_session(session),
                Err(err) => {
                    tracing::error!(error = ?err, session_id, "Failed to load session");
                    app_state.messages.push(Message::new_with_type(
                        Role::Bot,
                        MessageType::Error,
                        &format!("Session {session_id} could not be loaded, a new one will be started.\n\nError: {err}"),
                    ));
                }
            }
        }

        return Ok(app_state);
    }

    /// Replaces the transcript with a stored session's messages.
    pub fn load_session(&mut self, session: Session) {
        self.session_id = Some(session.session_id);
        self.session_title = Some(session.title);
        if !session.messages.is_empty() {
            self.messages = session.messages;
        }
        self.printed = 0;
    }

    /// Starts a fresh transcript, detached from any session.
    pub fn reset(&mut self) {
        self.messages = vec![Message::new(Role::Bot, GREETING_TEXT)];
        self.session_id = None;
        self.session_title = None;
        self.poll_state = PollState::Idle;
        self.printed = 0;
        self.seq += 1;
    }

    pub fn is_busy(&self) -> bool {
        return self.poll_state.is_busy();
    }

    /// Appends the user's message and moves to `Submitted`. Rejected without
    /// any change while a job is in flight.
    pub fn begin_submission(&mut self, text: &str, customer_domain: &str) -> Result<Submission> {
        if self.is_busy() {
            return Err(ClientError::Busy.into());
        }

        self.seq += 1;
        let mut submission = Submission::new(text, customer_domain);
        submission.seq = self.seq;
        submission.session_id = self.session_id.clone();
        submission.image = self.pending_image.take();
        submission.audio = self.pending_audio.take();

        let msg = Message::new(Role::User, text)
            .with_attachments(submission.image.clone(), submission.audio.clone());
        self.messages.push(msg);
        self.poll_state = PollState::Submitted;

        return Ok(submission);
    }

    /// Stops waiting on the in-flight job. Every later event of the cancelled
    /// submission is ignored.
    pub fn cancel_job(&mut self) -> bool {
        if !self.is_busy() {
            return false;
        }

        self.seq += 1;
        self.poll_state = PollState::Cancelled;
        self.messages
            .push(Message::new_with_type(Role::Bot, MessageType::Error, JOB_CANCELLED_TEXT));
        return true;
    }

    /// Events from a submission other than the current one.
    fn is_stale(&self, seq: u64) -> bool {
        if seq != self.seq {
            tracing::debug!(seq, current = self.seq, "Ignoring event of an earlier submission");
            return true;
        }

        return false;
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::JobSubmitted(seq, job_id) => {
                if !self.is_stale(seq) && self.poll_state == PollState::Submitted {
                    self.poll_state = PollState::Polling(job_id);
                }
            }
            Event::JobFinished(seq, job_id, outcome) => {
                if !self.is_stale(seq) {
                    self.handle_job_finished(job_id, outcome);
                }
            }
            Event::SubmitFailed(seq, err) => {
                if self.is_stale(seq) || self.poll_state != PollState::Submitted {
                    tracing::debug!(error = %err, "Ignoring submit failure outside of a submission");
                    return;
                }
                self.poll_state = PollState::Idle;
                self.messages.push(Message::new_with_type(
                    Role::Bot,
                    MessageType::Error,
                    SUBMIT_ERROR_TEXT,
                ));
            }
            Event::SessionActive(session_id, title) => {
                self.session_id = Some(session_id);
                self.session_title = Some(title);
            }
            Event::SessionStarted(seq, session_id, title) => {
                if !self.is_stale(seq) {
                    self.session_id = Some(session_id);
                    self.session_title = Some(title);
                }
            }
            Event::SessionRenamed(session_id, title) => {
                if self.session_id.as_deref() == Some(session_id.as_str()) {
                    self.session_title = Some(title);
                }
            }
            Event::Notice(mtype, text) => {
                self.notices.push((mtype, text));
            }
        }
    }

    fn handle_job_finished(&mut self, job_id: JobId, outcome: PollOutcome) {
        if self.poll_state.polling_job() != Some(&job_id) {
            tracing::debug!(
                job_id = job_id.as_str(),
                state = ?self.poll_state,
                "Ignoring terminal event for a job that isn't being polled"
            );
            return;
        }

        match outcome {
            PollOutcome::Completed(text) => {
                self.messages.push(Message::new(Role::Bot, &text));
                self.poll_state = PollState::Completed(job_id);
            }
            PollOutcome::Errored(_) => {
                self.messages
                    .push(Message::new_with_type(Role::Bot, MessageType::Error, JOB_ERROR_TEXT));
                self.poll_state = PollState::Errored(job_id);
            }
            PollOutcome::TimedOut => {
                self.messages.push(Message::new_with_type(
                    Role::Bot,
                    MessageType::Error,
                    JOB_TIMEOUT_TEXT,
                ));
                self.poll_state = PollState::TimedOut(job_id);
            }
            PollOutcome::Cancelled => {
                self.messages.push(Message::new_with_type(
                    Role::Bot,
                    MessageType::Error,
                    JOB_CANCELLED_TEXT,
                ));
                self.poll_state = PollState::Cancelled;
            }
        }
    }

    fn attach(&mut self, command: &SlashCommand, is_image: bool) {
        let kind = if is_image { "image" } else { "audio" };
        let path_str = command.arg_text();
        if path_str.is_empty() {
            self.notice(
                MessageType::Error,
                &format!("You must pass a file path, for example `/{kind} ./file`."),
            );
            return;
        }

        let path = Path::new(&path_str);
        if !path.is_file() {
            self.notice(MessageType::Error, &format!("No file found at {path_str}."));
            return;
        }

        if is_image {
            self.pending_image = Some(path.to_path_buf());
        } else {
            self.pending_audio = Some(path.to_path_buf());
        }
        self.notice(
            MessageType::Normal,
            &format!("Attached {kind} {path_str} to your next message."),
        );
    }

    /// Returns `(should_break, should_continue)`.
    pub fn handle_slash_commands(
        &mut self,
        input_str: &str,
        tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<(bool, bool)> {
        let command = match SlashCommand::parse(input_str) {
            Some(command) => command,
            None => return Ok((false, false)),
        };

        if command.is_quit() {
            return Ok((true, false));
        }

        if command.is_help() {
            self.notice(MessageType::Normal, &help_text());
        } else if command.is_image() || command.is_audio() {
            self.attach(&command, command.is_image());
        } else if command.is_cancel() {
            if self.cancel_job() {
                tx.send(Action::CancelJob())?;
            } else {
                self.notice(MessageType::Normal, "Nothing to cancel.");
            }
        } else if command.is_new_session() {
            if self.is_busy() {
                self.notice(MessageType::Error, &ClientError::Busy.to_string());
            } else {
                self.reset();
                let title = command.arg_text();
                tx.send(Action::SessionCreate(if title.is_empty() {
                    None
                } else {
                    Some(title)
                }))?;
            }
        } else if command.is_rename_session() {
            let title = command.arg_text();
            if title.is_empty() {
                self.notice(MessageType::Error, "You must pass a title, for example `/title Launch plan`.");
            } else if let Some(session_id) = self.session_id.clone() {
                tx.send(Action::SessionRename(session_id, title))?;
            } else {
                self.notice(
                    MessageType::Error,
                    "There is no session yet. Send a message first.",
                );
            }
        } else if command.is_list_sessions() {
            tx.send(Action::SessionList())?;
        }

        return Ok((false, true));
    }

    /// Handles a line of user input. Returns true when the chat should end.
    pub fn handle_input(
        &mut self,
        input: &str,
        customer_domain: &str,
        tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<bool> {
        let input_str = input.trim();
        if input_str.is_empty() && self.pending_image.is_none() && self.pending_audio.is_none() {
            return Ok(false);
        }

        let (should_break, should_continue) = self.handle_slash_commands(input_str, tx)?;
        if should_break {
            return Ok(true);
        }
        if should_continue {
            return Ok(false);
        }

        match self.begin_submission(input_str, customer_domain) {
            Ok(submission) => {
                tx.send(Action::Submit(submission))?;
            }
            Err(err) => {
                self.notice(MessageType::Error, &err.to_string());
            }
        }

        return Ok(false);
    }

    fn notice(&mut self, mtype: MessageType, text: &str) {
        self.notices.push((mtype, text.to_string()));
    }

    /// Informational output that is shown once and never becomes part of the
    /// transcript.
    pub fn take_notices(&mut self) -> Vec<(MessageType, String)> {
        return std::mem::take(&mut self.notices);
    }

    /// Transcript entries added since the last call.
    pub fn take_unprinted(&mut self) -> Vec<Message> {
        let start = self.printed.min(self.messages.len());
        self.printed = self.messages.len();
        return self.messages[start..].to_vec();
    }
}
