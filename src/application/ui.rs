#[cfg(test)]
#[path = "ui_test.rs"]
mod tests;

use std::io;
use std::io::Write;

use anyhow::Result;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::BackendBox;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::MessageType;
use crate::domain::models::PollState;
use crate::domain::models::Role;
use crate::domain::services::AppState;

pub fn format_message(msg: &Message) -> String {
    let label = match (msg.role, msg.message_type()) {
        (Role::User, _) => Paint::cyan("You").bold(),
        (Role::Bot, MessageType::Normal) => Paint::green("Crew").bold(),
        (Role::Bot, MessageType::Error) => Paint::red("Crew").bold(),
    };

    let mut lines = vec![format!("{label}:")];
    for line in msg.content.lines() {
        if line.is_empty() {
            lines.push("".to_string());
        } else if msg.message_type() == MessageType::Error {
            lines.push(format!("  {}", Paint::red(line)));
        } else {
            lines.push(format!("  {line}"));
        }
    }
    if let Some(image) = &msg.image {
        lines.push(format!("  {}", Paint::new(format!("[image] {}", image.display())).dimmed()));
    }
    if let Some(audio) = &msg.audio {
        lines.push(format!("  {}", Paint::new(format!("[audio] {}", audio.display())).dimmed()));
    }

    return lines.join("\n");
}

pub fn format_notice(mtype: MessageType, text: &str) -> String {
    match mtype {
        MessageType::Normal => return Paint::new(text).dimmed().to_string(),
        MessageType::Error => return Paint::red(text).to_string(),
    }
}

fn format_waiting(poll_state: &PollState) -> Option<String> {
    let job_id = poll_state.polling_job()?;
    return Some(format_notice(
        MessageType::Normal,
        &format!("Waiting on job {job_id}. Use /cancel to stop waiting."),
    ));
}

/// Prints everything the state has produced since the last call.
fn flush_output(app_state: &mut AppState, last_poll_state: &mut PollState) -> Result<()> {
    let mut stdout = io::stdout().lock();

    for msg in app_state.take_unprinted() {
        writeln!(stdout, "{}\n", format_message(&msg))?;
    }
    for (mtype, text) in app_state.take_notices() {
        writeln!(stdout, "{}\n", format_notice(mtype, &text))?;
    }
    if app_state.poll_state != *last_poll_state {
        if let Some(waiting) = format_waiting(&app_state.poll_state) {
            writeln!(stdout, "{waiting}\n")?;
        }
        *last_poll_state = app_state.poll_state.clone();
    }

    write!(stdout, "{} ", Paint::cyan(">").bold())?;
    stdout.flush()?;

    return Ok(());
}

pub async fn start(
    backend: BackendBox,
    tx: mpsc::UnboundedSender<Action>,
    mut rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let session_id = Config::get(ConfigKey::SessionID);
    let customer_domain = Config::get(ConfigKey::CustomerDomain);
    let mut app_state = AppState::new(&backend, &session_id).await?;
    let mut last_poll_state = app_state.poll_state.clone();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    flush_output(&mut app_state, &mut last_poll_state)?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if app_state.handle_input(&line, &customer_domain, &tx)? {
                            break;
                        }
                    }
                    None => {
                        tracing::debug!("stdin closed");
                        break;
                    }
                }
            }
            event = rx.recv() => {
                match event {
                    Some(event) => app_state.handle_event(event),
                    None => break,
                }
            }
        }

        flush_output(&mut app_state, &mut last_poll_state)?;
    }

    println!();
    return Ok(());
}
