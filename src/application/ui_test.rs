use std::path::PathBuf;

use yansi::Paint;

use super::format_message;
use super::format_notice;
use super::format_waiting;
use crate::domain::models::JobId;
use crate::domain::models::Message;
use crate::domain::models::MessageType;
use crate::domain::models::PollState;
use crate::domain::models::Role;

#[test]
fn it_formats_a_user_message_with_attachments() {
    Paint::disable();
    let msg = Message::new(Role::User, "What does this show?").with_attachments(
        Some(PathBuf::from("./chart.png")),
        Some(PathBuf::from("./memo.wav")),
    );

    insta::assert_snapshot!(format_message(&msg), @r###"
    You:
      What does this show?
      [image] ./chart.png
      [audio] ./memo.wav
    "###);
}

#[test]
fn it_formats_a_multiline_bot_message() {
    Paint::disable();
    let msg = Message::new(Role::Bot, "# Project plan\n\n1. Gather requirements");

    insta::assert_snapshot!(format_message(&msg), @r###"
    Crew:
      # Project plan

      1. Gather requirements
    "###);
}

#[test]
fn it_formats_an_error_message() {
    Paint::disable();
    let msg = Message::new_with_type(Role::Bot, MessageType::Error, "Timed out.");

    assert_eq!(format_message(&msg), "Crew:\n  Timed out.");
}

#[test]
fn it_formats_notices() {
    Paint::disable();

    assert_eq!(format_notice(MessageType::Normal, "Renamed."), "Renamed.");
    assert_eq!(format_notice(MessageType::Error, "Nope."), "Nope.");
}

#[test]
fn it_only_shows_waiting_while_polling() {
    Paint::disable();

    assert_eq!(
        format_waiting(&PollState::Polling(JobId::new("j1"))),
        Some("Waiting on job j1. Use /cancel to stop waiting.".to_string())
    );
    assert_eq!(format_waiting(&PollState::Submitted), None);
    assert_eq!(format_waiting(&PollState::Completed(JobId::new("j1"))), None);
}
