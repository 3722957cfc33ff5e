use std::path::PathBuf;

use anyhow::Result;
use chrono::Timelike;

use super::Message;
use super::MessageType;
use super::Role;

#[test]
fn it_executes_new() {
    let msg = Message::new(Role::User, "Hi there!");
    assert_eq!(msg.role, Role::User);
    assert_eq!(msg.content, "Hi there!");
    assert_eq!(msg.message_type(), MessageType::Normal);
    assert!(!msg.id.is_empty());
    assert!(!msg.has_attachments());
}

#[test]
fn it_executes_new_with_type() {
    let msg = Message::new_with_type(Role::Bot, MessageType::Error, "It broke!");
    assert_eq!(msg.role, Role::Bot);
    assert_eq!(msg.content, "It broke!");
    assert_eq!(msg.message_type(), MessageType::Error);
}

#[test]
fn it_gives_each_message_a_unique_id() {
    let first = Message::new(Role::User, "one");
    let second = Message::new(Role::User, "one");
    assert_ne!(first.id, second.id);
}

#[test]
fn it_attaches_files() {
    let msg = Message::new(Role::User, "Look at this")
        .with_attachments(Some(PathBuf::from("./cat.png")), None);

    assert!(msg.has_attachments());
    assert_eq!(msg.image, Some(PathBuf::from("./cat.png")));
    assert_eq!(msg.audio, None);
}

#[test]
fn it_previews_first_line() {
    let msg = Message::new(Role::User, "First line\nSecond line");
    assert_eq!(msg.preview(70), "First line");
}

#[test]
fn it_truncates_long_previews() {
    let msg = Message::new(Role::User, "abcdefghijklmnopqrstuvwxyz");
    insta::assert_snapshot!(msg.preview(10), @"abcdefg...");
}

#[test]
fn it_truncates_on_char_boundaries() {
    let msg = Message::new(Role::User, "你好你好你好你好你好你好");
    assert_eq!(msg.preview(5), "你好...");
}

#[test]
fn it_deserializes_backend_messages() -> Result<()> {
    let payload = r#"{
        "id": "m1",
        "role": "assistant",
        "content": "Hello",
        "timestamp": "2024-03-01T09:00:05.123456"
    }"#;

    let msg: Message = serde_json::from_str(payload)?;
    assert_eq!(msg.id, "m1");
    assert_eq!(msg.role, Role::Bot);
    assert_eq!(msg.content, "Hello");
    assert_eq!(msg.timestamp.hour(), 9);
    assert_eq!(msg.timestamp.second(), 5);
    assert_eq!(msg.message_type(), MessageType::Normal);

    return Ok(());
}

#[test]
fn it_rejects_invalid_timestamps() {
    let payload = r#"{"id": "m1", "role": "user", "content": "Hello", "timestamp": "yesterday"}"#;
    let res = serde_json::from_str::<Message>(payload);
    assert!(res.is_err());
}

#[test]
fn it_serializes_roles_lowercase() -> Result<()> {
    assert_eq!(serde_json::to_string(&Role::Bot)?, "\"bot\"");
    assert_eq!(serde_json::to_string(&Role::User)?, "\"user\"");
    assert_eq!(Role::Bot.to_string(), "bot");

    return Ok(());
}

#[test]
fn it_maps_roles_to_backend_names() {
    assert_eq!(Role::User.wire_name(), "user");
    assert_eq!(Role::Bot.wire_name(), "assistant");
}
