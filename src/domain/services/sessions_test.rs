use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use chrono::TimeZone;
use chrono::Utc;

use super::default_title;
use super::format_session;
use super::Sessions;
use crate::domain::models::Message;
use crate::domain::models::Role;
use crate::infrastructure::backends::scripted::session;
use crate::infrastructure::backends::scripted::Scripted;

fn sessions(backend: &Arc<Scripted>) -> Sessions {
    return Sessions::new(backend.clone());
}

#[test]
fn it_titles_from_a_short_message() {
    assert_eq!(default_title("  Plan a launch  "), "Plan a launch");
}

#[test]
fn it_truncates_long_titles() {
    assert_eq!(
        default_title("Help me plan the launch of our new analytics product"),
        "Help me plan the launch of our..."
    );
}

#[test]
fn it_truncates_on_char_boundaries() {
    let title = default_title(&"é".repeat(40));
    assert_eq!(title, format!("{}...", "é".repeat(30)));
}

#[test]
fn it_titles_empty_messages_with_a_timestamp() {
    let title = default_title("   ");
    assert!(title.starts_with("Chat Session "));
    assert_eq!(title.len(), "Chat Session 2024-03-01 10:00".len());
}

#[test]
fn it_formats_a_session() {
    let mut stored = session("s1", "Launch plan", 10);
    stored.message_count = 4;
    let updated = stored
        .updated_at
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string();

    assert_eq!(
        format_session(&stored),
        format!("- (ID: s1) {updated}, Launch plan, Messages: 4")
    );
}

#[test]
fn it_previews_the_first_user_message() {
    let mut stored = session("s1", "Launch plan", 10);
    stored.messages = vec![
        Message::new(Role::Bot, "Hi!"),
        Message::new(Role::User, "Plan a launch for acme.io\nwith a beta list"),
    ];

    assert!(format_session(&stored).ends_with(", Messages: 2, Plan a launch for acme.io"));
}

#[test]
fn it_formats_an_empty_session() {
    let stored = session("s1", "Launch plan", 10);
    assert!(format_session(&stored).ends_with(", Launch plan"));
}

#[tokio::test]
async fn it_lists_most_recent_first() -> Result<()> {
    let backend = Arc::new(Scripted::new(vec![]));
    {
        let mut stored = backend.sessions.lock().unwrap();
        stored.push(session("s1", "Older", 9));
        stored.push(session("s2", "Newest", 12));
        stored.push(session("s3", "Middle", 10));
        let mut other = session("s4", "Someone else", 13);
        other.user_id = "other".to_string();
        stored.push(other);
    }

    let res = sessions(&backend).list("tester").await?;

    let ids = res
        .iter()
        .map(|s| return s.session_id.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(ids, vec!["s2", "s3", "s1"]);

    return Ok(());
}

#[tokio::test]
async fn it_creates_with_a_title() -> Result<()> {
    let backend = Arc::new(Scripted::new(vec![]));

    let created = sessions(&backend).create("tester", " Launch ").await?;

    assert_eq!(created.session_id, "s1");
    assert_eq!(created.title, "Launch");

    return Ok(());
}

#[tokio::test]
async fn it_creates_with_a_default_title() -> Result<()> {
    let backend = Arc::new(Scripted::new(vec![]));

    let created = sessions(&backend).create("tester", "").await?;

    assert!(created.title.starts_with("Chat Session "));

    return Ok(());
}

#[tokio::test]
async fn it_loads_a_session() -> Result<()> {
    let backend = Arc::new(Scripted::new(vec![]));
    let mut stored = session("s7", "Launch plan", 10);
    stored.messages = vec![Message::new(Role::User, "hello")];
    backend.sessions.lock().unwrap().push(stored);

    let loaded = sessions(&backend).load("s7").await?;

    assert_eq!(loaded.title, "Launch plan");
    assert_eq!(loaded.messages.len(), 1);
    assert_eq!(
        loaded.updated_at,
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    );

    return Ok(());
}

#[tokio::test]
async fn it_fails_to_load_a_missing_session() {
    let backend = Arc::new(Scripted::new(vec![]));

    let res = sessions(&backend).load("missing").await;

    assert!(res.is_err());
}

#[tokio::test]
async fn it_renames_a_session() -> Result<()> {
    let backend = Arc::new(Scripted::new(vec![]));

    sessions(&backend).rename("s1", "New title ").await?;

    assert_eq!(
        backend.renamed.lock().unwrap().clone(),
        vec![("s1".to_string(), "New title".to_string())]
    );

    return Ok(());
}

#[tokio::test]
async fn it_rejects_an_empty_title() {
    let backend = Arc::new(Scripted::new(vec![]));

    let res = sessions(&backend).rename("s1", "  ").await;

    assert!(res.is_err());
    assert!(backend.renamed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn it_deletes_a_session() -> Result<()> {
    let backend = Arc::new(Scripted::new(vec![]));

    sessions(&backend).delete("s1").await?;

    assert_eq!(backend.deleted.lock().unwrap().clone(), vec!["s1".to_string()]);

    return Ok(());
}

#[tokio::test]
async fn it_surfaces_session_failures() {
    let backend = Arc::new(Scripted {
        fail_sessions: true,
        ..Scripted::new(vec![])
    });

    assert!(sessions(&backend).create("tester", "x").await.is_err());
    assert!(sessions(&backend).delete("s1").await.is_err());
    assert!(sessions(&backend).list("tester").await.is_err());
}

#[tokio::test]
async fn it_persists_messages() {
    let backend = Arc::new(Scripted::new(vec![]));

    sessions(&backend)
        .persist_message("s1", Role::User, "hello")
        .await;

    assert_eq!(
        backend.stored(),
        vec![("s1".to_string(), Role::User, "hello".to_string())]
    );
}

#[tokio::test]
async fn it_swallows_persistence_failures() {
    let backend = Arc::new(Scripted {
        fail_messages: true,
        ..Scripted::new(vec![])
    });

    sessions(&backend)
        .persist_message("s1", Role::Bot, "hi there")
        .await;

    assert!(backend.stored().is_empty());
}
