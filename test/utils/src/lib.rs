use std::env;

use serde_json::json;

pub fn insta_snapshot<F: FnOnce()>(f: F) {
    let mut settings = insta::Settings::clone_current();
    let snapshot_path = env::current_dir().unwrap().join("./test/snapshots");
    settings.set_snapshot_path(snapshot_path);
    settings.bind(f);
}

/// A session payload the way the crew backend serializes it, with naive
/// ISO-8601 timestamps and no timezone suffix.
pub fn session_fixture(session_id: &str, title: &str, updated_at: &str) -> serde_json::Value {
    return json!({
        "session_id": session_id,
        "user_id": "tester",
        "title": title,
        "created_at": "2024-03-01T09:00:00.000000",
        "updated_at": updated_at,
        "messages": [
            {
                "id": format!("{session_id}-m1"),
                "role": "user",
                "content": "Plan a landing page for acme.io\nwith a pricing table",
                "timestamp": "2024-03-01T09:00:05.123456"
            },
            {
                "id": format!("{session_id}-m2"),
                "role": "assistant",
                "content": "# Landing page\n\nStart with the hero section.",
                "timestamp": "2024-03-01T09:00:35"
            }
        ],
        "message_count": 2,
        "context": {},
        "ragflow_session_id": null
    });
}

pub fn titled_result_fixture() -> &'static str {
    return r#"{"title": "Project plan", "body": "1. Gather requirements\n2. Build the MVP"}"#;
}
