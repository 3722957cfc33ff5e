#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use std::path::PathBuf;

use chrono::DateTime;
use chrono::Utc;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use uuid::Uuid;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "assistant")]
    Bot,
}

impl Role {
    /// Role name the crew backend stores messages under.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Role::User => return "user",
            Role::Bot => return "assistant",
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    #[default]
    Normal,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(with = "super::timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<PathBuf>,
    #[serde(skip)]
    mtype: MessageType,
}

impl Message {
    pub fn new(role: Role, text: &str) -> Message {
        return Message {
            id: Uuid::new_v4().to_string(),
            role,
            content: text.to_string(),
            timestamp: Utc::now(),
            image: None,
            audio: None,
            mtype: MessageType::Normal,
        };
    }

    pub fn new_with_type(role: Role, mtype: MessageType, text: &str) -> Message {
        let mut msg = Message::new(role, text);
        msg.mtype = mtype;
        return msg;
    }

    pub fn with_attachments(mut self, image: Option<PathBuf>, audio: Option<PathBuf>) -> Message {
        self.image = image;
        self.audio = audio;
        return self;
    }

    pub fn message_type(&self) -> MessageType {
        return self.mtype;
    }

    pub fn has_attachments(&self) -> bool {
        return self.image.is_some() || self.audio.is_some();
    }

    /// Single line preview, cut at `max_chars` characters.
    pub fn preview(&self, max_chars: usize) -> String {
        let line = self.content.split('\n').next().unwrap_or_default().trim();
        if line.chars().count() <= max_chars {
            return line.to_string();
        }

        let cut = line
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        return format!("{cut}...");
    }
}
