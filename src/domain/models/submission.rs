#[cfg(test)]
#[path = "submission_test.rs"]
mod tests;

use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;

static DOMAIN_RE: Lazy<Regex> =
    Lazy::new(|| return Regex::new(r"(?:https?://)?((?:[\w-]+\.)+[A-Za-z][\w-]*)").unwrap());

/// A single unit of user input sent to the crew backend as a job.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Submission {
    /// Identifies the submission in the events raised for it.
    pub seq: u64,
    pub text: String,
    pub image: Option<PathBuf>,
    pub audio: Option<PathBuf>,
    pub session_id: Option<String>,
    pub customer_domain: String,
    pub additional_context: String,
}

impl Submission {
    pub fn new(text: &str, fallback_domain: &str) -> Submission {
        let customer_domain = Submission::extract_domain(text)
            .unwrap_or_else(|| return fallback_domain.to_string());

        return Submission {
            text: text.to_string(),
            customer_domain,
            ..Default::default()
        };
    }

    /// First host-like token in the text, lowercased and without scheme or
    /// path. Unlike the web client, which kept the path, only the host is
    /// returned.
    pub fn extract_domain(text: &str) -> Option<String> {
        let caps = DOMAIN_RE.captures(text)?;
        return caps.get(1).map(|m| return m.as_str().to_lowercase());
    }

    pub fn has_attachments(&self) -> bool {
        return self.image.is_some() || self.audio.is_some();
    }

    pub fn input_type(&self) -> String {
        let mut parts = vec![];
        if !self.text.trim().is_empty() {
            parts.push("text");
        }
        if self.image.is_some() {
            parts.push("image");
        }
        if self.audio.is_some() {
            parts.push("audio");
        }
        if parts.is_empty() {
            return "text".to_string();
        }

        return parts.join("+");
    }

    /// The full text doubles as the project description.
    pub fn project_description(&self) -> String {
        return self.text.to_string();
    }
}
