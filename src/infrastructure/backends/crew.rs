#[cfg(test)]
#[path = "crew_test.rs"]
mod tests;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::multipart;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use tokio::fs;

use crate::domain::models::Backend;
use crate::domain::models::ClientError;
use crate::domain::models::JobId;
use crate::domain::models::JobStatusResponse;
use crate::domain::models::JobSubmitResponse;
use crate::domain::models::Role;
use crate::domain::models::Session;
use crate::domain::models::SessionCreateRequest;
use crate::domain::models::SessionCreated;
use crate::domain::models::SessionMessageRequest;
use crate::domain::models::SessionUpdateRequest;
use crate::domain::models::Submission;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CrewRequest {
    customer_input: String,
    input_type: String,
    additional_context: String,
    customer_domain: String,
    project_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
}

impl CrewRequest {
    fn from_submission(submission: &Submission) -> CrewRequest {
        return CrewRequest {
            customer_input: submission.text.to_string(),
            input_type: submission.input_type(),
            additional_context: submission.additional_context.to_string(),
            customer_domain: submission.customer_domain.to_string(),
            project_description: submission.project_description(),
            session_id: submission.session_id.clone(),
        };
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| return e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => return "image/png",
        "jpg" | "jpeg" => return "image/jpeg",
        "gif" => return "image/gif",
        "webp" => return "image/webp",
        "wav" => return "audio/wav",
        "mp3" => return "audio/mpeg",
        "m4a" => return "audio/mp4",
        "ogg" => return "audio/ogg",
        "webm" => return "audio/webm",
        _ => return "application/octet-stream",
    }
}

async fn file_part(path: &Path) -> Result<multipart::Part> {
    let bytes = fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| return name.to_string_lossy().to_string())
        .unwrap_or_else(|| return "upload".to_string());

    let part = multipart::Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(mime_for(path))?;

    return Ok(part);
}

pub struct Crew {
    url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl Crew {
    pub fn new(url: &str, timeout: Duration) -> Crew {
        return Crew {
            url: url.trim_end_matches('/').to_string(),
            timeout,
            client: reqwest::Client::new(),
        };
    }

    /// Sends a request, turning network failures and non 2xx responses into
    /// `ClientError::Transport`.
    async fn send(&self, req: RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let res = req
            .timeout(self.timeout)
            .send()
            .await
            .map_err(ClientError::from)?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| return e.error)
                .unwrap_or(body);

            tracing::error!(status = status.as_u16(), detail = %detail, "Failed to {what}");
            return Err(ClientError::Transport(format!(
                "Failed to {what}, status {}: {detail}",
                status.as_u16()
            ))
            .into());
        }

        return Ok(res);
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<T> {
        let res = self.send(req, what).await?;
        let body = res.text().await.map_err(ClientError::from)?;
        tracing::debug!(body = %body, "Response for {what}");

        let parsed = serde_json::from_str::<T>(&body).map_err(|err| {
            return ClientError::Transport(format!("Invalid response to {what}: {err}"));
        })?;

        return Ok(parsed);
    }

    async fn multipart_form(&self, submission: &Submission) -> Result<multipart::Form> {
        let req = CrewRequest::from_submission(submission);
        let mut form = multipart::Form::new()
            .text("customer_input", req.customer_input)
            .text("input_type", req.input_type)
            .text("additional_context", req.additional_context)
            .text("customer_domain", req.customer_domain)
            .text("project_description", req.project_description);

        if let Some(session_id) = req.session_id {
            form = form.text("session_id", session_id);
        }
        if let Some(image) = &submission.image {
            form = form.part("image", file_part(image).await?);
        }
        if let Some(audio) = &submission.audio {
            form = form.part("audio", file_part(audio).await?);
        }

        return Ok(form);
    }
}

#[async_trait]
impl Backend for Crew {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        let req = self.client.get(format!("{url}/health", url = self.url));
        self.send(req, "health check the crew backend").await?;

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn submit(&self, submission: &Submission) -> Result<JobId> {
        let mut req = self.client.post(format!("{url}/api/crew", url = self.url));
        if submission.has_attachments() {
            req = req.multipart(self.multipart_form(submission).await?);
        } else {
            req = req.json(&CrewRequest::from_submission(submission));
        }

        let res: JobSubmitResponse = self.send_json(req, "submit a crew job").await?;
        tracing::debug!(job_id = res.job_id.as_str(), "Submitted job");

        return Ok(res.job_id);
    }

    #[allow(clippy::implicit_return)]
    async fn job_status(&self, job_id: &JobId) -> Result<JobStatusResponse> {
        let req = self
            .client
            .get(format!("{url}/api/crew/{job_id}", url = self.url));

        return self.send_json(req, "fetch job status").await;
    }

    #[allow(clippy::implicit_return)]
    async fn create_session(&self, user_id: &str, title: &str) -> Result<SessionCreated> {
        let req = self
            .client
            .post(format!("{url}/api/sessions", url = self.url))
            .json(&SessionCreateRequest {
                user_id: user_id.to_string(),
                title: title.to_string(),
            });

        return self.send_json(req, "create a session").await;
    }

    #[allow(clippy::implicit_return)]
    async fn get_session(&self, session_id: &str) -> Result<Session> {
        let req = self
            .client
            .get(format!("{url}/api/sessions/{session_id}", url = self.url));

        return self.send_json(req, "load the session").await;
    }

    #[allow(clippy::implicit_return)]
    async fn update_session(&self, session_id: &str, title: &str) -> Result<()> {
        let req = self
            .client
            .put(format!("{url}/api/sessions/{session_id}", url = self.url))
            .json(&SessionUpdateRequest {
                title: title.to_string(),
            });
        self.send(req, "rename the session").await?;

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let req = self
            .client
            .delete(format!("{url}/api/sessions/{session_id}", url = self.url));
        self.send(req, "delete the session").await?;

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn list_user_sessions(&self, user_id: &str) -> Result<Vec<Session>> {
        let req = self
            .client
            .get(format!("{url}/api/users/{user_id}/sessions", url = self.url));

        return self.send_json(req, "list sessions").await;
    }

    #[allow(clippy::implicit_return)]
    async fn add_message(&self, session_id: &str, role: Role, content: &str) -> Result<()> {
        let req = self
            .client
            .post(format!(
                "{url}/api/sessions/{session_id}/messages",
                url = self.url
            ))
            .json(&SessionMessageRequest {
                role: role.wire_name().to_string(),
                content: content.to_string(),
            });
        self.send(req, "store the message").await?;

        return Ok(());
    }
}
