use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Endpoint used when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5001/api/chat";

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    answer: String,
}

/// Client for the question-answering backend.
///
/// One `ask` is one `POST` with `{"message": ..}`; the backend replies with
/// `{"answer": ..}`. No timeout is set, so a hung backend hangs the call.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: String,
}

impl ChatClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn ask(&self, message: &str) -> Result<String> {
        tracing::debug!(endpoint = %self.endpoint, chars = message.chars().count(), "sending question");

        let response = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .json(&ChatRequest { message })
            .send()
            .await
            .with_context(|| format!("request to {} failed", self.endpoint))?;

        let status = response.status();
        tracing::debug!(%status, "backend responded");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::debug!(body = %text, "error body");
            return Err(anyhow!("backend error {}", status));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("could not decode answer from backend")?;
        Ok(chat_response.answer)
    }
}
