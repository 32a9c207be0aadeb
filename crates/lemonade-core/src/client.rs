use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ClientError;
use crate::state::ChatRole;

#[derive(Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: Option<CompletionResponseMessage>,
}

#[derive(Deserialize)]
struct CompletionResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Deserialize)]
struct ModelsResponse {
    data: Vec<ModelEntry>,
}

/// OpenAI-compatible client bound to one server address
#[derive(Clone)]
pub struct LemonadeClient {
    client: Client,
    base_url: String,
}

impl LemonadeClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_http(Client::new(), base_url)
    }

    /// Reuse an existing connection pool for a new address
    pub fn with_http(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Model ids in the order the server lists them
    pub async fn list_models(&self, path: &str) -> Result<Vec<String>, ClientError> {
        let url = self.url(path);
        debug!(%url, "listing models");

        let response = self.client.get(&url).send().await?;
        let response = ensure_success(response).await?;

        let body = response.text().await?;
        let models: ModelsResponse = serde_json::from_str(&body)?;
        Ok(models.data.into_iter().map(|m| m.id).collect())
    }

    /// Any success status counts; the body is ignored
    pub async fn check_health(&self, path: &str) -> Result<(), ClientError> {
        let url = self.url(path);
        debug!(%url, "checking health");

        let response = self.client.get(&url).send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    /// Send a single prompt, without history, and return the first choice's content
    pub async fn chat(&self, path: &str, model: &str, prompt: &str) -> Result<String, ClientError> {
        let url = self.url(path);
        debug!(%url, model, "sending chat completion");

        let request = CompletionRequest {
            model,
            messages: vec![CompletionMessage {
                role: ChatRole::User.as_str(),
                content: prompt,
            }],
            stream: false,
        };

        let response = self.client.post(&url).json(&request).send().await?;
        let response = ensure_success(response).await?;

        let body = response.text().await?;
        let completion: CompletionResponse = serde_json::from_str(&body)?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ClientError::ResponseShape("no completion content".to_string()))
    }
}

async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Protocol { status, body })
}
