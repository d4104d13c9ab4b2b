use anyhow::{Context, Result};
use std::time::Duration;

/// Parameters for a single chat completion.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub top_p: f32,
}

/// A chat-capable language model the crew can talk to.
#[async_trait::async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;
    async fn chat(&self, request: ChatRequest) -> Result<String>;
}

/// HTTP client for the Ollama chat API.
pub struct OllamaClient {
    pub endpoint: String,
    pub model: String,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(endpoint: String, model: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
            client,
        })
    }
}

#[async_trait::async_trait]
impl ChatModel for OllamaClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat(&self, request: ChatRequest) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.user_prompt }
            ],
            "stream": false,
            "options": {
                "temperature": request.temperature,
                "top_p": request.top_p
            }
        });

        let response = self.client
            .post(format!("{}/api/chat", self.endpoint))
            .json(&body)
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama API error ({}): {}", status, error_text);
        }

        let response_json: serde_json::Value = response.json().await
            .context("Failed to parse Ollama response")?;

        let content = response_json["message"]["content"]
            .as_str()
            .context("No content in Ollama response")?
            .to_string();

        Ok(content)
    }
}
