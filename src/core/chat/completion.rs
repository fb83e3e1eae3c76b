use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::ChatProvider;
use super::providers::{ProviderDef, TEMPERATURE};

// ── OpenAI-compatible request/response ──

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessageOwned,
}

#[derive(Deserialize)]
struct CompletionMessageOwned {
    content: String,
}

/// Any endpoint speaking the OpenAI chat-completions format.
pub struct ChatCompletionProvider {
    def: ProviderDef,
    api_key: String,
    client: Client,
}

impl ChatCompletionProvider {
    pub fn new(def: ProviderDef, api_key: String, client: Client) -> Self {
        Self {
            def,
            api_key,
            client,
        }
    }
}

#[async_trait]
impl ChatProvider for ChatCompletionProvider {
    fn name(&self) -> &str {
        self.def.name
    }

    fn base_prompt(&self) -> &str {
        self.def.system_prompt
    }

    async fn complete(&self, system_prompt: &str, message: &str) -> Result<String> {
        let req = CompletionRequest {
            model: self.def.model,
            messages: vec![
                CompletionMessage {
                    role: "system",
                    content: system_prompt,
                },
                CompletionMessage {
                    role: "user",
                    content: message,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: self.def.max_tokens,
        };

        let mut request = self
            .client
            .post(&self.def.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&req);
        for (name, value) in &self.def.extra_headers {
            request = request.header(*name, *value);
        }

        let res = request
            .send()
            .await
            .map_err(|e| anyhow!("Failed to connect to {}: {}", self.def.name, e))?;
        let status = res.status();
        if !status.is_success() {
            return Err(anyhow!(
                "{} API error: {} - {}",
                self.def.name,
                status.as_u16(),
                res.text().await.unwrap_or_default()
            ));
        }
        let parsed: CompletionResponse = res.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow!("{} returned no choices", self.def.name))
    }
}
