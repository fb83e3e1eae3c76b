//! Chat brokering to hosted language models.

pub mod completion;
pub mod providers;
pub mod suggestions;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{error, info};

use crate::core::config::ChatConfig;
use completion::ChatCompletionProvider;

#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Prompt the scan context is appended to.
    fn base_prompt(&self) -> &str;

    async fn complete(&self, system_prompt: &str, message: &str) -> Result<String>;
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ChatReply {
    pub response: String,
    pub suggestions: Vec<String>,
}

pub fn system_prompt(base: &str, context: Option<&str>) -> String {
    match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(context) => format!("{}\n\nContext from scan results:\n{}", base, context),
        None => base.to_string(),
    }
}

/// Picks a provider and key per request and forwards the message.
#[derive(Clone)]
pub struct ChatBroker {
    keys: ChatConfig,
    client: Client,
}

impl ChatBroker {
    pub fn new(keys: ChatConfig) -> Self {
        Self {
            keys,
            client: Client::new(),
        }
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        let def = providers::select(request.provider.as_deref());
        let api_key = request
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.keys.key_for(def.id))
            .ok_or_else(|| anyhow!("No API key configured for {}", def.id))?
            .to_string();

        let provider = ChatCompletionProvider::new(def, api_key, self.client.clone());
        self.chat_with(&provider, request).await
    }

    pub async fn chat_with(
        &self,
        provider: &dyn ChatProvider,
        request: &ChatRequest,
    ) -> Result<ChatReply> {
        info!("Forwarding chat message to {}", provider.name());
        let response = provider
            .complete(
                &system_prompt(provider.base_prompt(), request.context.as_deref()),
                &request.message,
            )
            .await
            .inspect_err(|e| error!("{} chat failed: {}", provider.name(), e))?;
        let suggestions = suggestions::extract_suggestions(&response);
        Ok(ChatReply {
            response,
            suggestions,
        })
    }
}
