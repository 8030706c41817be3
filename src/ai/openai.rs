/// OpenAI chat-completions provider

use crate::ai::http::{build_client, post_json};
use crate::ai::parser::parse_reply;
use crate::ai::prompts::{user_prompt, SYSTEM_PROMPT};
use crate::core::{ProviderError, ProviderKind, Suggestion, SuggestionProvider};
use crate::shell::Shell;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAiProvider {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl SuggestionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Ai
    }

    async fn suggest(&self, query: &str, shell_hint: Shell) -> Result<Suggestion, ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::Unauthenticated("no OpenAI API key".to_string()));
        }

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt(query, shell_hint),
                },
            ],
            temperature: 0.1,
            max_tokens: 500,
        };

        debug!(model = %self.model, "Asking OpenAI");
        let request = self.client.post(self.endpoint()).bearer_auth(&self.api_key);
        let response: ChatResponse = post_json(request, &body, self.timeout).await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::MalformedResponse("reply has no choices".to_string()))?;

        parse_reply(&content, shell_hint)
    }
}
