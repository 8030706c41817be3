/// Google Gemini provider (generateContent REST endpoint)

use crate::ai::http::{build_client, post_json};
use crate::ai::parser::parse_reply;
use crate::ai::prompts::combined_prompt;
use crate::core::{ProviderError, ProviderKind, Suggestion, SuggestionProvider};
use crate::shell::Shell;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().map(|p| p.text).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiProvider {
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
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl SuggestionProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Ai
    }

    async fn suggest(&self, query: &str, shell_hint: Shell) -> Result<Suggestion, ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::Unauthenticated("no Gemini API key".to_string()));
        }

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: combined_prompt(query, shell_hint),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.1,
                max_output_tokens: 500,
            },
        };

        debug!(model = %self.model, "Asking Gemini");
        let request = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key);
        let response: GenerateResponse = post_json(request, &body, self.timeout).await?;

        let content = response
            .text()
            .ok_or_else(|| ProviderError::MalformedResponse("reply has no text".to_string()))?;

        parse_reply(&content, shell_hint)
    }
}
