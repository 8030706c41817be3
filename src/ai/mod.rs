/// AI provider module
///
/// HTTP clients for the hosted language models, the prompt they are given,
/// and the parser that turns their replies into suggestions.

pub mod gemini;
pub mod http;
pub mod openai;
pub mod parser;
pub mod prompts;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use parser::parse_reply;

use crate::config::{ProviderChoice, Settings};
use crate::core::{ProviderError, SuggestionProvider};

/// Build the provider for one AI service from settings
///
/// # Returns
/// * `Ok(None)` - The choice isn't an AI service, or it has no key
pub fn build_provider(
    choice: ProviderChoice,
    settings: &Settings,
) -> Result<Option<Box<dyn SuggestionProvider>>, ProviderError> {
    let Some(key) = settings.api_key(choice) else {
        return Ok(None);
    };

    let provider: Box<dyn SuggestionProvider> = match choice {
        ProviderChoice::OpenAi => Box::new(OpenAiProvider::new(
            key,
            settings.model(choice),
            settings.openai_base_url.as_str(),
            settings.ai_timeout,
        )?),
        ProviderChoice::Gemini => Box::new(GeminiProvider::new(
            key,
            settings.model(choice),
            settings.gemini_base_url.as_str(),
            settings.ai_timeout,
        )?),
        ProviderChoice::Fallback => return Ok(None),
    };

    Ok(Some(provider))
}
