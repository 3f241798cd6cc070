/*!
 * Core translation service implementation.
 *
 * This module contains the `Translator` capability used by every document
 * handler, and `TranslationService`, its implementation backed by an
 * OpenAI-compatible completion endpoint.
 */

use async_trait::async_trait;
use log::debug;
use std::time::Duration;

use crate::app_config::TranslationConfig;
use crate::errors::TranslationError;
use crate::language_utils::target_language_label;
use crate::providers::Provider;
use crate::providers::openai::{OpenAI, OpenAIRequest};
use super::prompts::PromptTemplate;

/// Anything that can turn one block of text into the target language.
///
/// Handlers receive this by reference so tests can substitute a stub.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target_language`, returning the trimmed result
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, TranslationError>;
}

/// Main translation service: one remote call per text unit, no batching
#[derive(Debug)]
pub struct TranslationService {
    /// Chat completion client
    client: OpenAI,

    /// Model name
    model: String,

    /// Temperature for every request
    temperature: f32,

    /// Output length cap for every request
    max_tokens: u32,

    /// Prompt pair
    prompt: PromptTemplate,
}

impl TranslationService {
    /// Create a new translation service with the given configuration
    pub fn new(config: &TranslationConfig) -> Self {
        let client = OpenAI::new_with_config(
            config.api_key.clone(),
            config.endpoint.clone(),
            config.retry_count,
            config.retry_backoff_ms,
            Duration::from_secs(config.timeout_secs),
        );

        Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            prompt: PromptTemplate::new(config.system_prompt.clone(), config.user_prompt.clone()),
        }
    }

    /// Build the completion request for one unit
    pub fn build_request(&self, text: &str, target_language: &str) -> OpenAIRequest {
        let label = target_language_label(target_language);
        OpenAIRequest::new(self.model.clone())
            .add_message("system", self.prompt.system())
            .add_message("user", self.prompt.render(&label, text))
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
    }
}

#[async_trait]
impl Translator for TranslationService {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, TranslationError> {
        let request = self.build_request(text, target_language);
        let response = self.client.complete(request).await?;

        if let Some(usage) = &response.usage {
            debug!(
                "Completion used {} prompt + {} completion tokens",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        let translated = OpenAI::extract_text(&response).trim().to_string();
        if translated.is_empty() {
            return Err(TranslationError::EmptyResponse);
        }

        Ok(translated)
    }
}
