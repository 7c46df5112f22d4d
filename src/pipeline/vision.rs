//! Vision description: one image plus one prompt in, free text out.
//!
//! Engines report a [`VisionCompletion`]; [`describe`] turns an empty
//! completion into [`NO_DESCRIPTION`]. That sentinel is a successful outcome:
//! callers see the same `Ok` path they would for a real description, and only
//! an `Err` means the call itself failed.
//!
//! No retries: a failed call fails the page (with fallback) or the flow.

use crate::config::GatewayConfig;
use crate::error::EngineError;
use crate::pipeline::encode;
use crate::prompts::AnalysisPrompt;
use async_trait::async_trait;
use edgequake_llm::{
    ChatMessage, CompletionOptions, ImageData, LLMProvider, LlmError, MistralProvider,
    ProviderFactory,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Returned when the vision call succeeds but produces no content.
pub const NO_DESCRIPTION: &str = "No description generated.";

const MISTRAL_PROVIDER: &str = "mistral";
const MISTRAL_EMBEDDING_MODEL: &str = "mistral-embed";

/// Outcome of a successful vision call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisionCompletion {
    /// The first completion's text.
    Described(String),
    /// The call succeeded with no completion choices.
    Empty,
}

/// Vision-model capability.
#[async_trait]
pub trait VisionEngine: Send + Sync {
    async fn complete(
        &self,
        image_data_uri: &str,
        prompt: &AnalysisPrompt,
    ) -> Result<VisionCompletion, EngineError>;
}

/// Describe one image, mapping an empty completion to [`NO_DESCRIPTION`].
pub async fn describe(
    engine: &dyn VisionEngine,
    image_data_uri: &str,
    prompt: &AnalysisPrompt,
) -> Result<String, EngineError> {
    match engine.complete(image_data_uri, prompt).await? {
        VisionCompletion::Described(text) => Ok(text),
        VisionCompletion::Empty => {
            debug!("Vision model returned no content for prompt {}", prompt.label());
            Ok(NO_DESCRIPTION.to_string())
        }
    }
}

/// [`VisionEngine`] backed by an edgequake-llm provider.
pub struct LlmVisionEngine {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
    timeout: Duration,
}

impl LlmVisionEngine {
    /// Wrap a pre-constructed provider.
    pub fn new(provider: Arc<dyn LLMProvider>, config: &GatewayConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
            timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }

    /// Override the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Instantiate the provider named in the config.
    ///
    /// Mistral shares the gateway credential with the OCR client. Any other
    /// provider reads its own credential from the environment.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, EngineError> {
        let not_configured = |e: LlmError| {
            EngineError::vision(
                None,
                format!(
                    "Vision provider '{}' is not configured: {e}",
                    config.vision_provider
                ),
            )
        };

        let provider: Arc<dyn LLMProvider> =
            if config.vision_provider.eq_ignore_ascii_case(MISTRAL_PROVIDER) {
                Arc::new(
                    MistralProvider::new(
                        config.api_key().to_string(),
                        config.vision_model.clone(),
                        MISTRAL_EMBEDDING_MODEL.to_string(),
                        None,
                    )
                    .map_err(not_configured)?,
                )
            } else {
                ProviderFactory::create_llm_provider(&config.vision_provider, &config.vision_model)
                    .map_err(not_configured)?
            };
        Ok(Self::new(provider, config))
    }
}

#[async_trait]
impl VisionEngine for LlmVisionEngine {
    async fn complete(
        &self,
        image_data_uri: &str,
        prompt: &AnalysisPrompt,
    ) -> Result<VisionCompletion, EngineError> {
        let (media_type, payload) = encode::split_data_uri(image_data_uri).ok_or_else(|| {
            EngineError::vision(None, "Image is not a base64 data URI")
        })?;

        let messages = vec![ChatMessage::user_with_images(
            prompt.text.as_str(),
            vec![ImageData::new(payload.to_string(), media_type).with_detail("high")],
        )];

        let start = Instant::now();
        let response = tokio::time::timeout(self.timeout, self.provider.chat(&messages, Some(&self.options)))
            .await
            .map_err(|_| {
                EngineError::vision(
                    Some(504),
                    format!("Vision call timed out after {}s", self.timeout.as_secs()),
                )
            })?
            .map_err(|e| EngineError::vision(None, e.to_string()))?;

        debug!(
            "Vision [{}]: {} input tokens, {} output tokens, {:?}",
            prompt.label(),
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        if response.content.trim().is_empty() {
            Ok(VisionCompletion::Empty)
        } else {
            Ok(VisionCompletion::Described(response.content))
        }
    }
}

/// Build `CompletionOptions` from the gateway config.
fn build_options(config: &GatewayConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
