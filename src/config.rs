//! Configuration for the analysis gateway.
//!
//! Every knob lives in [`GatewayConfig`], built via [`GatewayConfigBuilder`]
//! or loaded from the environment with [`GatewayConfig::from_env`]. The
//! credential check happens in [`GatewayConfigBuilder::build`], so a process
//! holding a `GatewayConfig` is known to be able to talk to its upstreams.

use crate::error::ConfigError;
use crate::prompts::PromptSet;
use std::fmt;

/// Environment variable holding the upstream API credential.
pub const API_KEY_ENV: &str = "MISTRAL_API_KEY";

/// Default OCR endpoint.
pub const DEFAULT_OCR_ENDPOINT: &str = "https://api.mistral.ai/v1/ocr";

/// Configuration for the analysis gateway.
///
/// # Example
/// ```rust
/// use edgequake_ocr_gateway::GatewayConfig;
///
/// let config = GatewayConfig::builder()
///     .api_key("sk-test")
///     .vision_concurrency(4)
///     .build()
///     .unwrap();
/// assert_eq!(config.vision_concurrency, 4);
/// ```
#[derive(Clone)]
pub struct GatewayConfig {
    /// Bearer credential for the OCR endpoint. Required.
    pub api_key: Option<String>,

    /// OCR endpoint URL. Default: [`DEFAULT_OCR_ENDPOINT`].
    pub ocr_endpoint: String,

    /// OCR model identifier. Default: `mistral-ocr-latest`.
    pub ocr_model: String,

    /// edgequake-llm provider name for the vision model. Default: `mistral`.
    pub vision_provider: String,

    /// Vision model identifier. Default: `pixtral-12b-2409`.
    pub vision_model: String,

    /// Sampling temperature for vision completions. Default: 0.1.
    pub temperature: f32,

    /// Maximum tokens per vision completion. Default: 4096.
    pub max_tokens: usize,

    /// Number of per-page vision calls in flight during enrichment. Default: 1.
    ///
    /// 1 issues calls strictly one after another. Output page order is
    /// preserved at any value.
    pub vision_concurrency: usize,

    /// Timeout for downloading the source document, in seconds. Default: 120.
    pub fetch_timeout_secs: u64,

    /// Timeout for each OCR or vision call, in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Prompts sent to the vision model.
    pub prompts: PromptSet,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            ocr_endpoint: DEFAULT_OCR_ENDPOINT.to_string(),
            ocr_model: "mistral-ocr-latest".to_string(),
            vision_provider: "mistral".to_string(),
            vision_model: "pixtral-12b-2409".to_string(),
            temperature: 0.1,
            max_tokens: 4096,
            vision_concurrency: 1,
            fetch_timeout_secs: 120,
            api_timeout_secs: 120,
            prompts: PromptSet::default(),
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("ocr_endpoint", &self.ocr_endpoint)
            .field("ocr_model", &self.ocr_model)
            .field("vision_provider", &self.vision_provider)
            .field("vision_model", &self.vision_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("vision_concurrency", &self.vision_concurrency)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("prompts", &(self.prompts.page_analysis.label(), self.prompts.image_description.label()))
            .finish()
    }
}

impl GatewayConfig {
    /// Create a new builder for `GatewayConfig`.
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder {
            config: Self::default(),
        }
    }

    /// Load configuration from the process environment.
    ///
    /// Reads [`API_KEY_ENV`] (required) plus the optional
    /// `OCR_GATEWAY_OCR_ENDPOINT`, `OCR_GATEWAY_OCR_MODEL`,
    /// `OCR_GATEWAY_VISION_PROVIDER` and `OCR_GATEWAY_VISION_MODEL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut builder = Self::builder();
        if let Some(key) = get(API_KEY_ENV) {
            builder = builder.api_key(key);
        }
        if let Some(endpoint) = get("OCR_GATEWAY_OCR_ENDPOINT") {
            builder = builder.ocr_endpoint(endpoint);
        }
        if let Some(model) = get("OCR_GATEWAY_OCR_MODEL") {
            builder = builder.ocr_model(model);
        }
        if let Some(provider) = get("OCR_GATEWAY_VISION_PROVIDER") {
            builder = builder.vision_provider(provider);
        }
        if let Some(model) = get("OCR_GATEWAY_VISION_MODEL") {
            builder = builder.vision_model(model);
        }
        builder.build()
    }

    /// The credential; [`build`](GatewayConfigBuilder::build) guarantees presence.
    pub fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }
}

/// Builder for [`GatewayConfig`].
#[derive(Debug)]
pub struct GatewayConfigBuilder {
    config: GatewayConfig,
}

impl GatewayConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn ocr_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.ocr_endpoint = url.into();
        self
    }

    pub fn ocr_model(mut self, model: impl Into<String>) -> Self {
        self.config.ocr_model = model.into();
        self
    }

    pub fn vision_provider(mut self, name: impl Into<String>) -> Self {
        self.config.vision_provider = name.into();
        self
    }

    pub fn vision_model(mut self, model: impl Into<String>) -> Self {
        self.config.vision_model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn vision_concurrency(mut self, n: usize) -> Self {
        self.config.vision_concurrency = n.max(1);
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn prompts(mut self, prompts: PromptSet) -> Self {
        self.config.prompts = prompts;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GatewayConfig, ConfigError> {
        let c = &self.config;
        if c.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(ConfigError::MissingCredential {
                var: API_KEY_ENV.to_string(),
            });
        }
        if url::Url::parse(&c.ocr_endpoint).is_err() {
            return Err(ConfigError::Invalid(format!(
                "OCR endpoint is not an absolute URL: '{}'",
                c.ocr_endpoint
            )));
        }
        if c.fetch_timeout_secs == 0 || c.api_timeout_secs == 0 {
            return Err(ConfigError::Invalid("Timeouts must be ≥ 1 second".into()));
        }
        if c.max_tokens == 0 {
            return Err(ConfigError::Invalid("max_tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn build_requires_credential() {
        let err = GatewayConfig::builder().build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential { ref var } if var == API_KEY_ENV));

        let err = GatewayConfig::builder().api_key("  ").build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential { .. }));
    }

    #[test]
    fn defaults() {
        let c = GatewayConfig::builder().api_key("k").build().unwrap();
        assert_eq!(c.ocr_endpoint, DEFAULT_OCR_ENDPOINT);
        assert_eq!(c.vision_provider, "mistral");
        assert_eq!(c.vision_concurrency, 1);
        assert_eq!(c.api_key(), "k");
    }

    #[test]
    fn builder_clamps() {
        let c = GatewayConfig::builder()
            .api_key("k")
            .temperature(9.0)
            .vision_concurrency(0)
            .build()
            .unwrap();
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.vision_concurrency, 1);
    }

    #[test]
    fn rejects_bad_endpoint_and_zero_timeout() {
        let err = GatewayConfig::builder()
            .api_key("k")
            .ocr_endpoint("not-a-url")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = GatewayConfig::builder()
            .api_key("k")
            .fetch_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn from_lookup_reads_overrides() {
        let env: HashMap<&str, &str> = [
            (API_KEY_ENV, "secret"),
            ("OCR_GATEWAY_VISION_MODEL", "pixtral-large-latest"),
            ("OCR_GATEWAY_OCR_MODEL", ""),
        ]
        .into_iter()
        .collect();
        let c = GatewayConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(c.api_key(), "secret");
        assert_eq!(c.vision_model, "pixtral-large-latest");
        // Empty values fall back to defaults.
        assert_eq!(c.ocr_model, "mistral-ocr-latest");
    }

    #[test]
    fn from_lookup_without_credential_fails() {
        let err = GatewayConfig::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential { .. }));
    }

    #[test]
    fn debug_redacts_credential() {
        let c = GatewayConfig::builder().api_key("sk-very-secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("sk-very-secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
