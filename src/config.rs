//! Configuration for playbook generation.
//!
//! All generation behaviour is controlled through [`GenerationConfig`], built
//! via its [`GenerationConfigBuilder`]. One struct means one thing to share
//! between HTTP handlers and one thing to log when a run misbehaves.

use crate::error::PlaybookError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Model used when a provider is picked without naming a model.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Configuration for a generation call.
///
/// # Example
/// ```rust
/// use edgequake_playbook::GenerationConfig;
///
/// let config = GenerationConfig::builder()
///     .model("claude-sonnet-4-20250514")
///     .max_tokens(4096)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`] or the provider
    /// default when auto-detected.
    pub model: Option<String>,

    /// LLM provider name (e.g. "anthropic", "openai", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.7.
    ///
    /// A playbook is prose, not transcription; some variety in wording is
    /// wanted, but tables and checklists still need to come out well-formed.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 4096.
    ///
    /// A seven-section playbook with four tables lands around 2 500 tokens;
    /// too low a limit truncates the closing sections mid-table.
    pub max_tokens: usize,

    /// Retries on a failed provider call. Default: 0.
    ///
    /// A failure is normally surfaced to the user unchanged; raise this for
    /// batch runs against a flaky endpoint.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Custom system prompt. If None, uses the built-in default.
    pub system_prompt: Option<String>,

    /// Progress events for the generation call.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.7,
            max_tokens: 4096,
            max_retries: 0,
            retry_backoff_ms: 500,
            system_prompt: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
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

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, PlaybookError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(PlaybookError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.temperature.is_nan() {
            return Err(PlaybookError::InvalidConfig(
                "temperature must be a number".into(),
            ));
        }
        if let Some(ref p) = c.system_prompt {
            if p.trim().is_empty() {
                return Err(PlaybookError::InvalidConfig(
                    "system prompt must not be empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}
