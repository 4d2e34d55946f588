//! LLM interaction: send the playbook prompt and collect the Markdown.
//!
//! Prompt wording lives in [`crate::prompts`]; this module only sends it.
//!
//! ## Retry Strategy
//!
//! By default a failed call is reported straight back to the user
//! (`max_retries = 0`). When retries are configured, the wait doubles per
//! attempt: `retry_backoff_ms * 2^(attempt-1)`.

use crate::config::GenerationConfig;
use crate::document::GenerationStats;
use crate::error::PlaybookError;
use crate::prompts::DEFAULT_SYSTEM_PROMPT;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Markdown returned by the provider together with usage stats.
#[derive(Debug, Clone)]
pub struct Completion {
    pub markdown: String,
    pub stats: GenerationStats,
}

/// Send `prompt` to the provider and return the generated Markdown.
///
/// ## Message Layout
///
/// 1. **System message**: the house-style instruction (or user override)
/// 2. **User message**: the rendered form prompt
///
/// An answer whose text is empty or whitespace-only is
/// [`PlaybookError::EmptyResponse`].
pub async fn complete(
    provider: &Arc<dyn LLMProvider>,
    prompt: &str,
    config: &GenerationConfig,
) -> Result<Completion, PlaybookError> {
    let start = Instant::now();
    let system_prompt = config
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);

    let messages = vec![ChatMessage::system(system_prompt), ChatMessage::user(prompt)];
    let options = build_options(config);

    let mut last_err: Option<String> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = backoff_ms(config.retry_backoff_ms, attempt);
            warn!(
                "Retry {}/{} after {}ms",
                attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match provider.chat(&messages, Some(&options)).await {
            Ok(response) => {
                let duration = start.elapsed();
                debug!(
                    "{} input tokens, {} output tokens, {:?}",
                    response.prompt_tokens, response.completion_tokens, duration
                );

                if response.content.trim().is_empty() {
                    return Err(PlaybookError::EmptyResponse);
                }

                return Ok(Completion {
                    markdown: response.content,
                    stats: GenerationStats {
                        input_tokens: response.prompt_tokens as u64,
                        output_tokens: response.completion_tokens as u64,
                        duration_ms: duration.as_millis() as u64,
                        retries: attempt,
                    },
                });
            }
            Err(e) => {
                let err_msg = format!("{}", e);
                warn!("Attempt {} failed: {}", attempt + 1, err_msg);
                if attempt < config.max_retries {
                    if let Some(ref cb) = config.progress_callback {
                        cb.on_attempt_failed(attempt + 1, &err_msg);
                    }
                }
                last_err = Some(err_msg);
            }
        }
    }

    Err(PlaybookError::LlmApiError {
        message: last_err.unwrap_or_else(|| "Unknown error".to_string()),
    })
}

/// Wait before retry `attempt` (1-indexed): `base * 2^(attempt-1)`, saturating.
fn backoff_ms(base: u64, attempt: u32) -> u64 {
    base.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}

/// Build `CompletionOptions` from the generation config.
fn build_options(config: &GenerationConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{RecordingCallback, ScriptedProvider};
    use super::*;
    use edgequake_llm::{LLMResponse, MockProvider};

    #[test]
    fn build_options_defaults() {
        let config = GenerationConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.7));
        assert_eq!(opts.max_tokens, Some(4096));
    }

    #[test]
    fn build_options_follow_builder() {
        let config = GenerationConfig::builder()
            .temperature(0.2)
            .max_tokens(8000)
            .build()
            .unwrap();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.2));
        assert_eq!(opts.max_tokens, Some(8000));
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        assert_eq!(backoff_ms(500, 1), 500);
        assert_eq!(backoff_ms(500, 2), 1000);
        assert_eq!(backoff_ms(500, 4), 4000);
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        assert_eq!(backoff_ms(500, 64), u64::MAX);
        assert_eq!(backoff_ms(u64::MAX, 2), u64::MAX);
        assert_eq!(backoff_ms(500, u32::MAX), u64::MAX);
    }

    fn config_with(provider: Arc<dyn LLMProvider>) -> GenerationConfig {
        GenerationConfig::builder()
            .provider(provider)
            .retry_backoff_ms(1)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn provider_reply_becomes_markdown() {
        let mock = MockProvider::new();
        mock.add_response("## A\n- [ ] x").await;
        let provider: Arc<dyn LLMProvider> = Arc::new(mock);

        let done = complete(&provider, "prompt", &config_with(Arc::clone(&provider)))
            .await
            .unwrap();
        assert_eq!(done.markdown, "## A\n- [ ] x");
        assert_eq!(done.stats.retries, 0);
    }

    #[tokio::test]
    async fn whitespace_reply_is_empty_response() {
        let mock = MockProvider::new();
        mock.add_response("   \n").await;
        let provider: Arc<dyn LLMProvider> = Arc::new(mock);

        let err = complete(&provider, "prompt", &config_with(Arc::clone(&provider)))
            .await
            .unwrap_err();
        assert!(matches!(err, PlaybookError::EmptyResponse));
    }

    #[tokio::test]
    async fn retry_recovers_and_records_stats() {
        let scripted = Arc::new(ScriptedProvider::new(vec![
            Err("overloaded".into()),
            Ok(LLMResponse::new("# Playbook", "scripted-model").with_usage(1200, 800)),
        ]));
        let recorder = Arc::new(RecordingCallback::default());
        let provider: Arc<dyn LLMProvider> = scripted.clone();
        let config = GenerationConfig::builder()
            .provider(Arc::clone(&provider))
            .max_retries(2)
            .retry_backoff_ms(1)
            .progress_callback(recorder.clone())
            .build()
            .unwrap();

        let done = complete(&provider, "prompt", &config).await.unwrap();
        assert_eq!(done.markdown, "# Playbook");
        assert_eq!(done.stats.retries, 1);
        assert_eq!(done.stats.input_tokens, 1200);
        assert_eq!(done.stats.output_tokens, 800);
        assert_eq!(scripted.calls(), 2);

        let events = recorder.events();
        assert_eq!(events.len(), 1);
        assert!(events[0].starts_with("failed 1: "), "got {events:?}");
        assert!(events[0].contains("overloaded"));
    }

    #[tokio::test]
    async fn exhausted_retries_surface_last_provider_error() {
        let scripted = Arc::new(ScriptedProvider::new(vec![
            Err("first".into()),
            Err("second".into()),
        ]));
        let provider: Arc<dyn LLMProvider> = scripted.clone();
        let config = GenerationConfig::builder()
            .provider(Arc::clone(&provider))
            .max_retries(1)
            .retry_backoff_ms(1)
            .build()
            .unwrap();

        let err = complete(&provider, "prompt", &config).await.unwrap_err();
        match err {
            PlaybookError::LlmApiError { message } => assert!(message.contains("second"), "got {message}"),
            other => panic!("expected LlmApiError, got {other:?}"),
        }
        assert_eq!(scripted.calls(), 2);
    }
}
