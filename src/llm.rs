//! LLM client capability.
//!
//! Pipelines only ever see the [`LlmClient`] trait, so they stay model-agnostic.
//! [`RigLlmClient`] is the production implementation; timeouts and bounded
//! retries are applied uniformly by [`complete_with_policy`].

use crate::log_debug;
use crate::providers::{Provider, ProviderError};
use async_trait::async_trait;
use rig::client::builder::DynClientBuilder;
use rig::completion::Prompt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_retry::Retry;
use tokio_retry::strategy::ExponentialBackoff;

const NEGOTIATOR_PREAMBLE: &str = "You are Hagglz, an expert consumer advocate who negotiates \
    utility, medical, subscription and telecom bills on behalf of customers. \
    Follow the instructions in each request exactly and answer in plain text.";

/// Model selection for a single LLM call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub provider: Provider,
    pub model: String,
    pub temperature: f64,
}

impl ModelSettings {
    pub fn new(provider: Provider, model: impl Into<String>, temperature: f64) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
        }
    }

    /// Default generative settings for a provider at the given temperature
    pub fn generative(provider: Provider, temperature: f64) -> Self {
        Self::new(provider, provider.default_model(), temperature)
    }

    /// Deterministic classification settings for a provider
    pub fn classification(provider: Provider) -> Self {
        Self::new(provider, provider.default_classification_model(), 0.0)
    }
}

/// A single completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub settings: ModelSettings,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, settings: ModelSettings) -> Self {
        Self {
            prompt: prompt.into(),
            settings,
        }
    }
}

/// Errors raised by an LLM call
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("Provider error: {0}")]
    Provider(String),
    #[error("Provider timed out after {0:?}")]
    Timeout(Duration),
}

/// Capability wrapper issuing a completion for a prompt
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

/// Timeout and retry policy applied to every LLM call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    pub timeout: Duration,
    pub max_retries: usize,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_retries: 0,
        }
    }
}

/// Run a completion under the given policy.
///
/// Each attempt is bounded by `policy.timeout`; failed attempts are retried
/// with exponential backoff at most `policy.max_retries` times. The last
/// error is returned once the retries are exhausted.
pub async fn complete_with_policy(
    client: &dyn LlmClient,
    request: &CompletionRequest,
    policy: CallPolicy,
) -> Result<String, LlmError> {
    let retry_strategy = ExponentialBackoff::from_millis(10)
        .factor(2)
        .take(policy.max_retries);

    Retry::spawn(retry_strategy, || async move {
        match tokio::time::timeout(policy.timeout, client.complete(request)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => {
                log_debug!("LLM call to {} failed: {}", request.settings.model, e);
                Err(e)
            }
            Err(_) => {
                log_debug!("LLM call to {} timed out", request.settings.model);
                Err(LlmError::Timeout(policy.timeout))
            }
        }
    })
    .await
}

/// Production client backed by rig's dynamic provider clients.
///
/// Rig reads API keys from the provider environment variables
/// (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`).
#[derive(Debug, Clone)]
pub struct RigLlmClient {
    preamble: String,
}

impl Default for RigLlmClient {
    fn default() -> Self {
        Self {
            preamble: NEGOTIATOR_PREAMBLE.to_string(),
        }
    }
}

impl RigLlmClient {
    /// Create a client after checking that every provider it will be asked to
    /// use has an API key available.
    pub fn new(providers: &[Provider]) -> Result<Self, ProviderError> {
        for provider in providers {
            if !provider.has_api_key() {
                return Err(ProviderError::MissingApiKey {
                    provider: *provider,
                    env: provider.api_key_env(),
                });
            }
        }
        Ok(Self::default())
    }

    #[must_use]
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }

    /// Build the agent synchronously; `DynClientBuilder` is not `Send`
    fn build_agent(
        settings: &ModelSettings,
        preamble: &str,
    ) -> Result<rig::agent::Agent<impl rig::completion::CompletionModel + 'static>, LlmError> {
        let client_builder = DynClientBuilder::new();
        let agent = client_builder
            .agent(settings.provider.name(), &settings.model)
            .map_err(|e| LlmError::Provider(format!("Failed to create agent: {e}")))?
            .preamble(preamble)
            .temperature(settings.temperature)
            .build();
        Ok(agent)
    }
}

#[async_trait]
impl LlmClient for RigLlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        tracing::debug!(
            provider = %request.settings.provider,
            model = %request.settings.model,
            temperature = request.settings.temperature,
            "Prompting negotiation agent"
        );

        let agent = Self::build_agent(&request.settings, &self.preamble)?;
        let response = agent
            .prompt(request.prompt.as_str())
            .await
            .map_err(|e| LlmError::Provider(format!("{} API error: {e}", request.settings.provider)))?;

        Ok(response.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyClient {
        failures_before_success: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmClient for FlakyClient {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                Err(LlmError::Provider("rate limited".to_string()))
            } else {
                Ok("ok".to_string())
            }
        }
    }

    struct SlowClient;

    #[async_trait]
    impl LlmClient for SlowClient {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late".to_string())
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new("hello", ModelSettings::classification(Provider::OpenAI))
    }

    #[tokio::test]
    async fn test_no_retry_by_default() {
        let client = FlakyClient {
            failures_before_success: 1,
            calls: AtomicUsize::new(0),
        };
        let result = complete_with_policy(&client, &request(), CallPolicy::default()).await;
        assert!(matches!(result, Err(LlmError::Provider(_))));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bounded_retry_recovers() {
        let client = FlakyClient {
            failures_before_success: 2,
            calls: AtomicUsize::new(0),
        };
        let policy = CallPolicy {
            max_retries: 2,
            ..CallPolicy::default()
        };
        let result = complete_with_policy(&client, &request(), policy).await;
        assert_eq!(result.ok().as_deref(), Some("ok"));
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let policy = CallPolicy {
            timeout: Duration::from_millis(20),
            max_retries: 0,
        };
        let result = complete_with_policy(&SlowClient, &request(), policy).await;
        assert!(matches!(result, Err(LlmError::Timeout(_))));
    }
}
