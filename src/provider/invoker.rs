// src/provider/invoker.rs — Single model call with validation and timing

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{CompletionRequest, ModelProvider};
use crate::infra::errors::GavelError;

/// Outcome of one model call.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub raw_text: String,
    pub latency_ms: u64,
}

/// Wraps a provider with parameter validation, end-to-end latency
/// measurement, and a per-call timeout. Does not retry: retry policy
/// belongs to the caller, and the pipeline records first failure as data.
#[derive(Clone)]
pub struct ModelInvoker {
    provider: Arc<dyn ModelProvider>,
    timeout: Duration,
}

impl ModelInvoker {
    pub fn new(provider: Arc<dyn ModelProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub async fn invoke(
        &self,
        prompt: &str,
        model_id: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Invocation, GavelError> {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(GavelError::InvalidTemperature(temperature));
        }
        if max_tokens == 0 {
            return Err(GavelError::InvalidMaxTokens(max_tokens));
        }

        let request = CompletionRequest {
            model: model_id.to_string(),
            prompt: prompt.to_string(),
            temperature,
            max_tokens,
        };

        let started = Instant::now();
        let result = tokio::time::timeout(self.timeout, self.provider.complete(request)).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(response)) => Ok(Invocation {
                raw_text: response.content,
                latency_ms,
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(GavelError::ProviderTimeout {
                provider: self.provider.id().to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}
