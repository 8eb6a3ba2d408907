// src/provider/openai_compat.rs — Generic OpenAI-compatible provider
//
// Works against any /chat/completions endpoint with bearer auth:
// OpenAI, Groq, DeepSeek, Together, OpenRouter, local proxies.

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, ModelProvider};
use crate::infra::errors::GavelError;

pub struct OpenAICompatProvider {
    id_str: String,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAICompatProvider {
    pub fn new(id: impl Into<String>, api_key: String, base_url: String) -> Self {
        Self {
            id_str: id.into(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn provider_error(&self, message: String, retriable: bool) -> GavelError {
        GavelError::Provider {
            provider: self.id_str.clone(),
            message,
            retriable,
        }
    }
}

#[async_trait]
impl ModelProvider for OpenAICompatProvider {
    fn id(&self) -> &str {
        &self.id_str
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, GavelError> {
        let body = serde_json::json!({
            "model": request.model,
            "messages": [{"role": "user", "content": request.prompt}],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header(
                "User-Agent",
                format!("gavel/{}", env!("CARGO_PKG_VERSION")),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                // Transport-level failures (DNS, refused, reset) are worth
                // retrying; the request never reached a decision.
                self.provider_error(format!("Request failed: {e}"), true)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let retriable = status.as_u16() == 429 || status.is_server_error();
            return Err(self.provider_error(
                format!("HTTP {status}: {}", truncate(&body, 500)),
                retriable,
            ));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| self.provider_error(format!("Invalid response body: {e}"), false))?;

        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                self.provider_error("Response carried no message content".into(), false)
            })?
            .to_string();

        Ok(CompletionResponse { content })
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let p = OpenAICompatProvider::new("test", "key".into(), "http://x/v1/".into());
        assert_eq!(p.base_url, "http://x/v1");
    }

    #[test]
    fn test_truncate_multibyte_safe() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("ab", 10), "ab");
    }
}
