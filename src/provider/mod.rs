// src/provider/mod.rs — Model provider layer

pub mod invoker;
pub mod openai_compat;

use async_trait::async_trait;

use crate::infra::errors::GavelError;

/// A remote text-completion endpoint. One implementation per provider
/// family; the pipeline only ever sees this trait.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    fn id(&self) -> &str;

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, GavelError>;
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
}
