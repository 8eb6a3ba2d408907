// src/infra/errors.rs — Error types for Gavel

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GavelError {
    // Provider errors (may be retriable)
    #[error("Provider '{provider}' error: {message}")]
    Provider {
        provider: String,
        message: String,
        retriable: bool,
    },

    #[error("Provider '{provider}' timed out after {timeout_ms}ms")]
    ProviderTimeout { provider: String, timeout_ms: u64 },

    // Parse errors: the model answered but no verdict could be extracted.
    // The raw response is kept for diagnostics.
    #[error("No verdict found in model response: {message}")]
    Parse { message: String, raw: String },

    // Resolution errors are fatal to a run
    #[error("Failed to resolve evaluation worklist: {0}")]
    Resolution(String),

    // User errors
    #[error("Invalid temperature {0}: must be within [0, 2]")]
    InvalidTemperature(f32),

    #[error("Invalid max_tokens {0}: must be positive")]
    InvalidMaxTokens(u32),

    #[error("Run '{0}' not found")]
    RunNotFound(String),

    // Infra
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GavelError {
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            GavelError::Provider {
                retriable: true,
                ..
            } | GavelError::ProviderTimeout { .. }
        )
    }
}
