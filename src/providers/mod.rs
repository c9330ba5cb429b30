pub(crate) mod http_errors;
pub mod openai;

use thiserror::Error;

/// Failures of a single request against the chat API.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API key is not set. Run 'trans -a <base_url>,<api_key>' to configure it.")]
    MissingCredentials,

    #[error("{0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("API returned no choices")]
    EmptyResponse,

    #[error("Failed to decode API response: {0}")]
    Decode(String),
}
