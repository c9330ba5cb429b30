use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::LlmError;
use crate::config::Config;
use crate::model::{Message, chat_messages};
use crate::providers::http_errors::request_error;

pub const CHAT_TIMEOUT_SECS: u64 = 30;
pub const MODELS_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Option<Vec<Choice>>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelListResponse {
    #[serde(default)]
    data: Option<Vec<ModelEntry>>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// Joins `path` onto `base_url` after dropping a single trailing slash.
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    let base = base_url.strip_suffix('/').unwrap_or(base_url);
    format!("{base}{path}")
}

fn api_error_message(error: Option<ApiErrorBody>) -> Option<String> {
    error
        .and_then(|body| body.message)
        .filter(|message| !message.is_empty())
}

pub async fn chat(
    client: &Client,
    cfg: &Config,
    system_prompt: &str,
    user_text: &str,
) -> Result<String, LlmError> {
    if !cfg.has_api_key() {
        warn!("chat request skipped, api key is not configured");
        return Err(LlmError::MissingCredentials);
    }

    let api_url = endpoint_url(&cfg.base_url, "/chat/completions");
    let body = ChatCompletionRequest {
        model: &cfg.model,
        messages: chat_messages(system_prompt, user_text),
    };
    debug!(
        api_url = %api_url,
        model = %cfg.model,
        input_len = user_text.len(),
        "sending chat completion request"
    );

    let response = client
        .post(&api_url)
        .bearer_auth(&cfg.api_key)
        .timeout(Duration::from_secs(CHAT_TIMEOUT_SECS))
        .json(&body)
        .send()
        .await
        .map_err(|err| {
            warn!(api_url = %api_url, model = %cfg.model, error = %err, "chat request failed");
            request_error(err, &api_url, CHAT_TIMEOUT_SECS)
        })?;

    let status = response.status();
    let raw = response
        .text()
        .await
        .map_err(|err| request_error(err, &api_url, CHAT_TIMEOUT_SECS))?;
    let parsed: ChatCompletionResponse = serde_json::from_str(&raw).map_err(|err| {
        warn!(
            api_url = %api_url,
            status = %status,
            response_body_len = raw.len(),
            "chat response is not valid json"
        );
        LlmError::Decode(err.to_string())
    })?;

    if let Some(message) = api_error_message(parsed.error) {
        warn!(status = %status, "chat api returned an error");
        return Err(LlmError::Api(message));
    }

    // `null` and missing collections read as empty.
    let first = parsed
        .choices
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or(LlmError::EmptyResponse)?;
    let content = first
        .message
        .and_then(|message| message.content)
        .unwrap_or_default();
    debug!(
        model = %cfg.model,
        response_len = content.len(),
        "received chat completion"
    );
    Ok(content)
}

pub async fn list_models(client: &Client, cfg: &Config) -> Result<Vec<String>, LlmError> {
    let api_url = endpoint_url(&cfg.base_url, "/models");
    debug!(api_url = %api_url, "fetching model list");

    let response = client
        .get(&api_url)
        .bearer_auth(&cfg.api_key)
        .timeout(Duration::from_secs(MODELS_TIMEOUT_SECS))
        .send()
        .await
        .map_err(|err| {
            warn!(api_url = %api_url, error = %err, "model list request failed");
            request_error(err, &api_url, MODELS_TIMEOUT_SECS)
        })?;

    let raw = response
        .text()
        .await
        .map_err(|err| request_error(err, &api_url, MODELS_TIMEOUT_SECS))?;
    let parsed: ModelListResponse =
        serde_json::from_str(&raw).map_err(|err| LlmError::Decode(err.to_string()))?;

    if let Some(message) = api_error_message(parsed.error) {
        return Err(LlmError::Api(message));
    }

    let models: Vec<String> = parsed
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|entry| entry.id)
        .collect();
    debug!(model_count = models.len(), "received model list");
    Ok(models)
}
