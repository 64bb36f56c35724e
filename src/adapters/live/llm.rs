//! Live adapter for the `LlmClient` port using the Anthropic messages API.

use std::env;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::BoxError;
use crate::ports::llm::{CompletionFuture, CompletionRequest, CompletionResponse, LlmClient};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Live LLM client that calls the Anthropic messages API.
///
/// The API key is read from `ANTHROPIC_API_KEY` on every call so a missing
/// key only fails runs that actually reach the oracle.
pub struct LiveLlmClient {
    client: Client,
    endpoint: String,
}

impl LiveLlmClient {
    /// Creates a client for the public Anthropic endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self::with_endpoint(ANTHROPIC_API_URL)
    }

    /// Creates a client posting to a custom endpoint (proxies, test servers).
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self { client: Client::new(), endpoint: endpoint.into() }
    }
}

impl Default for LiveLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    usage: Usage,
}

/// Only `text` blocks carry source; others (`thinking`, `tool_use`) are skipped.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl LlmClient for LiveLlmClient {
    fn complete(&self, request: &CompletionRequest) -> CompletionFuture<'_> {
        let request = request.clone();

        Box::pin(async move {
            let api_key = env::var(API_KEY_ENV)
                .map_err(|_| BoxError::from(format!("{API_KEY_ENV} environment variable not set")))?;

            let body = MessagesRequest {
                model: &request.model,
                max_tokens: request.max_tokens,
                system: request.system.as_deref(),
                messages: [Message { role: "user", content: &request.prompt }],
            };

            let response = self
                .client
                .post(&self.endpoint)
                .header("x-api-key", &api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body)
                .send()
                .await
                .map_err(|e| BoxError::from(format!("Anthropic API request failed: {e}")))?;

            let status = response.status();
            let text = response
                .text()
                .await
                .map_err(|e| BoxError::from(format!("Failed to read Anthropic API response: {e}")))?;
            parse_response(status, &text, request.max_tokens)
        })
    }
}

/// Turns a messages API reply into a completion.
///
/// A reply cut off at `max_tokens` is an error: a truncated file is never
/// a usable repair.
fn parse_response(
    status: StatusCode,
    body: &str,
    max_tokens: u32,
) -> Result<CompletionResponse, BoxError> {
    if !status.is_success() {
        let msg = serde_json::from_str::<ApiError>(body)
            .map_or_else(|_| body.to_string(), |e| e.error.message);
        return Err(format!("Anthropic API error ({}): {msg}", status.as_u16()).into());
    }

    let parsed: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| BoxError::from(format!("Failed to parse Anthropic API response: {e}")))?;
    if parsed.stop_reason.as_deref() == Some("max_tokens") {
        return Err(
            format!("completion truncated at {max_tokens} tokens; raise oracle.max_tokens").into()
        );
    }

    let text = parsed
        .content
        .into_iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
        .collect();
    Ok(CompletionResponse {
        text,
        prompt_tokens: parsed.usage.input_tokens,
        completion_tokens: parsed.usage.output_tokens,
    })
}
