//! Nutrition analysis: run the scripted conversation through the chat model.
//!
//! Zhipu's v4 API is OpenAI-shaped: a bearer token, a `model`, a list of
//! `{role, content}` messages, and `choices[0].message.content` back. The
//! reply is returned verbatim; all prompt wording lives in
//! [`crate::prompts`].

use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, Service};
use crate::pipeline::ocr::truncate;
use crate::prompts::nutrition_conversation;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Zhipu AI chat-completions endpoint.
pub const CHAT_COMPLETIONS_URL: &str = "https://open.bigmodel.cn/api/paas/v4/chat/completions";

/// Model used for the analysis.
pub const DEFAULT_MODEL: &str = "glm-4";

/// Speaker of a [`ChatMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Ask the chat model for a Markdown assessment of `nutrition_text`.
pub async fn analyze_nutrition(
    client: &reqwest::Client,
    config: &AdvisorConfig,
    nutrition_text: &str,
) -> Result<String, AdvisorError> {
    let messages = nutrition_conversation(nutrition_text);
    complete(client, config, &messages).await
}

/// Send `messages` and return the first choice's content.
pub async fn complete(
    client: &reqwest::Client,
    config: &AdvisorConfig,
    messages: &[ChatMessage],
) -> Result<String, AdvisorError> {
    let start = Instant::now();
    let request = ChatRequest {
        model: &config.model,
        messages,
        temperature: config.temperature,
    };

    let response = client
        .post(&config.chat_endpoint)
        .bearer_auth(config.credentials.api_key())
        .json(&request)
        .send()
        .await
        .map_err(|e| transport_error(e, config.request_timeout_secs))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(e, config.request_timeout_secs))?;

    if !status.is_success() {
        return Err(status_error(status, &body));
    }

    let content = parse_chat_response(&body)?;
    info!(
        "{} replied with {} chars in {}ms",
        config.model,
        content.chars().count(),
        start.elapsed().as_millis()
    );
    Ok(content)
}

/// Extract `choices[0].message.content` from a raw response body.
pub fn parse_chat_response(body: &str) -> Result<String, AdvisorError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| AdvisorError::MalformedResponse {
            service: Service::Chat,
            detail: format!("{e}: {}", truncate(body, 200)),
        })?;

    if let Some(usage) = parsed.usage {
        debug!(
            "{} input tokens, {} output tokens",
            usage.prompt_tokens, usage.completion_tokens
        );
    }

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| AdvisorError::MalformedResponse {
            service: Service::Chat,
            detail: "response has no choices[0].message.content".into(),
        })
}

fn status_error(status: StatusCode, body: &str) -> AdvisorError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|env| env.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| truncate(body, 200));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AdvisorError::AuthError {
            service: Service::Chat,
            detail,
        },
        StatusCode::TOO_MANY_REQUESTS => AdvisorError::RateLimitExceeded {
            service: Service::Chat,
            detail,
        },
        _ => AdvisorError::HttpStatus {
            service: Service::Chat,
            status: status.as_u16(),
            detail,
        },
    }
}

fn transport_error(e: reqwest::Error, timeout_secs: u64) -> AdvisorError {
    if e.is_timeout() {
        AdvisorError::Timeout {
            service: Service::Chat,
            secs: timeout_secs,
        }
    } else {
        AdvisorError::RequestFailed {
            service: Service::Chat,
            detail: e.to_string(),
        }
    }
}
