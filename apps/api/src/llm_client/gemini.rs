//! Gemini `generateContent` backend.
//!
//! Handles plain prompts, system instructions, multi-turn contents and
//! function declarations (tool-calling mode). Retries on 429 and 5xx with
//! exponential backoff; every other non-success status fails immediately.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{
    ChatMessage, GenerationRequest, LlmError, ModelBackend, ModelReply, ToolCall, ToolDeclaration,
};

const API_KEY_HEADER: &str = "x-goog-api-key";

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTools>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTools {
    function_declarations: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_retries: u32,
    /// First retry delay; doubles on every further attempt.
    backoff: Duration,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: max_retries.max(1),
            backoff: Duration::from_secs(1),
        })
    }

    #[cfg(test)]
    fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ModelBackend for GeminiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<ModelReply, LlmError> {
        let body = build_request(request);
        let url = self.endpoint();
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = self.backoff * (1 << (attempt - 1).min(6));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .header(API_KEY_HEADER, &self.api_key)
                .json(&body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, super::preview(&body, 200));
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<GeminiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let parsed: GeminiResponse = response.json().await?;
            if let Some(usage) = &parsed.usage_metadata {
                debug!(
                    "LLM call succeeded: model={}, input_tokens={}, output_tokens={}",
                    self.model, usage.prompt_token_count, usage.candidates_token_count
                );
            }
            return interpret_response(parsed);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: self.max_retries,
        }))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Mapping
// ────────────────────────────────────────────────────────────────────────────

fn build_request(request: &GenerationRequest) -> GeminiRequest {
    let contents = request.messages.iter().map(to_content).collect();

    let system_instruction = request.system.as_ref().map(|system| GeminiContent {
        role: None,
        parts: vec![text_part(system)],
    });

    let tools = if request.tools.is_empty() {
        Vec::new()
    } else {
        vec![GeminiTools {
            function_declarations: request.tools.iter().map(function_declaration).collect(),
        }]
    };

    GeminiRequest {
        contents,
        system_instruction,
        tools,
        generation_config: GenerationConfig {
            temperature: request.temperature,
        },
    }
}

fn to_content(message: &ChatMessage) -> GeminiContent {
    match message {
        ChatMessage::User(text) => GeminiContent {
            role: Some("user".to_string()),
            parts: vec![text_part(text)],
        },
        ChatMessage::Assistant(text) => GeminiContent {
            role: Some("model".to_string()),
            parts: vec![text_part(text)],
        },
        ChatMessage::ToolRequest { calls, text } => GeminiContent {
            role: Some("model".to_string()),
            parts: text
                .iter()
                .map(|t| text_part(t))
                .chain(calls.iter().map(|call| GeminiPart {
                    function_call: Some(FunctionCall {
                        name: call.name.clone(),
                        args: json!({ "input": call.argument }),
                    }),
                    ..Default::default()
                }))
                .collect(),
        },
        ChatMessage::ToolObservation { name, output } => GeminiContent {
            role: Some("user".to_string()),
            parts: vec![GeminiPart {
                function_response: Some(FunctionResponse {
                    name: name.clone(),
                    response: json!({ "output": output }),
                }),
                ..Default::default()
            }],
        },
    }
}

fn text_part(text: &str) -> GeminiPart {
    GeminiPart {
        text: Some(text.to_string()),
        ..Default::default()
    }
}

fn function_declaration(tool: &ToolDeclaration) -> Value {
    json!({
        "name": tool.name,
        "description": tool.description,
        "parameters": {
            "type": "OBJECT",
            "properties": {
                "input": {
                    "type": "STRING",
                    "description": format!("{}: {}", tool.argument, tool.argument_description),
                }
            },
            "required": ["input"],
        }
    })
}

fn interpret_response(response: GeminiResponse) -> Result<ModelReply, LlmError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(LlmError::Blocked(reason));
    };

    let mut calls = Vec::new();
    let mut text = String::new();
    for part in candidate.content.parts {
        if let Some(call) = part.function_call {
            calls.push(ToolCall {
                argument: argument_from_args(&call.args),
                name: call.name,
            });
        } else if let Some(fragment) = part.text {
            text.push_str(&fragment);
        }
    }

    if !calls.is_empty() {
        let text = (!text.trim().is_empty()).then_some(text);
        return Ok(ModelReply::ToolCalls { calls, text });
    }

    if text.trim().is_empty() {
        return match candidate.finish_reason.as_deref() {
            Some(reason @ ("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT")) => {
                Err(LlmError::Blocked(reason.to_string()))
            }
            _ => Err(LlmError::EmptyContent),
        };
    }

    Ok(ModelReply::Text(text))
}

/// Tools take one string argument. The model usually sends `{"input": ...}`,
/// but any single string value is accepted.
fn argument_from_args(args: &Value) -> String {
    match args {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("input")
            .and_then(Value::as_str)
            .or_else(|| map.values().find_map(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| args.to_string()),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
