/// LLM Client: the single point of entry for all generation backend calls in Pakar.
///
/// ARCHITECTURAL RULE: No other module may talk to the generation API directly.
/// Stages, tools and the agent all receive a `&dyn ModelBackend`.
///
/// Each call is an atomic request/response; there is no streaming contract.
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub mod gemini;
#[cfg(test)]
pub mod mock;
pub mod prompts;

pub use gemini::GeminiClient;

/// Model used when `GEMINI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// BackendError: the generation call itself failed (network, auth, quota, payload).
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM response was blocked: {0}")]
    Blocked(String),

    #[error("LLM requested a tool call where plain text was expected")]
    UnexpectedToolCall,
}

/// A tool invocation requested by the model: a tool name and its single string argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCall {
    pub name: String,
    pub argument: String,
}

/// One entry of the structured message list sent in chat mode.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatMessage {
    User(String),
    Assistant(String),
    /// The model's own request for tool calls, replayed so the backend sees its
    /// observations in order. Carries any prose the model sent alongside.
    ToolRequest {
        calls: Vec<ToolCall>,
        text: Option<String>,
    },
    ToolObservation { name: String, output: String },
}

/// The externally visible description of a tool: name, one-line usage, single string argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub argument: String,
    pub argument_description: String,
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Sampling temperature, clamped to [0, 1] when the request is built.
    pub temperature: f32,
    pub system: Option<String>,
    pub messages: Vec<ChatMessage>,
    /// Non-empty only in tool-calling mode.
    pub tools: Vec<ToolDeclaration>,
}

impl GenerationRequest {
    /// A single rendered prompt with no system instruction and no tools.
    pub fn prompt(text: impl Into<String>, temperature: f32) -> Self {
        Self {
            temperature: temperature.clamp(0.0, 1.0),
            system: None,
            messages: vec![ChatMessage::User(text.into())],
            tools: Vec::new(),
        }
    }

    /// A structured conversation, optionally in tool-calling mode.
    pub fn chat(
        system: impl Into<String>,
        messages: Vec<ChatMessage>,
        tools: Vec<ToolDeclaration>,
        temperature: f32,
    ) -> Self {
        Self {
            temperature: temperature.clamp(0.0, 1.0),
            system: Some(system.into()),
            messages,
            tools,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    Text(String),
    /// A tool-calling directive. Some backends attach interim prose to it.
    ToolCalls {
        calls: Vec<ToolCall>,
        text: Option<String>,
    },
}

impl ModelReply {
    /// Plain-prompt mode: returns the text, or interim text attached to an unexpected tool call.
    pub fn into_text(self) -> Result<String, LlmError> {
        match self {
            ModelReply::Text(text) => Ok(text),
            ModelReply::ToolCalls {
                text: Some(text), ..
            } if !text.trim().is_empty() => Ok(text),
            ModelReply::ToolCalls { .. } => Err(LlmError::UnexpectedToolCall),
        }
    }
}

/// The generation backend. Implemented by `GeminiClient` and by the scripted test double.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Model identifier, for logging.
    fn model(&self) -> &str;

    async fn generate(&self, request: &GenerationRequest) -> Result<ModelReply, LlmError>;
}

/// Convenience for free-text stages and tools: one prompt in, one text out.
pub async fn complete_text(
    llm: &dyn ModelBackend,
    prompt: &str,
    temperature: f32,
) -> Result<String, LlmError> {
    let text = llm
        .generate(&GenerationRequest::prompt(prompt, temperature))
        .await?
        .into_text()?;
    if text.trim().is_empty() {
        return Err(LlmError::EmptyContent);
    }
    Ok(text)
}

/// Shortens model text for log lines.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        out.push('…');
    }
    out
}
