//! Scripted generation backend for tests. Replies come from a closure over the
//! request; every request is recorded for later assertions.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{ChatMessage, GenerationRequest, LlmError, ModelBackend, ModelReply, ToolCall};

type Responder = dyn Fn(&GenerationRequest) -> Result<ModelReply, LlmError> + Send + Sync;

#[derive(Clone)]
pub struct MockBackend {
    responder: Arc<Responder>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl MockBackend {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&GenerationRequest) -> Result<ModelReply, LlmError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always answers with the same text.
    pub fn replying(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Ok(ModelReply::Text(text.clone())))
    }

    /// Always fails as if the backend were unreachable.
    pub fn failing() -> Self {
        Self::new(|_| {
            Err(LlmError::Api {
                status: 503,
                message: "backend unavailable".to_string(),
            })
        })
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Requests sent in tool-calling mode, i.e. the agent's decide/observe rounds.
    pub fn agent_requests(&self) -> Vec<GenerationRequest> {
        self.requests()
            .into_iter()
            .filter(|r| !r.tools.is_empty())
            .collect()
    }
}

#[async_trait]
impl ModelBackend for MockBackend {
    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<ModelReply, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.responder)(request)
    }
}

/// Text of the first user message of a request (the rendered prompt in plain mode).
pub fn first_user_text(request: &GenerationRequest) -> &str {
    request
        .messages
        .iter()
        .find_map(|m| match m {
            ChatMessage::User(text) => Some(text.as_str()),
            _ => None,
        })
        .unwrap_or_default()
}

/// Whether the request already carries tool observations (i.e. a resubmission).
pub fn has_observations(request: &GenerationRequest) -> bool {
    request
        .messages
        .iter()
        .any(|m| matches!(m, ChatMessage::ToolObservation { .. }))
}

pub fn tool_call(name: &str, argument: &str) -> ModelReply {
    ModelReply::ToolCalls {
        calls: vec![ToolCall {
            name: name.to_string(),
            argument: argument.to_string(),
        }],
        text: None,
    }
}
