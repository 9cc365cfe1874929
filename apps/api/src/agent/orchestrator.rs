use std::time::Instant;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::agent::conversation::{ConversationContext, ConversationTurn};
use crate::agent::prompts::{system_instruction, NO_ANSWER_FALLBACK};
use crate::llm_client::{preview, ChatMessage, GenerationRequest, LlmError, ModelBackend, ModelReply};
use crate::tools::{ToolInvocation, ToolRegistry};

const AGENT_TEMPERATURE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The model produced a final natural-language answer.
    Answered,
    /// The round bound was hit; the reply is the best partial answer.
    LoopBoundExceeded,
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub reply: String,
    pub tool_rounds: usize,
    pub invocations: Vec<ToolInvocation>,
    pub termination: Termination,
}

/// Drives one bounded decide → execute → observe loop per user utterance.
#[derive(Debug, Clone)]
pub struct AgentOrchestrator {
    max_rounds: usize,
    history_window: usize,
    language: String,
}

impl AgentOrchestrator {
    pub fn new(max_rounds: usize, history_window: usize, language: &str) -> Self {
        Self {
            max_rounds,
            history_window,
            language: language.to_string(),
        }
    }

    /// Runs one agent turn.
    ///
    /// On success exactly two turns are appended to `conversation`: the user's
    /// utterance and the final reply. On error nothing is appended.
    pub async fn run_turn(
        &self,
        utterance: &str,
        conversation: &mut ConversationContext,
        context: &str,
        tools: &ToolRegistry,
        llm: &dyn ModelBackend,
    ) -> Result<TurnOutcome, LlmError> {
        let started = Instant::now();
        let catalog = tools.catalog();
        let system = system_instruction(&catalog, context, &self.language);

        let mut messages = conversation.to_messages(self.history_window);
        messages.push(ChatMessage::User(utterance.to_string()));

        let mut invocations: Vec<ToolInvocation> = Vec::new();
        let mut interim: Option<String> = None;
        let mut rounds = 0;

        let (reply, termination) = loop {
            let request = GenerationRequest::chat(
                system.clone(),
                messages.clone(),
                catalog.clone(),
                AGENT_TEMPERATURE,
            );
            let (calls, text) = match llm.generate(&request).await? {
                ModelReply::Text(text) if !text.trim().is_empty() => {
                    break (text.trim().to_string(), Termination::Answered);
                }
                ModelReply::Text(_) => {
                    break (best_partial(interim, &invocations)?, Termination::Answered);
                }
                ModelReply::ToolCalls { calls, text } => {
                    let text = text
                        .map(|t| t.trim().to_string())
                        .filter(|t| !t.is_empty());
                    if text.is_some() {
                        interim = text.clone();
                    }
                    (calls, text)
                }
            };

            if calls.is_empty() {
                break (best_partial(interim, &invocations)?, Termination::Answered);
            }
            if rounds >= self.max_rounds {
                warn!(
                    "Agent hit the round bound ({}) with {} call(s) still requested",
                    self.max_rounds,
                    calls.len()
                );
                break (
                    best_partial(interim, &invocations)?,
                    Termination::LoopBoundExceeded,
                );
            }

            rounds += 1;
            info!("Agent round {rounds}: {} tool call(s)", calls.len());

            // All calls of a round complete before the model sees any observation.
            let results = join_all(calls.iter().map(|call| tools.dispatch(call, llm))).await;

            messages.push(ChatMessage::ToolRequest { calls, text });
            for invocation in &results {
                messages.push(ChatMessage::ToolObservation {
                    name: invocation.name.clone(),
                    output: invocation.output.clone(),
                });
            }
            invocations.extend(results);
        };

        conversation.append(ConversationTurn::user(utterance));
        conversation.append(ConversationTurn::assistant(reply.clone()));

        info!(
            "Agent turn finished: {rounds} round(s), {} invocation(s), {:?} in {}ms",
            invocations.len(),
            termination,
            started.elapsed().as_millis()
        );
        debug!("Agent reply: {}", preview(&reply, 300));

        Ok(TurnOutcome {
            reply,
            tool_rounds: rounds,
            invocations,
            termination,
        })
    }
}

/// The last interim text, else the successful tool outputs, else a fixed notice.
/// Fails only when nothing at all was produced during the turn.
fn best_partial(interim: Option<String>, invocations: &[ToolInvocation]) -> Result<String, LlmError> {
    if let Some(text) = interim {
        return Ok(text);
    }
    let outputs: Vec<&str> = invocations
        .iter()
        .filter(|i| i.success)
        .map(|i| i.output.as_str())
        .collect();
    if !outputs.is_empty() {
        return Ok(outputs.join("\n\n"));
    }
    if invocations.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    Ok(NO_ANSWER_FALLBACK.to_string())
}
