//! Career coach agent: a bounded tool-calling loop over a session's conversation.

pub mod conversation;
pub mod orchestrator;
pub mod prompts;

pub use conversation::ConversationContext;
pub use orchestrator::{AgentOrchestrator, Termination, TurnOutcome};
