//! Per-session state, its in-memory store, and the workflows that drive it.

pub mod handlers;
pub mod model;
pub mod store;
pub mod workflow;

pub use model::{InterviewPair, Session};
pub use store::{SessionError, SessionStore};
pub use workflow::{CareerCoach, DocumentReport, Shortcut, WorkflowError};
