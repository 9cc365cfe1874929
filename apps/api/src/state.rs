use std::sync::Arc;

use crate::agent::AgentOrchestrator;
use crate::config::Config;
use crate::llm_client::ModelBackend;
use crate::pipeline::Stages;
use crate::session::{CareerCoach, SessionStore};
use crate::tools::ToolRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    /// Stages, tool registry and agent, built once at startup.
    pub coach: Arc<CareerCoach>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, llm: Arc<dyn ModelBackend>) -> Self {
        let language = config.response_language.as_str();
        let coach = CareerCoach::new(
            llm,
            Stages::new(language),
            ToolRegistry::with_defaults(language),
            AgentOrchestrator::new(config.agent_max_rounds, config.history_window, language),
        );
        Self {
            sessions: SessionStore::new(),
            coach: Arc::new(coach),
            config,
        }
    }
}
