//! Agent tools: side-generation routines the agent may call on demand.
//!
//! Each tool is a one-shot free-text generation with a single string argument.
//! `ToolRegistry` is built once at startup and shared by reference with the
//! dispatcher and the agent's prompt construction. No discovery at runtime.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::llm_client::prompts::language_instruction;
use crate::llm_client::{complete_text, preview, LlmError, ModelBackend, ToolCall, ToolDeclaration};
use crate::structured::{render, TemplateError};

pub mod prompts;

use prompts::{COVER_LETTER_TEMPLATE, PROFILE_OPTIMIZATION_TEMPLATE, STUDY_PLAN_TEMPLATE};

const TOOL_TEMPERATURE: f32 = 0.7;

// ────────────────────────────────────────────────────────────────────────────
// Catalog
// ────────────────────────────────────────────────────────────────────────────

/// The fixed set of tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    StudyPlan,
    CoverLetter,
    ProfileOptimization,
}

impl ToolName {
    pub const ALL: [ToolName; 3] = [
        ToolName::StudyPlan,
        ToolName::CoverLetter,
        ToolName::ProfileOptimization,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::StudyPlan => "study_plan",
            ToolName::CoverLetter => "cover_letter",
            ToolName::ProfileOptimization => "profile_optimization",
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolExecutionError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("tool '{0}' was called without an argument")]
    MissingArgument(String),

    #[error("tool '{tool}' prompt could not be rendered: {source}")]
    Template {
        tool: String,
        #[source]
        source: TemplateError,
    },

    #[error("tool '{tool}' generation failed: {source}")]
    Backend {
        tool: String,
        #[source]
        source: LlmError,
    },
}

/// A callable tool. Stateless; safe to run concurrently.
#[async_trait]
pub trait CareerTool: Send + Sync {
    fn name(&self) -> &str;

    /// The (name, usage, argument) triple the agent is allowed to see.
    fn declaration(&self) -> ToolDeclaration;

    async fn execute(
        &self,
        argument: &str,
        llm: &dyn ModelBackend,
    ) -> Result<String, ToolExecutionError>;
}

/// A tool backed by one prompt template and a single generation call.
pub struct PromptTool {
    name: ToolName,
    description: &'static str,
    argument: &'static str,
    argument_description: &'static str,
    template: &'static str,
    language: String,
}

impl PromptTool {
    pub fn new(name: ToolName, response_language: &str) -> Self {
        let language = language_instruction(response_language);
        match name {
            ToolName::StudyPlan => Self {
                name,
                description: "Use this when the user asks for a study plan, curriculum or \
                              learning roadmap. Produces a 4-week study plan for one skill.",
                argument: "skill_name",
                argument_description: "Name of the skill to learn.",
                template: STUDY_PLAN_TEMPLATE,
                language,
            },
            ToolName::CoverLetter => Self {
                name,
                description: "Use this when the user asks for help writing a job application \
                              cover letter. Produces a cover letter draft.",
                argument: "job_title",
                argument_description: "Title of the job being applied for.",
                template: COVER_LETTER_TEMPLATE,
                language,
            },
            ToolName::ProfileOptimization => Self {
                name,
                description: "Use this when the user asks how to optimise their professional \
                              networking profile or personal brand. Produces headline, About \
                              section and hashtag suggestions.",
                argument: "role_target",
                argument_description: "Target job or role.",
                template: PROFILE_OPTIMIZATION_TEMPLATE,
                language,
            },
        }
    }
}

#[async_trait]
impl CareerTool for PromptTool {
    fn name(&self) -> &str {
        self.name.as_str()
    }

    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: self.name.as_str().to_string(),
            description: self.description.to_string(),
            argument: self.argument.to_string(),
            argument_description: self.argument_description.to_string(),
        }
    }

    async fn execute(
        &self,
        argument: &str,
        llm: &dyn ModelBackend,
    ) -> Result<String, ToolExecutionError> {
        let tool = self.name.as_str();
        let argument = argument.trim();
        if argument.is_empty() {
            return Err(ToolExecutionError::MissingArgument(tool.to_string()));
        }

        let variables = HashMap::from([
            (self.argument, argument),
            ("language", self.language.as_str()),
        ]);
        let prompt = render(self.template, None, &variables).map_err(|source| {
            ToolExecutionError::Template {
                tool: tool.to_string(),
                source,
            }
        })?;

        let output = complete_text(llm, &prompt, TOOL_TEMPERATURE)
            .await
            .map_err(|source| ToolExecutionError::Backend {
                tool: tool.to_string(),
                source,
            })?;
        Ok(output.trim().to_string())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Registry + dispatch
// ────────────────────────────────────────────────────────────────────────────

/// Result of one dispatch. Lives only for the agent turn that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolInvocation {
    pub name: String,
    pub argument: String,
    /// Tool output, or a "tool failed: ..." observation.
    pub output: String,
    pub success: bool,
}

pub struct ToolRegistry {
    tools: Vec<Box<dyn CareerTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// The three built-in tools, in catalog order.
    pub fn with_defaults(response_language: &str) -> Self {
        let mut registry = Self::new();
        for name in ToolName::ALL {
            registry.register(Box::new(PromptTool::new(name, response_language)));
        }
        registry
    }

    pub fn register(&mut self, tool: Box<dyn CareerTool>) {
        self.tools.push(tool);
    }

    pub fn catalog(&self) -> Vec<ToolDeclaration> {
        self.tools.iter().map(|t| t.declaration()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&dyn CareerTool> {
        self.tools
            .iter()
            .find(|t| t.name() == name.trim())
            .map(|t| &**t)
    }

    /// Looks up and runs a tool. Never fails: any error becomes a textual
    /// observation so the agent turn can still finish.
    pub async fn dispatch(&self, call: &ToolCall, llm: &dyn ModelBackend) -> ToolInvocation {
        let started = Instant::now();
        let result = match self.get(&call.name) {
            Some(tool) => tool.execute(&call.argument, llm).await,
            None => Err(ToolExecutionError::UnknownTool(call.name.clone())),
        };

        let (output, success) = match result {
            Ok(output) => (output, true),
            Err(e) => {
                warn!("Tool '{}' failed: {e}", call.name);
                (format!("tool failed: {e}"), false)
            }
        };
        info!(
            "Tool '{}' dispatched (success: {success}) in {}ms",
            call.name,
            started.elapsed().as_millis()
        );
        debug!("Tool '{}' output: {}", call.name, preview(&output, 300));

        ToolInvocation {
            name: call.name.clone(),
            argument: call.argument.clone(),
            output,
            success,
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
