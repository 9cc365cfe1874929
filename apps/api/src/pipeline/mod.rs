//! Analysis pipeline: profile extraction → career analysis, plus the two
//! interview stages.
//!
//! A stage renders its prompt, invokes the model exactly once, and resolves the
//! output. Stages never call each other; the caller composes them
//! (see `session::workflow`) and decides whether to retry.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{complete_text, preview, LlmError, ModelBackend};
use crate::structured::{render, resolve_as, ResolutionFailure, SchemaSpec, TemplateError};

pub mod career;
pub mod interview;
pub mod profile;
pub mod prompts;

pub use career::{CareerAnalysis, CareerAnalysisStage, MatchBadge};
pub use interview::{AnswerEvaluation, EvaluationInput, InterviewFeedback, QuestionGeneration};
pub use profile::{ProfileExtraction, ResumeData};

#[derive(Debug, Error)]
pub enum StageError {
    #[error("prompt rendering failed: {0}")]
    Template(#[from] TemplateError),

    #[error("generation backend failed: {0}")]
    Backend(#[from] LlmError),

    #[error(transparent)]
    Resolution(#[from] ResolutionFailure),
}

/// A named unit of work with one input and one output.
#[async_trait]
pub trait PipelineStage: Send + Sync {
    type Input: Sync;
    type Output: Send;

    fn name(&self) -> &'static str;

    async fn run(
        &self,
        input: &Self::Input,
        llm: &dyn ModelBackend,
    ) -> Result<Self::Output, StageError>;
}

/// Static description of a stage's prompt and sampling.
#[derive(Debug, Clone, Copy)]
pub struct StageSpec {
    pub name: &'static str,
    pub template: &'static str,
    pub temperature: f32,
}

/// The four concrete stages, built once at startup.
pub struct Stages {
    pub profile: ProfileExtraction,
    pub career: CareerAnalysisStage,
    pub question: QuestionGeneration,
    pub evaluation: AnswerEvaluation,
}

impl Stages {
    pub fn new(response_language: &str) -> Self {
        Self {
            profile: ProfileExtraction,
            career: CareerAnalysisStage::new(response_language),
            question: QuestionGeneration::new(response_language),
            evaluation: AnswerEvaluation::new(response_language),
        }
    }
}

/// Schema-bound stage: render → invoke once → resolve.
pub async fn run_structured<T: DeserializeOwned>(
    spec: &StageSpec,
    schema: &SchemaSpec,
    variables: &HashMap<&str, &str>,
    llm: &dyn ModelBackend,
) -> Result<T, StageError> {
    let started = Instant::now();
    info!("Stage '{}' started", spec.name);

    let mut variables = variables.clone();
    variables.insert("json_only", JSON_ONLY_INSTRUCTION);
    let prompt = render(spec.template, Some(schema), &variables)?;
    debug!("Stage '{}' prompt: {}", spec.name, preview(&prompt, 400));

    let raw = complete_text(llm, &prompt, spec.temperature)
        .await
        .map_err(|e| {
            warn!("Stage '{}' backend call failed: {e}", spec.name);
            e
        })?;
    debug!("Stage '{}' raw output: {}", spec.name, preview(&raw, 400));

    let value = resolve_as::<T>(&raw, schema).map_err(|e| {
        warn!("Stage '{}' output unusable: {}", spec.name, e.reason);
        e
    })?;

    info!(
        "Stage '{}' finished in {}ms",
        spec.name,
        started.elapsed().as_millis()
    );
    Ok(value)
}

/// Free-text stage: render → invoke once → trimmed text.
pub async fn run_text(
    spec: &StageSpec,
    variables: &HashMap<&str, &str>,
    llm: &dyn ModelBackend,
) -> Result<String, StageError> {
    let started = Instant::now();
    info!("Stage '{}' started", spec.name);

    let prompt = render(spec.template, None, variables)?;
    let text = complete_text(llm, &prompt, spec.temperature)
        .await
        .map_err(|e| {
            warn!("Stage '{}' backend call failed: {e}", spec.name);
            e
        })?;

    info!(
        "Stage '{}' finished in {}ms",
        spec.name,
        started.elapsed().as_millis()
    );
    Ok(text.trim().to_string())
}
