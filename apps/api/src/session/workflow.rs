//! Session workflows: compose the pipeline stages, ingestion, and the agent
//! against one session's state.
//!
//! Ordering rules live here: career analysis never runs without a profile, the
//! interview needs an analysis, and a failed stage leaves every previously
//! computed value in place.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::agent::prompts::profile_context;
use crate::agent::{AgentOrchestrator, TurnOutcome};
use crate::ingest::{self, IngestError};
use crate::llm_client::{LlmError, ModelBackend};
use crate::pipeline::{
    CareerAnalysis, EvaluationInput, InterviewFeedback, MatchBadge, PipelineStage, ResumeData,
    StageError, Stages,
};
use crate::session::model::{InterviewPair, Session, StageFlags, StageStatus};
use crate::tools::{ToolName, ToolRegistry};

const FALLBACK_SKILL: &str = "Python";
const FALLBACK_JOB: &str = "Data Scientist";

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{0}")]
    Validation(String),

    /// An earlier step has not produced the value this operation depends on.
    #[error("{0}")]
    Precondition(String),

    #[error("no usable text in '{0}' (accepted: non-empty .pdf or .txt)")]
    NoContent(String),

    #[error("document ingestion failed: {0}")]
    Ingest(#[from] IngestError),

    #[error("stage '{stage}' failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: StageError,
    },

    #[error("agent turn failed: {0}")]
    Agent(#[source] LlmError),
}

/// Result of a document upload. The profile is always present; the analysis is
/// absent when that stage failed and can be retried on its own.
#[derive(Debug, Serialize)]
pub struct DocumentReport {
    pub resume: ResumeData,
    pub analysis: Option<CareerAnalysis>,
    pub badges: Vec<MatchBadge>,
    pub stages: StageFlags,
}

/// A canned agent utterance derived from the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shortcut {
    pub tool: ToolName,
    pub label: String,
    pub utterance: String,
}

/// The stages, tools and agent, shared by every session.
pub struct CareerCoach {
    llm: Arc<dyn ModelBackend>,
    stages: Stages,
    tools: ToolRegistry,
    orchestrator: AgentOrchestrator,
}

impl CareerCoach {
    pub fn new(
        llm: Arc<dyn ModelBackend>,
        stages: Stages,
        tools: ToolRegistry,
        orchestrator: AgentOrchestrator,
    ) -> Self {
        Self {
            llm,
            stages,
            tools,
            orchestrator,
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Ingestion → profile extraction → career analysis.
    pub async fn analyze_document(
        &self,
        session: &mut Session,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<DocumentReport, WorkflowError> {
        let text = ingest::extract_text(filename, bytes)
            .await?
            .ok_or_else(|| WorkflowError::NoContent(filename.to_string()))?;

        let resume = match self.stages.profile.run(&text, self.llm.as_ref()).await {
            Ok(resume) => resume,
            Err(source) => {
                session.stages.profile_extraction = StageStatus::Failed(source.to_string());
                return Err(self.stage_failed(session, self.stages.profile.name(), source));
            }
        };
        session.install_resume(filename, resume.clone());
        info!(
            "Session {}: profile extracted from '{filename}' ({} skills)",
            session.id,
            resume.primary_skills.len()
        );

        let analysis = match self.stages.career.run(&resume, self.llm.as_ref()).await {
            Ok(analysis) => {
                session.install_analysis(analysis.clone());
                Some(analysis)
            }
            Err(e) => {
                warn!("Session {}: career analysis failed: {e}", session.id);
                session.stages.career_analysis = StageStatus::Failed(e.to_string());
                None
            }
        };

        Ok(DocumentReport {
            badges: analysis.as_ref().map(CareerAnalysis::badges).unwrap_or_default(),
            resume,
            analysis,
            stages: session.stages.clone(),
        })
    }

    /// Re-runs career analysis on the current profile, replacing the prior
    /// analysis only on success.
    pub async fn rerun_analysis(&self, session: &mut Session) -> Result<CareerAnalysis, WorkflowError> {
        let resume = session
            .resume
            .clone()
            .ok_or_else(|| precondition("upload a CV before running career analysis"))?;

        match self.stages.career.run(&resume, self.llm.as_ref()).await {
            Ok(analysis) => {
                session.install_analysis(analysis.clone());
                info!("Session {}: career analysis replaced", session.id);
                Ok(analysis)
            }
            Err(source) => {
                session.stages.career_analysis = StageStatus::Failed(source.to_string());
                Err(self.stage_failed(session, self.stages.career.name(), source))
            }
        }
    }

    /// Generates a question for one of the recommended jobs. Clears any prior feedback.
    pub async fn new_question(
        &self,
        session: &mut Session,
        job_title: &str,
    ) -> Result<InterviewPair, WorkflowError> {
        let analysis = session
            .analysis
            .as_ref()
            .ok_or_else(|| precondition("run career analysis before starting an interview"))?;
        let job_title = analysis
            .recommended_title(job_title)
            .map(str::to_string)
            .ok_or_else(|| {
                WorkflowError::Validation(format!(
                    "'{job_title}' is not one of the recommended jobs"
                ))
            })?;

        match self.stages.question.run(&job_title, self.llm.as_ref()).await {
            Ok(question) => {
                info!("Session {}: new interview question for '{job_title}'", session.id);
                let pair = InterviewPair {
                    job_title,
                    question,
                };
                session.install_question(pair.clone());
                Ok(pair)
            }
            Err(source) => {
                session.stages.interview_question = StageStatus::Failed(source.to_string());
                Err(self.stage_failed(session, self.stages.question.name(), source))
            }
        }
    }

    /// Evaluates an answer to the current question. Replaces any prior feedback.
    pub async fn submit_answer(
        &self,
        session: &mut Session,
        answer: &str,
    ) -> Result<InterviewFeedback, WorkflowError> {
        if answer.trim().is_empty() {
            return Err(WorkflowError::Validation("answer must not be empty".to_string()));
        }
        let pair = session
            .interview
            .as_ref()
            .ok_or_else(|| precondition("generate an interview question first"))?;
        let input = EvaluationInput {
            job_title: pair.job_title.clone(),
            question: pair.question.clone(),
            answer: answer.trim().to_string(),
        };

        match self.stages.evaluation.run(&input, self.llm.as_ref()).await {
            Ok(feedback) => {
                session.install_feedback(feedback.clone());
                info!("Session {}: answer scored {}", session.id, feedback.score);
                Ok(feedback)
            }
            Err(source) => {
                session.stages.answer_evaluation = StageStatus::Failed(source.to_string());
                Err(self.stage_failed(session, self.stages.evaluation.name(), source))
            }
        }
    }

    /// One agent turn over the session's conversation.
    pub async fn chat(&self, session: &mut Session, message: &str) -> Result<TurnOutcome, WorkflowError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(WorkflowError::Validation("message must not be empty".to_string()));
        }
        let resume = session
            .resume
            .as_ref()
            .ok_or_else(|| precondition("upload a CV first so the coach has context"))?;
        let context = profile_context(resume, session.analysis.as_ref());

        self.orchestrator
            .run_turn(
                message,
                &mut session.conversation,
                &context,
                &self.tools,
                self.llm.as_ref(),
            )
            .await
            .map_err(WorkflowError::Agent)
    }

    fn stage_failed(&self, session: &Session, stage: &'static str, source: StageError) -> WorkflowError {
        warn!("Session {}: stage '{stage}' failed: {source}", session.id);
        WorkflowError::Stage { stage, source }
    }
}

/// The three quick-action utterances for a session with a profile.
pub fn shortcuts(session: &Session) -> Result<Vec<Shortcut>, WorkflowError> {
    let resume = session
        .resume
        .as_ref()
        .ok_or_else(|| precondition("upload a CV before using quick actions"))?;
    let skill = resume
        .primary_skills
        .first()
        .map(String::as_str)
        .unwrap_or(FALLBACK_SKILL);
    let job = session
        .analysis
        .as_ref()
        .and_then(CareerAnalysis::top_recommendation)
        .map(|r| r.job_title.as_str())
        .unwrap_or(FALLBACK_JOB);

    Ok(vec![
        Shortcut {
            tool: ToolName::StudyPlan,
            label: format!("Study plan: {skill}"),
            utterance: format!(
                "Create a complete 4-week study plan to master the skill: {skill}. \
                 I want to focus on practice."
            ),
        },
        Shortcut {
            tool: ToolName::CoverLetter,
            label: format!("Cover letter: {job}"),
            utterance: format!(
                "Draft a professional cover letter for the position {job}. \
                 Emphasise that I learn quickly."
            ),
        },
        Shortcut {
            tool: ToolName::ProfileOptimization,
            label: format!("Profile tips: {job}"),
            utterance: format!(
                "Suggest how to optimise my professional networking profile (Headline & About) \
                 so it attracts recruiters for the position {job}."
            ),
        },
    ])
}

fn precondition(message: &str) -> WorkflowError {
    WorkflowError::Precondition(message.to_string())
}
