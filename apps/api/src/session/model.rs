use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::agent::ConversationContext;
use crate::pipeline::{CareerAnalysis, InterviewFeedback, ResumeData};

/// Outcome of the most recent attempt of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum StageStatus {
    #[default]
    NotRun,
    Succeeded,
    Failed(String),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StageFlags {
    pub profile_extraction: StageStatus,
    pub career_analysis: StageStatus,
    pub interview_question: StageStatus,
    pub answer_evaluation: StageStatus,
}

/// The current (job, question) pair of the mock interview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterviewPair {
    pub job_title: String,
    pub question: String,
}

/// All transient state of one user session. Values are replaced, never
/// mutated in place, when they are recomputed.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub document_name: Option<String>,
    pub resume: Option<ResumeData>,
    pub analysis: Option<CareerAnalysis>,
    pub interview: Option<InterviewPair>,
    pub feedback: Option<InterviewFeedback>,
    pub conversation: ConversationContext,
    pub stages: StageFlags,
}

impl Session {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            document_name: None,
            resume: None,
            analysis: None,
            interview: None,
            feedback: None,
            conversation: ConversationContext::new(),
            stages: StageFlags::default(),
        }
    }

    /// Installs a freshly extracted profile. Everything derived from the
    /// previous profile is dropped.
    pub fn install_resume(&mut self, document_name: &str, resume: ResumeData) {
        self.document_name = Some(document_name.to_string());
        self.resume = Some(resume);
        self.stages.profile_extraction = StageStatus::Succeeded;
        self.invalidate_analysis();
    }

    /// Replaces the analysis wholesale. A new analysis also invalidates the
    /// interview, whose job title came from the old recommendations.
    pub fn install_analysis(&mut self, analysis: CareerAnalysis) {
        self.invalidate_analysis();
        self.analysis = Some(analysis);
        self.stages.career_analysis = StageStatus::Succeeded;
    }

    pub fn install_question(&mut self, pair: InterviewPair) {
        self.interview = Some(pair);
        self.feedback = None;
        self.stages.interview_question = StageStatus::Succeeded;
        self.stages.answer_evaluation = StageStatus::NotRun;
    }

    pub fn install_feedback(&mut self, feedback: InterviewFeedback) {
        self.feedback = Some(feedback);
        self.stages.answer_evaluation = StageStatus::Succeeded;
    }

    fn invalidate_analysis(&mut self) {
        self.analysis = None;
        self.interview = None;
        self.feedback = None;
        self.stages.career_analysis = StageStatus::NotRun;
        self.stages.interview_question = StageStatus::NotRun;
        self.stages.answer_evaluation = StageStatus::NotRun;
    }
}
