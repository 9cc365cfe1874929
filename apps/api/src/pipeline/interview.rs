//! Mock interview stages: question generation (free text) and answer evaluation.

use std::collections::HashMap;
use std::sync::OnceLock;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::llm_client::prompts::language_instruction;
use crate::llm_client::ModelBackend;
use crate::pipeline::career::ScoreBand;
use crate::pipeline::prompts::{ANSWER_EVALUATION_TEMPLATE, INTERVIEW_QUESTION_TEMPLATE};
use crate::pipeline::{run_structured, run_text, PipelineStage, StageError, StageSpec};
use crate::structured::SchemaSpec;

const QUESTION_SPEC: StageSpec = StageSpec {
    name: "interview_question",
    template: INTERVIEW_QUESTION_TEMPLATE,
    temperature: 0.8,
};

const EVALUATION_SPEC: StageSpec = StageSpec {
    name: "answer_evaluation",
    template: ANSWER_EVALUATION_TEMPLATE,
    temperature: 0.1,
};

/// Assessment of one answer. Replaced on each new submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewFeedback {
    /// 0–100; out-of-range model output is clamped.
    #[serde(deserialize_with = "clamped_score")]
    pub score: u8,
    pub strengths: String,
    pub improvements: String,
    pub model_answer: String,
}

impl InterviewFeedback {
    pub fn schema() -> &'static SchemaSpec {
        static SCHEMA: OnceLock<SchemaSpec> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            SchemaSpec::builder("InterviewFeedback")
                .integer("score", "Score of the candidate's answer (0-100).")
                .text("strengths", "What is already good about the answer.")
                .text("improvements", "What is missing or should be improved.")
                .text(
                    "model_answer",
                    "An example of an ideal answer to the question.",
                )
                .build()
        })
    }

    /// Score-card band. Interview scores use lower cut-offs than match scores.
    pub fn score_band(&self) -> ScoreBand {
        match self.score {
            75..=100 => ScoreBand::Strong,
            50..=74 => ScoreBand::Moderate,
            _ => ScoreBand::Weak,
        }
    }
}

fn clamped_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let raw = i64::deserialize(deserializer)?;
    Ok(raw.clamp(0, 100) as u8)
}

pub struct QuestionGeneration {
    language: String,
}

impl QuestionGeneration {
    pub fn new(language: &str) -> Self {
        Self {
            language: language_instruction(language),
        }
    }
}

#[async_trait]
impl PipelineStage for QuestionGeneration {
    type Input = String;
    type Output = String;

    fn name(&self) -> &'static str {
        QUESTION_SPEC.name
    }

    async fn run(&self, job_title: &String, llm: &dyn ModelBackend) -> Result<String, StageError> {
        let variables = HashMap::from([
            ("job_title", job_title.as_str()),
            ("language", self.language.as_str()),
        ]);
        run_text(&QUESTION_SPEC, &variables, llm).await
    }
}

/// The (question, answer, job title) triple being assessed.
#[derive(Debug, Clone)]
pub struct EvaluationInput {
    pub job_title: String,
    pub question: String,
    pub answer: String,
}

pub struct AnswerEvaluation {
    language: String,
}

impl AnswerEvaluation {
    pub fn new(language: &str) -> Self {
        Self {
            language: language_instruction(language),
        }
    }
}

#[async_trait]
impl PipelineStage for AnswerEvaluation {
    type Input = EvaluationInput;
    type Output = InterviewFeedback;

    fn name(&self) -> &'static str {
        EVALUATION_SPEC.name
    }

    async fn run(
        &self,
        input: &EvaluationInput,
        llm: &dyn ModelBackend,
    ) -> Result<InterviewFeedback, StageError> {
        let variables = HashMap::from([
            ("job_title", input.job_title.as_str()),
            ("question", input.question.as_str()),
            ("answer", input.answer.as_str()),
            ("language", self.language.as_str()),
        ]);
        run_structured(&EVALUATION_SPEC, InterviewFeedback::schema(), &variables, llm).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::mock::{first_user_text, MockBackend};

    fn input() -> EvaluationInput {
        EvaluationInput {
            job_title: "Data Engineer".to_string(),
            question: "How would you make a nightly batch job idempotent?".to_string(),
            answer: "Use upserts keyed by business id and a run ledger.".to_string(),
        }
    }

    #[test]
    fn test_feedback_score_band_cut_offs() {
        let band = |score| {
            InterviewFeedback {
                score,
                strengths: String::new(),
                improvements: String::new(),
                model_answer: String::new(),
            }
            .score_band()
        };
        assert_eq!(band(100), ScoreBand::Strong);
        assert_eq!(band(75), ScoreBand::Strong);
        assert_eq!(band(74), ScoreBand::Moderate);
        assert_eq!(band(50), ScoreBand::Moderate);
        assert_eq!(band(49), ScoreBand::Weak);
        assert_eq!(band(0), ScoreBand::Weak);
    }

    #[tokio::test]
    async fn test_question_is_used_verbatim_after_trim() {
        let llm = MockBackend::replying("\nHow do you partition a 10TB fact table?\n");
        let question = QuestionGeneration::new("English")
            .run(&"Data Engineer".to_string(), &llm)
            .await
            .unwrap();
        assert_eq!(question, "How do you partition a 10TB fact table?");

        let request = &llm.requests()[0];
        assert_eq!(request.temperature, 0.8);
        assert!(first_user_text(request).contains("'Data Engineer'"));
    }

    #[tokio::test]
    async fn test_evaluation_parses_feedback() {
        let llm = MockBackend::replying(
            "Here is my assessment:\n```json\n{\"score\": 78, \"strengths\": \"Idempotency understood.\", \
             \"improvements\": \"Mention retries.\", \"model_answer\": \"Use a ledger...\"}\n```",
        );
        let feedback = AnswerEvaluation::new("English")
            .run(&input(), &llm)
            .await
            .unwrap();
        assert_eq!(feedback.score, 78);
        assert_eq!(feedback.improvements, "Mention retries.");

        let prompt = first_user_text(&llm.requests()[0]).to_string();
        assert!(prompt.contains("Question: How would you make a nightly batch job idempotent?"));
        assert!(prompt.contains("Candidate answer: Use upserts"));
        assert!(prompt.contains("senior interviewer for the position Data Engineer"));
    }

    #[tokio::test]
    async fn test_evaluation_clamps_and_coerces_score() {
        let llm = MockBackend::replying(
            r#"{"score": "140", "strengths": "a", "improvements": "b", "model_answer": "c"}"#,
        );
        let feedback = AnswerEvaluation::new("English")
            .run(&input(), &llm)
            .await
            .unwrap();
        assert_eq!(feedback.score, 100);
    }

    #[tokio::test]
    async fn test_evaluation_rejects_non_numeric_score() {
        let llm = MockBackend::replying(
            r#"{"score": "excellent", "strengths": "a", "improvements": "b", "model_answer": "c"}"#,
        );
        let result = AnswerEvaluation::new("English").run(&input(), &llm).await;
        assert!(matches!(result, Err(StageError::Resolution(_))));
    }
}
