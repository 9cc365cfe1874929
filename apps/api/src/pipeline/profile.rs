//! Profile extraction: raw resume text → `ResumeData`.

use std::collections::HashMap;
use std::sync::OnceLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::llm_client::ModelBackend;
use crate::pipeline::prompts::PROFILE_EXTRACTION_TEMPLATE;
use crate::pipeline::{run_structured, PipelineStage, StageError, StageSpec};
use crate::structured::SchemaSpec;

const SPEC: StageSpec = StageSpec {
    name: "profile_extraction",
    template: PROFILE_EXTRACTION_TEMPLATE,
    temperature: 0.0,
};

/// Structured candidate profile. Immutable once produced; replaced wholesale on a new upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeData {
    pub candidate_name: String,
    pub highest_education: String,
    /// 5–10 expected by convention, not enforced.
    pub primary_skills: Vec<String>,
    pub summary: String,
}

impl ResumeData {
    pub fn schema() -> &'static SchemaSpec {
        static SCHEMA: OnceLock<SchemaSpec> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            SchemaSpec::builder("ResumeData")
                .text("candidate_name", "Full name of the candidate.")
                .text("highest_education", "Highest education attained.")
                .text_list("primary_skills", "List of 5-10 technical skills.")
                .text(
                    "summary",
                    "Short executive summary of the candidate profile (2-3 sentences).",
                )
                .build()
        })
    }

    /// One-line profile used as input to career analysis.
    pub fn profile_line(&self) -> String {
        format!(
            "Name: {}, Education: {}, Skills: [{}], Info: {}",
            self.candidate_name,
            self.highest_education,
            self.primary_skills.join(", "),
            self.summary
        )
    }
}

pub struct ProfileExtraction;

#[async_trait]
impl PipelineStage for ProfileExtraction {
    type Input = String;
    type Output = ResumeData;

    fn name(&self) -> &'static str {
        SPEC.name
    }

    async fn run(&self, resume_text: &String, llm: &dyn ModelBackend) -> Result<ResumeData, StageError> {
        let variables = HashMap::from([("resume_text", resume_text.as_str())]);
        run_structured(&SPEC, ResumeData::schema(), &variables, llm).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::mock::{first_user_text, MockBackend};

    const PROFILE_JSON: &str = r#"{
        "candidate_name": "Siti Rahma",
        "highest_education": "BSc Computer Science, Universitas Indonesia",
        "primary_skills": ["Python", "SQL", "Pandas", "Docker", "FastAPI"],
        "summary": "Backend-leaning data engineer with three years of pipeline work."
    }"#;

    #[tokio::test]
    async fn test_profile_extraction_parses_fenced_output() {
        let llm = MockBackend::replying(&format!("```json\n{PROFILE_JSON}\n```"));
        let resume = ProfileExtraction
            .run(&"Siti Rahma\nData Engineer...".to_string(), &llm)
            .await
            .unwrap();

        assert_eq!(resume.candidate_name, "Siti Rahma");
        assert_eq!(resume.primary_skills.len(), 5);
        assert_eq!(resume.primary_skills[0], "Python");

        let requests = llm.requests();
        assert_eq!(requests[0].temperature, 0.0);
        let prompt = first_user_text(&requests[0]);
        assert!(prompt.contains("Siti Rahma\nData Engineer..."));
        assert!(prompt.contains("\"primary_skills\" (array of string)"));
    }

    #[tokio::test]
    async fn test_profile_extraction_fails_on_missing_field() {
        let llm = MockBackend::replying(r#"{"candidate_name": "X", "summary": "Y"}"#);
        let result = ProfileExtraction.run(&"cv".to_string(), &llm).await;
        assert!(matches!(result, Err(StageError::Resolution(_))));
    }

    #[test]
    fn test_profile_line_lists_skills() {
        let resume: ResumeData = serde_json::from_str(PROFILE_JSON).unwrap();
        let line = resume.profile_line();
        assert!(line.starts_with("Name: Siti Rahma"));
        assert!(line.contains("Skills: [Python, SQL, Pandas, Docker, FastAPI]"));
    }
}
