//! Career-fit analysis: `ResumeData` → `CareerAnalysis`.

use std::collections::HashMap;
use std::sync::OnceLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm_client::prompts::language_instruction;
use crate::llm_client::ModelBackend;
use crate::pipeline::profile::ResumeData;
use crate::pipeline::prompts::CAREER_ANALYSIS_TEMPLATE;
use crate::pipeline::{run_structured, PipelineStage, StageError, StageSpec};
use crate::structured::SchemaSpec;

const SPEC: StageSpec = StageSpec {
    name: "career_analysis",
    template: CAREER_ANALYSIS_TEMPLATE,
    temperature: 0.2,
};

/// Number of recommendations requested from the model. Not structurally enforced.
pub const EXPECTED_RECOMMENDATIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecommendation {
    pub job_title: String,
    /// Formatted as "NN%" by convention; see `match_percent`.
    pub match_score: String,
    pub rationale: String,
}

/// Presentation band for a match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Strong,
    Moderate,
    Weak,
}

impl JobRecommendation {
    pub fn schema() -> &'static SchemaSpec {
        static SCHEMA: OnceLock<SchemaSpec> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            SchemaSpec::builder("JobRecommendation")
                .text("job_title", "Job position title.")
                .text("match_score", "Match percentage from 0% to 100%.")
                .text(
                    "rationale",
                    "Specific reason why the role fits (max 2 sentences).",
                )
                .build()
        })
    }

    pub fn match_percent(&self) -> u8 {
        parse_match_score(&self.match_score)
    }

    pub fn score_band(&self) -> ScoreBand {
        match self.match_percent() {
            80..=100 => ScoreBand::Strong,
            60..=79 => ScoreBand::Moderate,
            _ => ScoreBand::Weak,
        }
    }
}

/// Parses "85%" → 85. Anything unparseable ("N/A", "") is 0; out-of-range values are clamped.
pub fn parse_match_score(raw: &str) -> u8 {
    let cleaned = raw.trim().trim_end_matches('%').trim();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.round().clamp(0.0, 100.0) as u8)
        .unwrap_or(0)
}

/// Rendering hint for one recommendation: the parsed percentage and its band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchBadge {
    pub job_title: String,
    pub percent: u8,
    pub band: ScoreBand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerAnalysis {
    pub recommendations: Vec<JobRecommendation>,
    pub skill_gap_analysis: String,
}

impl CareerAnalysis {
    pub fn schema() -> &'static SchemaSpec {
        static SCHEMA: OnceLock<SchemaSpec> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            SchemaSpec::builder("CareerAnalysis")
                .nested_list(
                    "recommendations",
                    JobRecommendation::schema().clone(),
                    "List of exactly 3 job recommendations.",
                )
                .text(
                    "skill_gap_analysis",
                    "Concrete skill development advice (gap analysis).",
                )
                .build()
        })
    }

    pub fn badges(&self) -> Vec<MatchBadge> {
        self.recommendations
            .iter()
            .map(|r| MatchBadge {
                job_title: r.job_title.clone(),
                percent: r.match_percent(),
                band: r.score_band(),
            })
            .collect()
    }

    pub fn top_recommendation(&self) -> Option<&JobRecommendation> {
        self.recommendations.first()
    }

    /// The recommended title matching `job_title` case-insensitively, as the
    /// model spelled it.
    pub fn recommended_title(&self, job_title: &str) -> Option<&str> {
        self.recommendations
            .iter()
            .map(|r| r.job_title.as_str())
            .find(|t| t.trim().eq_ignore_ascii_case(job_title.trim()))
    }
}

pub struct CareerAnalysisStage {
    language: String,
}

impl CareerAnalysisStage {
    pub fn new(language: &str) -> Self {
        Self {
            language: language_instruction(language),
        }
    }
}

#[async_trait]
impl PipelineStage for CareerAnalysisStage {
    type Input = ResumeData;
    type Output = CareerAnalysis;

    fn name(&self) -> &'static str {
        SPEC.name
    }

    async fn run(
        &self,
        resume: &ResumeData,
        llm: &dyn ModelBackend,
    ) -> Result<CareerAnalysis, StageError> {
        let profile = resume.profile_line();
        let variables = HashMap::from([
            ("profile", profile.as_str()),
            ("language", self.language.as_str()),
        ]);
        let analysis: CareerAnalysis =
            run_structured(&SPEC, CareerAnalysis::schema(), &variables, llm).await?;

        if analysis.recommendations.len() != EXPECTED_RECOMMENDATIONS {
            warn!(
                "Career analysis returned {} recommendations (expected {})",
                analysis.recommendations.len(),
                EXPECTED_RECOMMENDATIONS
            );
        }
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::mock::{first_user_text, MockBackend};

    const ANALYSIS_JSON: &str = r#"{
        "recommendations": [
            {"job_title": "Data Engineer", "match_score": "88%", "rationale": "Strong pipeline work."},
            {"job_title": "Backend Engineer", "match_score": "72%", "rationale": "Solid API skills."},
            {"job_title": "ML Engineer", "match_score": "55%", "rationale": "Some modelling exposure."}
        ],
        "skill_gap_analysis": "Learn Spark and cloud data warehouses."
    }"#;

    fn resume() -> ResumeData {
        ResumeData {
            candidate_name: "Siti Rahma".to_string(),
            highest_education: "BSc CS".to_string(),
            primary_skills: vec!["Python".to_string(), "SQL".to_string()],
            summary: "Data engineer.".to_string(),
        }
    }

    #[test]
    fn test_parse_match_score() {
        assert_eq!(parse_match_score("85%"), 85);
        assert_eq!(parse_match_score(" 85 % "), 85);
        assert_eq!(parse_match_score("70"), 70);
        assert_eq!(parse_match_score("N/A"), 0);
        assert_eq!(parse_match_score(""), 0);
        assert_eq!(parse_match_score("150%"), 100);
        assert_eq!(parse_match_score("-5%"), 0);
        assert_eq!(parse_match_score("79.6%"), 80);
    }

    #[test]
    fn test_score_band_thresholds() {
        let rec = |score: &str| JobRecommendation {
            job_title: "X".to_string(),
            match_score: score.to_string(),
            rationale: String::new(),
        };
        assert_eq!(rec("80%").score_band(), ScoreBand::Strong);
        assert_eq!(rec("79%").score_band(), ScoreBand::Moderate);
        assert_eq!(rec("60%").score_band(), ScoreBand::Moderate);
        assert_eq!(rec("59%").score_band(), ScoreBand::Weak);
        assert_eq!(rec("N/A").score_band(), ScoreBand::Weak);
    }

    #[tokio::test]
    async fn test_career_analysis_stage_uses_profile() {
        let llm = MockBackend::replying(ANALYSIS_JSON);
        let stage = CareerAnalysisStage::new("English");
        let analysis = stage.run(&resume(), &llm).await.unwrap();

        assert_eq!(analysis.recommendations.len(), 3);
        assert_eq!(analysis.top_recommendation().unwrap().job_title, "Data Engineer");
        assert_eq!(analysis.recommended_title(" data engineer"), Some("Data Engineer"));
        assert_eq!(analysis.recommended_title("Astronaut"), None);

        let request = &llm.requests()[0];
        assert_eq!(request.temperature, 0.2);
        let prompt = first_user_text(request);
        assert!(prompt.contains("Name: Siti Rahma"));
        assert!(prompt.contains("\"recommendations\" (array of object JobRecommendation)"));
        assert!(prompt.contains("Write all prose in English."));
    }

    #[tokio::test]
    async fn test_numeric_match_score_is_coerced_to_text() {
        let llm = MockBackend::replying(
            r#"{"recommendations": [{"job_title": "A", "match_score": 91, "rationale": "r"}],
                "skill_gap_analysis": "g"}"#,
        );
        let analysis = CareerAnalysisStage::new("English")
            .run(&resume(), &llm)
            .await
            .unwrap();
        assert_eq!(analysis.recommendations[0].match_score, "91");
        assert_eq!(analysis.recommendations[0].match_percent(), 91);
    }

    #[test]
    fn test_badges_follow_recommendation_order() {
        let analysis: CareerAnalysis = serde_json::from_str(ANALYSIS_JSON).unwrap();
        let badges = analysis.badges();
        assert_eq!(badges.len(), 3);
        assert_eq!(badges[0].percent, 88);
        assert_eq!(badges[0].band, ScoreBand::Strong);
        assert_eq!(badges[1].band, ScoreBand::Moderate);
        assert_eq!(badges[2].band, ScoreBand::Weak);
    }
}
