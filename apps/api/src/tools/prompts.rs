// Prompt templates for the agent's side-generation tools.
// Each binds the tool's argument placeholder plus {language}.

pub const STUDY_PLAN_TEMPLATE: &str = "Write a concise, dense 4-week study plan for learning: \
{skill_name}. Break it down week by week with concrete practice tasks. {language}";

pub const COVER_LETTER_TEMPLATE: &str = "Write a professional cover letter draft for the \
position: {job_title}. Make it persuasive, highlight eagerness to learn and readiness to \
contribute. Use [Candidate Name] and [Target Company] as placeholders. {language}";

pub const PROFILE_OPTIMIZATION_TEMPLATE: &str = r#"Optimise the professional networking profile of someone targeting the position: {role_target}.
Provide:
1. 3 professional "Headline" options with SEO keywords.
2. An engaging "About" section draft (at most 2 paragraphs).
3. 5 relevant hashtags.
{language}"#;
