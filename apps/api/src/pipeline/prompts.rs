// All LLM prompt templates for the analysis pipeline.
// Placeholders are bound by `structured::template::render`; `{format_instructions}`
// receives the stage schema's formatting hint.

/// Profile extraction. Binds: {resume_text}, {json_only}
pub const PROFILE_EXTRACTION_TEMPLATE: &str = r#"You are a precise resume data extractor.
Extract the candidate profile from the resume below.

{format_instructions}
Rules:
1. "primary_skills" lists the 5 to 10 most important technical skills, most important first.
2. "summary" is a 2-3 sentence executive summary of the candidate.
3. Use only facts present in the resume. If the name is missing, use "Unknown".

{json_only}

RESUME:
{resume_text}"#;

/// Career-fit analysis. Binds: {profile}, {language}, {json_only}
pub const CAREER_ANALYSIS_TEMPLATE: &str = r#"You are a senior career strategist.
Based on the candidate profile below, suggest exactly 3 specific job titles the candidate fits,
and give a concrete skill-gap analysis with development advice.

CANDIDATE PROFILE:
{profile}

{format_instructions}
Rules:
1. "match_score" is a percentage string between "0%" and "100%", e.g. "85%".
2. "rationale" explains in at most 2 sentences why the role fits.
3. Order recommendations from best to weakest fit.
4. {language}

{json_only}"#;

/// Interview question generation (free text, used verbatim). Binds: {job_title}, {language}
pub const INTERVIEW_QUESTION_TEMPLATE: &str = "Write exactly 1 difficult, specific and technical \
interview question for the position '{job_title}'. Write only the question itself, with no \
introduction or closing sentence. {language}";

/// Interview answer evaluation. Binds: {job_title}, {question}, {answer}, {language}, {json_only}
pub const ANSWER_EVALUATION_TEMPLATE: &str = r#"You are a senior interviewer for the position {job_title}.

Question: {question}
Candidate answer: {answer}

Give an honest and detailed assessment of the answer.
{format_instructions}
Rules:
1. "score" is an integer from 0 to 100.
2. "model_answer" is an ideal answer to the same question.
3. {language}

{json_only}"#;
