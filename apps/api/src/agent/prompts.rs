// System instruction and context assembly for the career coach agent.

use crate::llm_client::prompts::language_instruction;
use crate::llm_client::ToolDeclaration;
use crate::pipeline::{CareerAnalysis, ResumeData};

const SYSTEM_PREAMBLE: &str = "You are a professional AI career coach agent. Your main job is \
to give strategic career advice. Use the tools listed below if and only if the user asks for \
what they produce or the conversation clearly needs it. When you use a tool, build your final \
answer from its output.";

const RESPONSE_RULES: &str = r#"IMPORTANT RESPONSE RULES:
1. Career or skill questions: answer professionally and use tools when needed.
2. Questions outside the career domain (for example "why is the sky blue" or a cooking recipe):
   - Answer the question briefly and politely.
   - You MUST then end your answer with a transition sentence that steers the user back to their career, for example: "By the way, how is your career preparation going? Is there anything about your CV or skills you would like to discuss?"
3. Requests for a mock interview or interview practice: direct the user to the Interview Simulation feature instead of running one yourself."#;

/// Reply used when the tool loop ends without any usable text or observation.
pub const NO_ANSWER_FALLBACK: &str = "I could not finish preparing an answer this time. \
Please try asking again, perhaps in a more specific way.";

/// Builds the system instruction presented on every agent decision.
pub fn system_instruction(catalog: &[ToolDeclaration], context: &str, language: &str) -> String {
    let tools = catalog
        .iter()
        .map(|t| format!("- {} ({}): {}", t.name, t.argument, t.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{SYSTEM_PREAMBLE}\n\nAVAILABLE TOOLS:\n{tools}\n\n{RESPONSE_RULES}\n\n{}\n\n\
         Current user profile:\n{context}",
        language_instruction(language)
    )
}

/// Free-form context text: the profile, plus the analysis when one exists.
pub fn profile_context(resume: &ResumeData, analysis: Option<&CareerAnalysis>) -> String {
    let mut context = resume.profile_line();
    if let Some(analysis) = analysis {
        let jobs = analysis
            .recommendations
            .iter()
            .map(|r| format!("{} ({})", r.job_title, r.match_score))
            .collect::<Vec<_>>()
            .join(", ");
        context.push_str(&format!(
            "\nRecommended jobs: {jobs}\nSkill gap: {}",
            analysis.skill_gap_analysis
        ));
    }
    context
}
