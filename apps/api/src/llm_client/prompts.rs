// Shared prompt fragments.
// Each module that calls the model defines its own prompts.rs alongside it.
// This file contains cross-cutting fragments.

/// Appended after the schema-derived format instructions of every structured stage.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    You MUST respond with a single valid JSON object only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Language directive for generated prose. Replace `{language}` before sending.
pub const LANGUAGE_INSTRUCTION: &str = "Write all prose in {language}.";

pub fn language_instruction(language: &str) -> String {
    LANGUAGE_INSTRUCTION.replace("{language}", language)
}
