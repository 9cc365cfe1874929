//! StructuredOutputResolver: turns raw model text into a value conforming to a
//! `SchemaSpec` using a bounded two-phase protocol.
//!
//! Phase 1 (strict): the whole text must parse as JSON and validate.
//! Phase 2 (repair): strip code fences and a leading language tag, take the span
//! from the first `{` to the last `}`, parse and validate that.
//! There is no phase 3. A double failure is terminal for the call.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::structured::schema::SchemaSpec;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("generation did not produce usable structured output: {reason}")]
pub struct ResolutionFailure {
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(Value),
    Failed(ResolutionFailure),
}

impl Resolution {
    pub fn into_result(self) -> Result<Value, ResolutionFailure> {
        match self {
            Resolution::Resolved(value) => Ok(value),
            Resolution::Failed(failure) => Err(failure),
        }
    }
}

pub fn resolve(raw_text: &str, schema: &SchemaSpec) -> Resolution {
    let strict_reason = match strict_phase(raw_text, schema) {
        Ok(value) => return Resolution::Resolved(value),
        Err(reason) => reason,
    };

    match repair_phase(raw_text, schema) {
        Ok(value) => Resolution::Resolved(value),
        Err(repair_reason) => Resolution::Failed(ResolutionFailure {
            reason: format!("strict parse: {strict_reason}; repair: {repair_reason}"),
        }),
    }
}

/// Resolves and then deserializes into the stage's typed output.
pub fn resolve_as<T: DeserializeOwned>(
    raw_text: &str,
    schema: &SchemaSpec,
) -> Result<T, ResolutionFailure> {
    let value = resolve(raw_text, schema).into_result()?;
    serde_json::from_value(value).map_err(|e| ResolutionFailure {
        reason: format!("typed conversion: {e}"),
    })
}

fn strict_phase(raw_text: &str, schema: &SchemaSpec) -> Result<Value, String> {
    let value: Value = serde_json::from_str(raw_text.trim()).map_err(|e| e.to_string())?;
    schema.validate(&value)
}

fn repair_phase(raw_text: &str, schema: &SchemaSpec) -> Result<Value, String> {
    let cleaned = strip_wrappers(raw_text);
    let block = outermost_object(&cleaned).ok_or_else(|| "no JSON object found".to_string())?;
    let value: Value = serde_json::from_str(block).map_err(|e| e.to_string())?;
    schema.validate(&value)
}

/// Removes code-fence markers (with any language tag directly after an opening
/// fence) and a bare leading `json` tag.
fn strip_wrappers(raw_text: &str) -> String {
    let mut out = String::with_capacity(raw_text.len());
    let mut rest = raw_text;

    while let Some(idx) = rest.find("```") {
        out.push_str(&rest[..idx]);
        rest = &rest[idx + 3..];
        let tag_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        let after_tag = &rest[tag_len..];
        if after_tag.starts_with(&['\n', '\r'][..]) {
            rest = after_tag;
        }
    }
    out.push_str(rest);

    let trimmed = out.trim();
    let trimmed = ["json", "JSON"]
        .iter()
        .find_map(|tag| trimmed.strip_prefix(tag))
        .map(str::trim_start)
        .unwrap_or(trimmed);
    trimmed.to_string()
}

fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}
