//! PromptRenderer: binds a template, an optional schema, and named variables
//! into the literal request text.
//!
//! Placeholder syntax:
//! - `{name}`  required; rendering fails if `name` is unbound
//! - `{name?}` optional; renders empty when unbound
//! - `{format_instructions}` receives the schema-derived formatting hint
//!
//! A `{` not followed by `[a-z0-9_]+` and `}` is literal text, so JSON examples
//! need no escaping. Substituted values are never re-scanned.

use std::collections::HashMap;

use thiserror::Error;

use crate::structured::schema::SchemaSpec;

pub const FORMAT_INSTRUCTIONS: &str = "format_instructions";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    #[error("template placeholder '{0}' has no bound variable")]
    MissingVariable(String),
}

pub fn render(
    template: &str,
    schema: Option<&SchemaSpec>,
    variables: &HashMap<&str, &str>,
) -> Result<String, TemplateError> {
    let format_instructions = schema.map(SchemaSpec::format_instructions);
    let mut out = String::with_capacity(template.len() + 256);
    let mut injected_schema = false;
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match parse_placeholder(after) {
            Some((name, optional, consumed)) => {
                if name == FORMAT_INSTRUCTIONS {
                    if let Some(instructions) = &format_instructions {
                        out.push_str(instructions);
                        injected_schema = true;
                    } else if let Some(value) = variables.get(name) {
                        out.push_str(value);
                    } else if !optional {
                        return Err(TemplateError::MissingVariable(name.to_string()));
                    }
                } else if let Some(value) = variables.get(name) {
                    out.push_str(value);
                } else if !optional {
                    return Err(TemplateError::MissingVariable(name.to_string()));
                }
                rest = &after[consumed..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);

    // A schema without a designated placeholder still reaches the model.
    if let (Some(instructions), false) = (format_instructions, injected_schema) {
        out.push_str("\n\n");
        out.push_str(&instructions);
    }

    Ok(out)
}

/// Parses `name}` or `name?}` at the start of `s`.
/// Returns the name, whether it is optional, and the bytes consumed.
fn parse_placeholder(s: &str) -> Option<(&str, bool, usize)> {
    let name_len = s
        .find(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'))
        .unwrap_or(s.len());
    if name_len == 0 {
        return None;
    }
    let name = &s[..name_len];
    let tail = &s[name_len..];
    if tail.starts_with('}') {
        Some((name, false, name_len + 1))
    } else if tail.starts_with("?}") {
        Some((name, true, name_len + 2))
    } else {
        None
    }
}
