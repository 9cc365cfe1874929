//! SchemaSpec: an explicit, enumerable description of a structured output shape.
//!
//! Used twice per structured call: to render the format instructions embedded in
//! the prompt, and to validate/coerce whatever JSON the model sends back.

use serde_json::{Number, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Text,
    Integer,
}

impl ScalarType {
    fn label(self) -> &'static str {
        match self {
            ScalarType::Text => "string",
            ScalarType::Integer => "integer",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Scalar(ScalarType),
    ListOfScalar(ScalarType),
    Nested(SchemaSpec),
    /// A sequence of nested records.
    ListOfNested(SchemaSpec),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub description: String,
}

/// Ordered field descriptors. Immutable once built; every field is required.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaSpec {
    name: String,
    fields: Vec<FieldSpec>,
}

pub struct SchemaBuilder {
    name: String,
    fields: Vec<FieldSpec>,
}

impl SchemaBuilder {
    pub fn field(mut self, name: &str, kind: FieldKind, description: &str) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            kind,
            description: description.to_string(),
        });
        self
    }

    pub fn text(self, name: &str, description: &str) -> Self {
        self.field(name, FieldKind::Scalar(ScalarType::Text), description)
    }

    pub fn integer(self, name: &str, description: &str) -> Self {
        self.field(name, FieldKind::Scalar(ScalarType::Integer), description)
    }

    pub fn text_list(self, name: &str, description: &str) -> Self {
        self.field(name, FieldKind::ListOfScalar(ScalarType::Text), description)
    }

    /// No built-in stage declares a single nested record yet.
    #[allow(dead_code)]
    pub fn nested(self, name: &str, schema: SchemaSpec, description: &str) -> Self {
        self.field(name, FieldKind::Nested(schema), description)
    }

    pub fn nested_list(self, name: &str, schema: SchemaSpec, description: &str) -> Self {
        self.field(name, FieldKind::ListOfNested(schema), description)
    }

    pub fn build(self) -> SchemaSpec {
        SchemaSpec {
            name: self.name,
            fields: self.fields,
        }
    }
}

impl SchemaSpec {
    pub fn builder(name: &str) -> SchemaBuilder {
        SchemaBuilder {
            name: name.to_string(),
            fields: Vec::new(),
        }
    }

    /// Deterministic formatting instruction derived from the field list.
    pub fn format_instructions(&self) -> String {
        let mut out = format!(
            "Return a JSON object describing a {} with the following fields (all required):\n",
            self.name
        );
        self.write_fields(&mut out, 0);
        out
    }

    fn write_fields(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        for field in &self.fields {
            out.push_str(&format!(
                "{indent}- \"{}\" ({}): {}\n",
                field.name,
                kind_label(&field.kind),
                field.description
            ));
            match &field.kind {
                FieldKind::Nested(inner) | FieldKind::ListOfNested(inner) => {
                    inner.write_fields(out, depth + 1);
                }
                FieldKind::Scalar(_) | FieldKind::ListOfScalar(_) => {}
            }
        }
    }

    /// Validates `value` against the schema and returns the coerced value.
    ///
    /// Extra fields are kept but ignored. A missing or null required field, or a
    /// value that cannot be coerced to its declared kind, fails the whole value.
    pub fn validate(&self, value: &Value) -> Result<Value, String> {
        self.validate_at(value, "$")
    }

    fn validate_at(&self, value: &Value, path: &str) -> Result<Value, String> {
        let Value::Object(map) = value else {
            return Err(format!("{path}: expected an object, found {}", type_name(value)));
        };

        let mut out = map.clone();
        for field in &self.fields {
            let field_path = format!("{path}.{}", field.name);
            let raw = match map.get(&field.name) {
                Some(Value::Null) | None => {
                    return Err(format!("{field_path}: missing required field"));
                }
                Some(v) => v,
            };
            let coerced = coerce_kind(&field.kind, raw, &field_path)?;
            out.insert(field.name.clone(), coerced);
        }
        Ok(Value::Object(out))
    }
}

fn coerce_kind(kind: &FieldKind, value: &Value, path: &str) -> Result<Value, String> {
    match kind {
        FieldKind::Scalar(scalar) => coerce_scalar(*scalar, value, path),
        FieldKind::ListOfScalar(scalar) => {
            let items = expect_array(value, path)?;
            items
                .iter()
                .enumerate()
                .map(|(i, item)| coerce_scalar(*scalar, item, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        FieldKind::Nested(schema) => schema.validate_at(value, path),
        FieldKind::ListOfNested(schema) => {
            let items = expect_array(value, path)?;
            items
                .iter()
                .enumerate()
                .map(|(i, item)| schema.validate_at(item, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
    }
}

fn coerce_scalar(scalar: ScalarType, value: &Value, path: &str) -> Result<Value, String> {
    match (scalar, value) {
        (ScalarType::Text, Value::String(_)) => Ok(value.clone()),
        (ScalarType::Text, Value::Number(n)) => Ok(Value::String(n.to_string())),
        (ScalarType::Integer, Value::Number(n)) => {
            if n.is_i64() || n.is_u64() {
                Ok(value.clone())
            } else {
                n.as_f64()
                    .and_then(round_finite)
                    .ok_or_else(|| format!("{path}: number {n} is not representable as an integer"))
            }
        }
        (ScalarType::Integer, Value::String(s)) => {
            let digits = s.trim().trim_end_matches('%').trim();
            digits
                .parse::<i64>()
                .map(|n| Value::Number(Number::from(n)))
                .ok()
                .or_else(|| digits.parse::<f64>().ok().and_then(round_finite))
                .ok_or_else(|| format!("{path}: expected an integer, found \"{s}\""))
        }
        (scalar, other) => Err(format!(
            "{path}: expected {}, found {}",
            scalar.label(),
            type_name(other)
        )),
    }
}

fn round_finite(f: f64) -> Option<Value> {
    f.is_finite()
        .then(|| Value::Number(Number::from(f.round() as i64)))
}

fn expect_array<'a>(value: &'a Value, path: &str) -> Result<&'a Vec<Value>, String> {
    value
        .as_array()
        .ok_or_else(|| format!("{path}: expected an array, found {}", type_name(value)))
}

fn kind_label(kind: &FieldKind) -> String {
    match kind {
        FieldKind::Scalar(s) => s.label().to_string(),
        FieldKind::ListOfScalar(s) => format!("array of {}", s.label()),
        FieldKind::Nested(inner) => format!("object {}", inner.name),
        FieldKind::ListOfNested(inner) => format!("array of object {}", inner.name),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job_schema() -> SchemaSpec {
        SchemaSpec::builder("Job")
            .text("title", "Job title.")
            .integer("score", "Score 0-100.")
            .build()
    }

    fn outer_schema() -> SchemaSpec {
        SchemaSpec::builder("Report")
            .text("name", "Name.")
            .text_list("skills", "Skills.")
            .nested_list("jobs", job_schema(), "Jobs.")
            .build()
    }

    #[test]
    fn test_format_instructions_are_deterministic_and_nested() {
        let schema = outer_schema();
        let a = schema.format_instructions();
        let b = schema.format_instructions();
        assert_eq!(a, b);
        assert!(a.contains("- \"name\" (string): Name."));
        assert!(a.contains("- \"skills\" (array of string): Skills."));
        assert!(a.contains("- \"jobs\" (array of object Job): Jobs."));
        assert!(a.contains("  - \"score\" (integer): Score 0-100."));
    }

    #[test]
    fn test_fields_preserve_declaration_order() {
        let names: Vec<_> = outer_schema()
            .fields
            .iter()
            .map(|f| f.name.clone())
            .collect();
        assert_eq!(names, vec!["name", "skills", "jobs"]);
    }

    #[test]
    fn test_valid_value_passes_unchanged() {
        let value = json!({
            "name": "Ana",
            "skills": ["Rust", "SQL"],
            "jobs": [{"title": "Backend Engineer", "score": 90}]
        });
        assert_eq!(outer_schema().validate(&value).unwrap(), value);
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let value = json!({"title": "X", "score": 1, "extra": true});
        let validated = job_schema().validate(&value).unwrap();
        assert_eq!(validated["title"], "X");
    }

    #[test]
    fn test_missing_field_fails_with_path() {
        let value = json!({"name": "Ana", "skills": [], "jobs": [{"title": "X"}]});
        let err = outer_schema().validate(&value).unwrap_err();
        assert!(err.contains("$.jobs[0].score"), "{err}");
    }

    #[test]
    fn test_null_field_counts_as_missing() {
        let err = job_schema()
            .validate(&json!({"title": null, "score": 1}))
            .unwrap_err();
        assert!(err.contains("missing required field"));
    }

    #[test]
    fn test_integer_coercion_from_percent_string_and_float() {
        let v = job_schema()
            .validate(&json!({"title": "X", "score": "85%"}))
            .unwrap();
        assert_eq!(v["score"], 85);
        let v = job_schema()
            .validate(&json!({"title": "X", "score": 72.6}))
            .unwrap();
        assert_eq!(v["score"], 73);
        let v = job_schema()
            .validate(&json!({"title": "X", "score": "85.5"}))
            .unwrap();
        assert_eq!(v["score"], 86);
        let v = job_schema()
            .validate(&json!({"title": "X", "score": " 82.4% "}))
            .unwrap();
        assert_eq!(v["score"], 82);
        assert!(job_schema()
            .validate(&json!({"title": "X", "score": "NaN"}))
            .is_err());
    }

    #[test]
    fn test_nested_record_is_validated_and_described() {
        let schema = SchemaSpec::builder("Profile")
            .text("name", "Name.")
            .nested("best_job", job_schema(), "Best-fitting job.")
            .build();
        assert!(schema
            .format_instructions()
            .contains("- \"best_job\" (object Job): Best-fitting job."));

        let v = schema
            .validate(&json!({"name": "Ana", "best_job": {"title": "Analyst", "score": "90%"}}))
            .unwrap();
        assert_eq!(v["best_job"]["score"], 90);

        let err = schema
            .validate(&json!({"name": "Ana", "best_job": {"title": "Analyst"}}))
            .unwrap_err();
        assert!(err.contains("$.best_job.score: missing required field"), "{err}");

        assert!(schema
            .validate(&json!({"name": "Ana", "best_job": "Analyst"}))
            .is_err());
    }

    #[test]
    fn test_text_coercion_from_number() {
        let v = job_schema()
            .validate(&json!({"title": 42, "score": 1}))
            .unwrap();
        assert_eq!(v["title"], "42");
    }

    #[test]
    fn test_incompatible_types_fail() {
        assert!(job_schema()
            .validate(&json!({"title": ["a"], "score": 1}))
            .is_err());
        assert!(job_schema()
            .validate(&json!({"title": "X", "score": "high"}))
            .is_err());
        assert!(outer_schema()
            .validate(&json!({"name": "A", "skills": "Rust", "jobs": []}))
            .is_err());
        assert!(job_schema().validate(&json!(["not", "an", "object"])).is_err());
    }
}
