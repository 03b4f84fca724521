//! Per-document-type field schemas.
//!
//! A [`Schema`] is a static table of typed, described fields plus optional
//! record-level rules. The same table drives prompt rendering (field
//! descriptions, in declaration order) and response validation.

pub mod dates;
mod definitions;

pub use definitions::{DRIVING_LICENSE, EDUCATION, LINE_ITEM, RESUME, SHOP_RECEIPT, WORK_EXPERIENCE};

use serde_json::{Map, Number, Value};

use crate::error::{ValidationReport, Violation};

/// Primitive kind of a schema field.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// JSON string.
    String,
    /// JSON number; numeric strings are accepted and normalized.
    Number,
    /// String in `MM/DD/YYYY` format.
    Date,
    /// Array of strings.
    StringList,
    /// Array of objects, each checked against the nested schema.
    ObjectList(&'static Schema),
}

impl FieldKind {
    fn expected(&self) -> &'static str {
        match self {
            FieldKind::String | FieldKind::Date => "a string",
            FieldKind::Number => "a number",
            FieldKind::StringList => "a list of strings",
            FieldKind::ObjectList(_) => "a list of objects",
        }
    }
}

/// Value used when an optional field is missing from the reply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    Null,
    Number(f64),
}

impl FieldDefault {
    fn to_value(self) -> Value {
        match self {
            FieldDefault::Null => Value::Null,
            FieldDefault::Number(n) => Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null),
        }
    }
}

/// One declared field.
#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: FieldDefault,
    /// Reused verbatim in prompts.
    pub description: &'static str,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: FieldDefault::Null,
            description,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: FieldDefault::Null,
            description,
        }
    }

    pub const fn with_default(mut self, default: FieldDefault) -> Self {
        self.default = default;
        self
    }

    /// Normalize one field value, recording violations under `path`.
    fn check(&self, raw: Option<&Value>, path: &str, violations: &mut Vec<Violation>) -> Value {
        let Some(value) = raw else {
            if self.required {
                violations.push(Violation::new(path, "field required"));
            }
            return self.default.to_value();
        };

        match self.kind {
            FieldKind::Date => self.check_date(value, path, violations),
            _ if value.is_null() => {
                if self.required {
                    violations.push(self.type_violation(path, value));
                }
                Value::Null
            }
            FieldKind::String => match value {
                Value::String(_) => value.clone(),
                _ => {
                    violations.push(self.type_violation(path, value));
                    Value::Null
                }
            },
            FieldKind::Number => match to_number(value) {
                Some(n) => Value::Number(n),
                None => {
                    violations.push(self.type_violation(path, value));
                    Value::Null
                }
            },
            FieldKind::StringList => {
                let Value::Array(items) = value else {
                    violations.push(self.type_violation(path, value));
                    return Value::Null;
                };
                for (i, item) in items.iter().enumerate() {
                    if !item.is_string() {
                        violations.push(Violation::new(
                            format!("{path}[{i}]"),
                            format!("expected a string, got {}", describe(item)),
                        ));
                    }
                }
                value.clone()
            }
            FieldKind::ObjectList(schema) => {
                let Value::Array(items) = value else {
                    violations.push(self.type_violation(path, value));
                    return Value::Null;
                };
                let checked = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let record = schema.check_record(item, &format!("{path}[{i}]"), violations);
                        Value::Object(record)
                    })
                    .collect();
                Value::Array(checked)
            }
        }
    }

    fn check_date(&self, value: &Value, path: &str, violations: &mut Vec<Violation>) -> Value {
        if dates::is_unknown(value) {
            if self.required {
                violations.push(Violation::new(path, "field required"));
            }
            return Value::Null;
        }

        match value.as_str().and_then(dates::parse_date) {
            Some(_) => value.clone(),
            None => {
                violations.push(Violation::new(path, dates::format_error(value)));
                Value::Null
            }
        }
    }

    fn type_violation(&self, path: &str, value: &Value) -> Violation {
        Violation::new(
            path,
            format!("expected {}, got {}", self.kind.expected(), describe(value)),
        )
    }
}

/// Record-level rule run after every field passed its own checks.
pub type RecordRule = fn(&Map<String, Value>) -> Result<(), Violation>;

/// A named, ordered set of fields with optional cross-field rules.
#[derive(Debug)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
    pub rules: &'static [RecordRule],
}

impl Schema {
    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field name -> description table, in declaration order.
    pub fn descriptions(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|f| (f.name.to_string(), Value::String(f.description.to_string())))
            .collect()
    }

    /// Validate a parsed reply.
    ///
    /// On success the returned record holds every declared field, in
    /// declaration order, with missing optional fields set to their default.
    /// Undeclared keys are dropped.
    pub fn validate(&self, value: &Value) -> Result<Map<String, Value>, ValidationReport> {
        let mut violations = Vec::new();
        let record = self.check_record(value, "", &mut violations);

        if violations.is_empty() {
            Ok(record)
        } else {
            Err(ValidationReport {
                schema: self.name,
                violations,
            })
        }
    }

    fn check_record(
        &self,
        value: &Value,
        prefix: &str,
        violations: &mut Vec<Violation>,
    ) -> Map<String, Value> {
        let Value::Object(object) = value else {
            let path = if prefix.is_empty() { "<root>" } else { prefix };
            violations.push(Violation::new(
                path,
                format!("expected an object, got {}", describe(value)),
            ));
            return Map::new();
        };

        let before = violations.len();
        let mut record = Map::new();
        for field in self.fields {
            let path = if prefix.is_empty() {
                field.name.to_string()
            } else {
                format!("{prefix}.{}", field.name)
            };
            let checked = field.check(object.get(field.name), &path, violations);
            record.insert(field.name.to_string(), checked);
        }

        if violations.len() == before {
            for rule in self.rules {
                if let Err(mut violation) = rule(&record) {
                    if !prefix.is_empty() {
                        violation.field = format!("{prefix}.{}", violation.field);
                    }
                    violations.push(violation);
                }
            }
        }

        record
    }
}

fn to_number(value: &Value) -> Option<Number> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    Number::from_f64(n)
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
