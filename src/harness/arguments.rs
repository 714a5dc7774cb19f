use crate::errors::{AppError, AppResult};
use crate::models::MAX_PAGE_NUMBER;
use serde_json::{Map, Value};

/// Checks `arguments` against a tool's input schema. Returns every violation, prefixed
/// with its instance path when there is one.
pub fn schema_errors(arguments: &Value, schema: &Value) -> AppResult<Vec<String>> {
    let compiled = jsonschema::JSONSchema::compile(schema)
        .map_err(|error| AppError::Internal(format!("Failed to compile tool input schema: {}", error)))?;

    let errors = compiled
        .validate(arguments)
        .err()
        .map(|errors| {
            errors
                .map(|error| {
                    let path = error.instance_path.to_string();
                    if path.is_empty() {
                        error.to_string()
                    } else {
                        format!("{}: {}", path, error)
                    }
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    Ok(errors)
}

/// Validated tool arguments with typed accessors.
#[derive(Debug, Clone, Default)]
pub struct ToolArguments {
    values: Map<String, Value>,
}

impl ToolArguments {
    /// Absent or null arguments are treated as an empty object.
    pub fn parse(arguments: Option<Value>, schema: &Value) -> AppResult<Self> {
        let arguments = match arguments {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(value) => value,
        };
        let errors = schema_errors(&arguments, schema)?;
        if !errors.is_empty() {
            return Err(AppError::InvalidArguments(errors.join("; ")));
        }
        match arguments {
            Value::Object(values) => Ok(Self { values }),
            _ => Err(AppError::InvalidArguments("arguments must be an object".to_string())),
        }
    }

    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn required_str(&self, key: &str) -> AppResult<String> {
        self.optional_str(key)
            .ok_or_else(|| AppError::InvalidArguments(format!("'{}' is required", key)))
    }

    /// Non-blank string value, trimmed. Numbers are accepted and rendered as text.
    pub fn optional_str(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            Value::String(value) => {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(value) => Some(value.to_string()),
            _ => None,
        }
    }

    pub fn u32_or(&self, key: &str, default: u32) -> u32 {
        self.values
            .get(key)
            .and_then(Value::as_u64)
            .map(|value| value.min(u64::from(u32::MAX)) as u32)
            .unwrap_or(default)
    }

    pub fn i64_or(&self, key: &str, default: i64) -> i64 {
        self.values.get(key).and_then(Value::as_i64).unwrap_or(default)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.values.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    /// 1-based `page` argument converted to a 0-based page index.
    pub fn page_index(&self) -> u32 {
        self.page_index_of("page")
    }

    pub fn page_index_of(&self, key: &str) -> u32 {
        self.u32_or(key, 1).clamp(1, MAX_PAGE_NUMBER) - 1
    }
}
