//! Argument validation for tool parameters.
//!
//! Types, required fields, defaults and enums are enforced by
//! deserializing into the tool's params struct. Numeric bounds and
//! cross-field rules live in the [`Validate`] hook.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Constraint checks that serde cannot express.
pub trait Validate {
    fn validate(&self, _violations: &mut Violations) {}
}

/// Collected constraint violations, in the order they were found.
#[derive(Debug, Default)]
pub struct Violations(Vec<String>);

impl Violations {
    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn min(&mut self, field: &str, value: i64, min: i64) {
        if value < min {
            self.push(format!("{field} must be >= {min} (got {value})"));
        }
    }

    pub fn range(&mut self, field: &str, value: i64, min: i64, max: i64) {
        if value < min || value > max {
            self.push(format!("{field} must be between {min} and {max} (got {value})"));
        }
    }

    pub fn non_empty(&mut self, field: &str, len: usize) {
        if len == 0 {
            self.push(format!("{field} must not be empty"));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), Vec<String>> {
        if self.0.is_empty() { Ok(()) } else { Err(self.0) }
    }
}

/// Deserialize and validate tool arguments, applying declared defaults.
pub fn parse_params<P>(arguments: Map<String, Value>) -> Result<P, Vec<String>>
where
    P: DeserializeOwned + Validate,
{
    let params: P =
        serde_json::from_value(Value::Object(arguments)).map_err(|e| vec![e.to_string()])?;
    let mut violations = Violations::default();
    params.validate(&mut violations);
    violations.into_result()?;
    Ok(params)
}
