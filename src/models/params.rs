//! Typed parameter values for test definitions
//!
//! Definition files carry loosely typed parameter bags. They are parsed into
//! [`ParamValue`]s once, and every read goes through an accessor that names
//! the type it wants and fails loudly when the value has another shape.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Parameter access errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    #[error("Missing required parameter '{key}'")]
    Missing { key: String },

    #[error("Parameter '{key}' has type {found}, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Parameter '{key}' is invalid: {reason}")]
    Invalid { key: String, reason: String },
}

/// A single parameter value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "integer",
            ParamValue::Float(_) => "float",
            ParamValue::Text(_) => "string",
        }
    }

    /// Numeric view; integers widen to float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

/// Ordered parameter mapping owned by a single test unit
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Parameters(BTreeMap<String, ParamValue>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    fn require(&self, key: &str) -> Result<&ParamValue, ParamError> {
        self.0.get(key).ok_or_else(|| ParamError::Missing {
            key: key.to_string(),
        })
    }

    fn mismatch(key: &str, expected: &'static str, found: &ParamValue) -> ParamError {
        ParamError::TypeMismatch {
            key: key.to_string(),
            expected,
            found: found.type_name(),
        }
    }

    pub fn f64(&self, key: &str) -> Result<f64, ParamError> {
        let value = self.require(key)?;
        value
            .as_f64()
            .ok_or_else(|| Self::mismatch(key, "number", value))
    }

    pub fn i64(&self, key: &str) -> Result<i64, ParamError> {
        let value = self.require(key)?;
        value
            .as_i64()
            .ok_or_else(|| Self::mismatch(key, "integer", value))
    }

    pub fn bool(&self, key: &str) -> Result<bool, ParamError> {
        let value = self.require(key)?;
        value
            .as_bool()
            .ok_or_else(|| Self::mismatch(key, "bool", value))
    }

    pub fn str(&self, key: &str) -> Result<&str, ParamError> {
        let value = self.require(key)?;
        value
            .as_str()
            .ok_or_else(|| Self::mismatch(key, "string", value))
    }

    /// Read an optional number; absent keys yield `default`, mistyped keys fail
    pub fn f64_or(&self, key: &str, default: f64) -> Result<f64, ParamError> {
        match self.0.get(key) {
            None => Ok(default),
            Some(_) => self.f64(key),
        }
    }

    pub fn i64_or(&self, key: &str, default: i64) -> Result<i64, ParamError> {
        match self.0.get(key) {
            None => Ok(default),
            Some(_) => self.i64(key),
        }
    }

    /// Read an optional non-negative integer that must fit `T`
    pub fn count_or<T>(&self, key: &str, default: T) -> Result<T, ParamError>
    where
        T: TryFrom<i64> + Copy,
    {
        match self.0.get(key) {
            None => Ok(default),
            Some(_) => {
                let raw = self.i64(key)?;
                T::try_from(raw).map_err(|_| ParamError::Invalid {
                    key: key.to_string(),
                    reason: format!("{raw} is out of range"),
                })
            }
        }
    }
}

impl FromIterator<(String, ParamValue)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_parsing() {
        let params: Parameters = serde_json::from_str(
            r#"{"targetVoltage": 12.0, "durationMs": 500, "canID": "0x18FF50E5", "armed": true}"#,
        )
        .unwrap();

        assert_eq!(params.get("targetVoltage"), Some(&ParamValue::Float(12.0)));
        assert_eq!(params.get("durationMs"), Some(&ParamValue::Int(500)));
        assert_eq!(params.str("canID").unwrap(), "0x18FF50E5");
        assert!(params.bool("armed").unwrap());
    }

    #[test]
    fn test_integer_widens_to_float() {
        let params = Parameters::new().with("targetCurrent", 5i64);
        assert_eq!(params.f64("targetCurrent").unwrap(), 5.0);
    }

    #[test]
    fn test_type_mismatch_is_loud() {
        let params = Parameters::new().with("tolerance", "wide");
        let err = params.f64("tolerance").unwrap_err();
        assert_eq!(
            err,
            ParamError::TypeMismatch {
                key: "tolerance".to_string(),
                expected: "number",
                found: "string",
            }
        );
        assert!(params.f64_or("tolerance", 0.1).is_err());
    }

    #[test]
    fn test_missing_and_defaults() {
        let params = Parameters::new();
        assert!(matches!(
            params.f64("targetVoltage"),
            Err(ParamError::Missing { .. })
        ));
        assert_eq!(params.f64_or("tolerance", 0.1).unwrap(), 0.1);
        assert_eq!(params.i64_or("maxRetries", 3).unwrap(), 3);
    }

    #[test]
    fn test_count_rejects_negative() {
        let params = Parameters::new().with("maxRetries", -1i64);
        assert!(matches!(
            params.count_or::<u32>("maxRetries", 3),
            Err(ParamError::Invalid { .. })
        ));

        let params = Parameters::new().with("maxRetries", 2i64);
        assert_eq!(params.count_or::<u32>("maxRetries", 3).unwrap(), 2);
    }
}
