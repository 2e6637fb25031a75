use std::collections::HashMap;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::error::{ErrorCode, EvaluationError, ResolutionError};

/// Types a flag can be evaluated as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagType {
    #[display("boolean")]
    Boolean,
    #[display("string")]
    String,
    #[display("integer")]
    Integer,
    #[display("float")]
    Float,
    #[display("object")]
    Object,
}

/// A resolved or default flag value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Object(Value),
}

impl FlagValue {
    pub fn flag_type(&self) -> FlagType {
        match self {
            FlagValue::Boolean(_) => FlagType::Boolean,
            FlagValue::String(_) => FlagType::String,
            FlagValue::Integer(_) => FlagType::Integer,
            FlagValue::Float(_) => FlagType::Float,
            FlagValue::Object(_) => FlagType::Object,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlagValue::String(s) => Some(s),
            _ => None,
        }
    }

    fn mismatch(self, expected: FlagType) -> ResolutionError {
        ResolutionError::type_mismatch(expected.to_string(), self.flag_type().to_string())
    }
}

impl TryFrom<FlagValue> for bool {
    type Error = ResolutionError;
    fn try_from(value: FlagValue) -> Result<Self, Self::Error> {
        match value {
            FlagValue::Boolean(b) => Ok(b),
            other => Err(other.mismatch(FlagType::Boolean)),
        }
    }
}

impl TryFrom<FlagValue> for String {
    type Error = ResolutionError;
    fn try_from(value: FlagValue) -> Result<Self, Self::Error> {
        match value {
            FlagValue::String(s) => Ok(s),
            other => Err(other.mismatch(FlagType::String)),
        }
    }
}

impl TryFrom<FlagValue> for i64 {
    type Error = ResolutionError;
    fn try_from(value: FlagValue) -> Result<Self, Self::Error> {
        match value {
            FlagValue::Integer(i) => Ok(i),
            other => Err(other.mismatch(FlagType::Integer)),
        }
    }
}

impl TryFrom<FlagValue> for f64 {
    type Error = ResolutionError;
    fn try_from(value: FlagValue) -> Result<Self, Self::Error> {
        match value {
            FlagValue::Float(f) => Ok(f),
            other => Err(other.mismatch(FlagType::Float)),
        }
    }
}

impl TryFrom<FlagValue> for Value {
    type Error = ResolutionError;
    fn try_from(value: FlagValue) -> Result<Self, Self::Error> {
        match value {
            FlagValue::Object(v) => Ok(v),
            other => Err(other.mismatch(FlagType::Object)),
        }
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        FlagValue::Boolean(value)
    }
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        FlagValue::String(value.to_string())
    }
}

impl From<String> for FlagValue {
    fn from(value: String) -> Self {
        FlagValue::String(value)
    }
}

impl From<i64> for FlagValue {
    fn from(value: i64) -> Self {
        FlagValue::Integer(value)
    }
}

impl From<f64> for FlagValue {
    fn from(value: f64) -> Self {
        FlagValue::Float(value)
    }
}

impl From<Value> for FlagValue {
    fn from(value: Value) -> Self {
        FlagValue::Object(value)
    }
}

/// Identity of the client that started an evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMetadata {
    pub domain: String,
}

impl ClientMetadata {
    pub fn new(domain: impl Into<String>) -> Self {
        Self { domain: domain.into() }
    }
}

/// Identity of the provider that resolves flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    pub name: String,
}

impl ProviderMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Why a value was resolved the way it was
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reason {
    #[display("STATIC")]
    Static,
    #[display("DEFAULT")]
    Default,
    #[display("TARGETING_MATCH")]
    TargetingMatch,
    #[display("SPLIT")]
    Split,
    #[display("CACHED")]
    Cached,
    #[display("DISABLED")]
    Disabled,
    #[default]
    #[display("UNKNOWN")]
    Unknown,
    #[display("ERROR")]
    Error,
}

/// Outcome of a flag resolution, handed to `after` hooks and returned to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationDetails {
    pub flag_key: String,
    pub flag_type: FlagType,
    pub value: FlagValue,
    pub variant: Option<String>,
    pub reason: Reason,
    pub error_code: Option<ErrorCode>,
    pub error_message: Option<String>,
    pub flag_metadata: HashMap<String, FlagValue>,
}

impl EvaluationDetails {
    pub fn new(flag_key: impl Into<String>, value: FlagValue) -> Self {
        Self {
            flag_key: flag_key.into(),
            flag_type: value.flag_type(),
            value,
            variant: None,
            reason: Reason::Unknown,
            error_code: None,
            error_message: None,
            flag_metadata: HashMap::new(),
        }
    }

    /// Details describing a failed evaluation that fell back to the default value
    pub fn from_error(flag_key: impl Into<String>, default_value: FlagValue, error: &EvaluationError) -> Self {
        Self {
            reason: Reason::Error,
            error_code: Some(error.error_code()),
            error_message: Some(error.to_string()),
            ..Self::new(flag_key, default_value)
        }
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    pub fn with_reason(mut self, reason: Reason) -> Self {
        self.reason = reason;
        self
    }

    pub fn with_flag_metadata(mut self, key: impl Into<String>, value: impl Into<FlagValue>) -> Self {
        self.flag_metadata.insert(key.into(), value.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.error_code.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HookError;

    #[test]
    fn conversions_report_type_mismatch() {
        let error = bool::try_from(FlagValue::from("on")).unwrap_err();

        assert_eq!(error.code, ErrorCode::TypeMismatch);
        assert_eq!(error.message, "expected boolean, found string");
        assert_eq!(i64::try_from(FlagValue::Integer(7)), Ok(7));
    }

    #[test]
    fn untagged_values_deserialize_by_shape() {
        let values: Vec<FlagValue> = serde_json::from_str(r#"[true, 3, 2.5, "blue", {"a": 1}]"#).unwrap();

        let types = values.iter().map(FlagValue::flag_type).collect::<Vec<_>>();
        assert_eq!(
            types,
            vec![FlagType::Boolean, FlagType::Integer, FlagType::Float, FlagType::String, FlagType::Object]
        );
    }

    #[test]
    fn details_from_error_fall_back_to_default() {
        let error = EvaluationError::before("guard", HookError::failed("nope"));
        let details = EvaluationDetails::from_error("banner", FlagValue::from(false), &error);

        assert_eq!(details.value, FlagValue::Boolean(false));
        assert_eq!(details.reason, Reason::Error);
        assert_eq!(details.error_code, Some(ErrorCode::General));
        assert!(details.is_error());
    }
}
