use derive_more::Display;
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use crate::error::ConfigError;

/// What happens when an `after` stage fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AfterErrorPolicy {
    /// The failure becomes the terminal error: remaining `after` calls are skipped
    /// and the `error` stage runs on every hook.
    #[default]
    #[display("promote")]
    Promote,
    /// The failure is logged and the resolved details are returned
    #[display("suppress")]
    Suppress,
}

/// Configuration of the hook executor
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutorConfig {
    /// Turn panics raised in `before` and `after` into stage failures instead of unwinding
    /// into the caller. Panics in `error` and `finally` are always caught.
    #[default = true]
    pub catch_panics: bool,
    /// Reject resolved values whose type differs from the requested flag type
    #[default = true]
    pub check_value_type: bool,
    pub after_error_policy: AfterErrorPolicy,
}

impl ExecutorConfig {
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_strict() {
        let config = ExecutorConfig::default();

        assert!(config.catch_panics);
        assert!(config.check_value_type);
        assert_eq!(config.after_error_policy, AfterErrorPolicy::Promote);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ExecutorConfig::from_json(r#"{ "after_error_policy": "suppress" }"#).unwrap();

        assert_eq!(config.after_error_policy, AfterErrorPolicy::Suppress);
        assert!(config.catch_panics);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = ExecutorConfig::from_json(r#"{ "retries": 3 }"#).unwrap_err();

        assert!(matches!(error, ConfigError::Parse(_)));
    }
}
