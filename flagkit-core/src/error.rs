use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine readable classification of an evaluation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    #[display("PROVIDER_NOT_READY")]
    ProviderNotReady,
    #[display("FLAG_NOT_FOUND")]
    FlagNotFound,
    #[display("PARSE_ERROR")]
    ParseError,
    #[display("TYPE_MISMATCH")]
    TypeMismatch,
    #[display("TARGETING_KEY_MISSING")]
    TargetingKeyMissing,
    #[display("INVALID_CONTEXT")]
    InvalidContext,
    #[display("GENERAL")]
    General,
}

/// Error returned by the `before` and `after` stages of a hook
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HookError {
    #[error("hook failed: {message}")]
    Failed { message: String },

    #[error("invalid evaluation context: {message}")]
    InvalidContext { message: String },

    #[error("hook observed cancellation")]
    Cancelled,

    #[error("hook panicked: {message}")]
    Panicked { message: String },
}

impl HookError {
    /// Create a generic stage failure
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed { message: message.into() }
    }

    /// Create a failure caused by an unusable evaluation context
    pub fn invalid_context(message: impl Into<String>) -> Self {
        Self::InvalidContext { message: message.into() }
    }

    pub fn panicked(message: impl Into<String>) -> Self {
        Self::Panicked { message: message.into() }
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidContext { .. } => ErrorCode::InvalidContext,
            Self::Failed { .. } | Self::Cancelled | Self::Panicked { .. } => ErrorCode::General,
        }
    }
}

/// Error reported by the resolution engine
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{code}: {message}")]
pub struct ResolutionError {
    pub code: ErrorCode,
    pub message: String,
}

impl ResolutionError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn flag_not_found(flag_key: &str) -> Self {
        Self::new(ErrorCode::FlagNotFound, format!("flag '{flag_key}' not found"))
    }

    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::TypeMismatch,
            format!("expected {}, found {}", expected.into(), found.into()),
        )
    }

    pub fn provider_not_ready(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProviderNotReady, message)
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::General, message)
    }
}

/// Terminal error of a single evaluation.
///
/// Exactly one of these reaches the caller; it is also the value handed to every
/// `error` stage of the hooks that ran.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("before hook '{hook}' failed: {source}")]
    Before {
        hook: String,
        #[source]
        source: HookError,
    },

    #[error("flag resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("after hook '{hook}' failed: {source}")]
    After {
        hook: String,
        #[source]
        source: HookError,
    },

    #[error("evaluation cancelled")]
    Cancelled,

    #[error("evaluation deadline exceeded")]
    DeadlineExceeded,
}

impl EvaluationError {
    pub fn before(hook: impl Into<String>, source: HookError) -> Self {
        Self::Before {
            hook: hook.into(),
            source,
        }
    }

    pub fn after(hook: impl Into<String>, source: HookError) -> Self {
        Self::After {
            hook: hook.into(),
            source,
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Before { source, .. } | Self::After { source, .. } => source.error_code(),
            Self::Resolution(error) => error.code,
            Self::Cancelled | Self::DeadlineExceeded => ErrorCode::General,
        }
    }

    /// Name of the hook that produced the error, if any
    pub fn hook(&self) -> Option<&str> {
        match self {
            Self::Before { hook, .. } | Self::After { hook, .. } => Some(hook),
            _ => None,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for flag evaluations
pub type FlagkitResult<T> = Result<T, EvaluationError>;

// Macro for failing a hook stage
#[macro_export]
macro_rules! hook_error {
    ($msg:expr) => {
        Err($crate::error::HookError::failed($msg))
    };
    ($fmt:expr, $($arg:tt)*) => {
        Err($crate::error::HookError::failed(format!($fmt, $($arg)*)))
    };
}

// Macro for resolution errors with an explicit code
#[macro_export]
macro_rules! resolution_error {
    ($code:expr, $msg:expr) => {
        Err($crate::error::ResolutionError::new($code, $msg))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        Err($crate::error::ResolutionError::new($code, format!($fmt, $($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn before_error_keeps_hook_and_source() {
        let error = EvaluationError::before("audit", HookError::invalid_context("missing tenant"));

        assert_eq!(error.hook(), Some("audit"));
        assert_eq!(error.error_code(), ErrorCode::InvalidContext);
        assert_eq!(
            error.to_string(),
            "before hook 'audit' failed: invalid evaluation context: missing tenant"
        );
        assert!(error.source().is_some());
    }

    #[test]
    fn resolution_error_converts_and_keeps_code() {
        let error: EvaluationError = ResolutionError::flag_not_found("checkout").into();

        assert_eq!(error.error_code(), ErrorCode::FlagNotFound);
        assert_eq!(error.hook(), None);
        assert_eq!(
            error.to_string(),
            "flag resolution failed: FLAG_NOT_FOUND: flag 'checkout' not found"
        );
    }

    #[test]
    fn macros_build_errors() {
        let hook: Result<(), HookError> = hook_error!("quota {} exceeded", 3);
        assert_eq!(hook, Err(HookError::failed("quota 3 exceeded")));

        let resolution: Result<(), ResolutionError> = resolution_error!(ErrorCode::ParseError, "bad json");
        assert_eq!(resolution.unwrap_err().code, ErrorCode::ParseError);
    }
}
