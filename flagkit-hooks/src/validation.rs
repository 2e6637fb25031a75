use async_trait::async_trait;
use flagkit_core::error::ConfigError;
use flagkit_core::{Hook, HookContext, HookError, HookHints, HookResult};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DEFAULT_FLAG_KEY: Regex =
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._\-/]*$").expect("default flag key pattern is valid");
}

/// Rejects evaluations whose flag key does not match a pattern.
///
/// Runs in `before`, so a malformed key never reaches the resolver. Optionally
/// also requires the evaluation context to carry a targeting key.
#[derive(Debug, Clone)]
pub struct FlagKeyValidationHook {
    pattern: Regex,
    require_targeting_key: bool,
}

impl Default for FlagKeyValidationHook {
    fn default() -> Self {
        Self::new()
    }
}

impl FlagKeyValidationHook {
    /// Validator using `^[A-Za-z0-9][A-Za-z0-9._\-/]*$`
    pub fn new() -> Self {
        Self {
            pattern: DEFAULT_FLAG_KEY.clone(),
            require_targeting_key: false,
        }
    }

    pub fn with_pattern(pattern: &str) -> Result<Self, ConfigError> {
        let pattern = Regex::new(pattern).map_err(|e| ConfigError::invalid_value("pattern", e.to_string()))?;
        Ok(Self {
            pattern,
            require_targeting_key: false,
        })
    }

    pub fn requiring_targeting_key(mut self) -> Self {
        self.require_targeting_key = true;
        self
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    fn validate(&self, ctx: &HookContext) -> Result<(), HookError> {
        let flag_key = ctx.flag_key();
        if !self.pattern.is_match(flag_key) {
            return Err(HookError::invalid_context(format!(
                "flag key '{}' does not match '{}'",
                flag_key,
                self.pattern.as_str()
            )));
        }

        if self.require_targeting_key && ctx.evaluation_context().targeting_key().is_none_or(str::is_empty) {
            return Err(HookError::invalid_context(format!(
                "flag '{flag_key}' requires a targeting key"
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl Hook for FlagKeyValidationHook {
    fn name(&self) -> &str {
        "flag-key-validation"
    }

    async fn before(&self, ctx: &HookContext, _hints: &HookHints) -> HookResult {
        self.validate(ctx)?;
        Ok(None)
    }
}
