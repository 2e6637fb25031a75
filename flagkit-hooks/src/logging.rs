use async_trait::async_trait;
use flagkit_core::error::ConfigError;
use flagkit_core::{EvaluationContext, EvaluationDetails, EvaluationError, Hook, HookContext, HookHints, HookResult};
use log::{Level, log};
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

/// Settings for [`LoggingHook`]
#[derive(Debug, Clone, PartialEq, SmartDefault, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Level used for `before`, `after` and `finally`. Errors always log at `error`.
    #[default(Level::Debug)]
    pub level: Level,

    /// Append the evaluation context attributes to every line
    #[default = false]
    pub include_context: bool,
}

impl LoggingConfig {
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }
}

/// Logs each lifecycle stage through the `log` facade
#[derive(Debug, Default)]
pub struct LoggingHook {
    config: LoggingConfig,
}

impl LoggingHook {
    pub fn new(config: LoggingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }

    fn describe(&self, stage: &str, ctx: &HookContext) -> String {
        let mut line = format!(
            "stage={} domain={} provider={} flag_key={} default_value={:?}",
            stage,
            ctx.client_metadata().domain,
            ctx.provider_metadata().name,
            ctx.flag_key(),
            ctx.default_value(),
        );
        if self.config.include_context {
            line.push_str(&format!(" context={}", render_context(ctx.evaluation_context())));
        }
        line
    }
}

fn render_context(context: &EvaluationContext) -> String {
    let mut keys: Vec<&String> = context.attributes().keys().collect();
    keys.sort();

    let attributes = keys
        .into_iter()
        .filter_map(|key| context.attribute(key).map(|value| format!("{key}={value:?}")))
        .collect::<Vec<_>>()
        .join(",");

    match context.targeting_key() {
        Some(targeting_key) => format!("{{targeting_key={targeting_key},{attributes}}}"),
        None => format!("{{{attributes}}}"),
    }
}

#[async_trait]
impl Hook for LoggingHook {
    fn name(&self) -> &str {
        "logging"
    }

    async fn before(&self, ctx: &HookContext, _hints: &HookHints) -> HookResult {
        log!(self.config.level, "{}", self.describe("before", ctx));
        Ok(None)
    }

    async fn after(&self, ctx: &HookContext, details: &EvaluationDetails, _hints: &HookHints) -> HookResult {
        log!(
            self.config.level,
            "{} reason={} variant={} value={:?}",
            self.describe("after", ctx),
            details.reason,
            details.variant.as_deref().unwrap_or("-"),
            details.value,
        );
        Ok(None)
    }

    async fn error(&self, ctx: &HookContext, error: &EvaluationError, _hints: &HookHints) -> Option<EvaluationContext> {
        log!(
            Level::Error,
            "{} error_code={} error_message={}",
            self.describe("error", ctx),
            error.error_code(),
            error,
        );
        None
    }

    async fn finally(&self, ctx: &HookContext, _hints: &HookHints) -> Option<EvaluationContext> {
        log!(self.config.level, "{}", self.describe("finally", ctx));
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flagkit_core::{ClientMetadata, FlagType, FlagValue, ProviderMetadata};

    fn hook_context(context: EvaluationContext) -> HookContext {
        HookContext::new(
            "new-checkout",
            FlagType::Boolean,
            FlagValue::Boolean(false),
            ClientMetadata::new("checkout"),
            ProviderMetadata::new("static"),
            context,
        )
    }

    #[test]
    fn config_defaults_to_debug_without_context() {
        let config = LoggingConfig::from_json("{}").unwrap();
        assert_eq!(config, LoggingConfig::default());
        assert_eq!(config.level, Level::Debug);
        assert!(!config.include_context);
    }

    #[test]
    fn config_rejects_unknown_fields() {
        assert!(LoggingConfig::from_json(r#"{"verbose": true}"#).is_err());
    }

    #[test]
    fn describe_omits_context_unless_enabled() {
        let ctx = hook_context(EvaluationContext::new().with_attribute("plan", "pro"));

        let quiet = LoggingHook::default().describe("before", &ctx);
        assert!(quiet.starts_with("stage=before domain=checkout provider=static flag_key=new-checkout"));
        assert!(!quiet.contains("context="));

        let verbose = LoggingHook::new(LoggingConfig {
            include_context: true,
            ..LoggingConfig::default()
        })
        .describe("before", &ctx);
        assert!(verbose.contains("context={plan="));
    }

    #[test]
    fn context_is_rendered_in_key_order() {
        let context = EvaluationContext::new()
            .with_targeting_key("user-1")
            .with_attribute("zone", "eu")
            .with_attribute("age", 30i64);

        assert_eq!(
            render_context(&context),
            r#"{targeting_key=user-1,age=Integer(30),zone=String("eu")}"#
        );
    }

    #[tokio::test]
    async fn never_changes_context_or_fails() {
        let hook = LoggingHook::default();
        let ctx = hook_context(EvaluationContext::new());
        let hints = HookHints::empty();

        assert!(matches!(hook.before(&ctx, &hints).await, Ok(None)));
        let details = EvaluationDetails::new("new-checkout", FlagValue::Boolean(true));
        assert!(matches!(hook.after(&ctx, &details, &hints).await, Ok(None)));
        assert!(hook.error(&ctx, &EvaluationError::Cancelled, &hints).await.is_none());
        assert!(hook.finally(&ctx, &hints).await.is_none());
    }
}
