use std::collections::HashMap;
use async_trait::async_trait;
use flagkit_core::error::ConfigError;
use flagkit_core::{EvaluationContext, FlagValue, Hook, HookContext, HookHints, HookResult};
use log::trace;
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

/// Attributes merged by [`StaticContextHook`]
#[derive(Debug, Clone, PartialEq, SmartDefault, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticContextConfig {
    pub targeting_key: Option<String>,
    pub attributes: HashMap<String, FlagValue>,

    /// When false, only keys missing from the caller's context are filled in
    #[default = true]
    pub overwrite: bool,
}

impl StaticContextConfig {
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }
}

/// Contributes a fixed context fragment in `before`.
///
/// Useful at API or client scope for attributes every evaluation shares, such as
/// the application version or deployment region.
#[derive(Debug, Clone, Default)]
pub struct StaticContextHook {
    config: StaticContextConfig,
}

impl StaticContextHook {
    pub fn new(config: StaticContextConfig) -> Self {
        Self { config }
    }

    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        StaticContextConfig::from_json(input).map(Self::new)
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<FlagValue>) -> Self {
        self.config.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_targeting_key(mut self, targeting_key: impl Into<String>) -> Self {
        self.config.targeting_key = Some(targeting_key.into());
        self
    }

    /// Keep values the caller already set
    pub fn fill_missing_only(mut self) -> Self {
        self.config.overwrite = false;
        self
    }

    fn fragment(&self, current: &EvaluationContext) -> Option<EvaluationContext> {
        let mut fragment = EvaluationContext::new();

        if let Some(targeting_key) = &self.config.targeting_key {
            if self.config.overwrite || current.targeting_key().is_none() {
                fragment = fragment.with_targeting_key(targeting_key.clone());
            }
        }

        for (key, value) in &self.config.attributes {
            if self.config.overwrite || current.attribute(key).is_none() {
                fragment = fragment.with_attribute(key.clone(), value.clone());
            }
        }

        (!fragment.is_empty()).then_some(fragment)
    }
}

#[async_trait]
impl Hook for StaticContextHook {
    fn name(&self) -> &str {
        "static-context"
    }

    async fn before(&self, ctx: &HookContext, _hints: &HookHints) -> HookResult {
        let fragment = self.fragment(ctx.evaluation_context());
        if let Some(fragment) = &fragment {
            trace!(
                "contributing {} attribute(s) to evaluation of '{}'",
                fragment.attributes().len(),
                ctx.flag_key()
            );
        }
        Ok(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use flagkit_core::testing::{Journal, RecordingHook, StaticResolver};
    use flagkit_core::{EvaluationRequest, HookExecutor, HookScope};

    #[test]
    fn config_from_json() {
        let config = StaticContextConfig::from_json(
            r#"{"attributes": {"region": "eu-west", "build": 42}, "overwrite": false}"#,
        )
        .unwrap();

        assert!(!config.overwrite);
        assert_eq!(config.attributes.get("region"), Some(&FlagValue::from("eu-west")));
        assert_eq!(config.attributes.get("build"), Some(&FlagValue::Integer(42)));
        assert!(StaticContextConfig::default().overwrite);
    }

    #[test]
    fn empty_configuration_contributes_nothing() {
        let hook = StaticContextHook::default();
        assert!(hook.fragment(&EvaluationContext::new()).is_none());
    }

    #[test]
    fn fill_missing_only_keeps_caller_values() {
        let hook = StaticContextHook::default()
            .with_attribute("region", "eu-west")
            .with_attribute("tier", "free")
            .with_targeting_key("anonymous")
            .fill_missing_only();
        let current = EvaluationContext::new()
            .with_targeting_key("user-1")
            .with_attribute("tier", "pro");

        let fragment = hook.fragment(&current).unwrap();

        assert_eq!(fragment.targeting_key(), None);
        assert_eq!(fragment.attribute("region"), Some(&FlagValue::from("eu-west")));
        assert_eq!(fragment.attribute("tier"), None);
        assert!(hook.fragment(&current.with_attribute("region", "us")).is_none());
    }

    #[tokio::test]
    async fn attributes_reach_resolver_and_later_hooks() {
        let journal = Journal::new();
        let resolver = StaticResolver::new().with_flag("checkout", true).shared();
        let mut executor = HookExecutor::new(resolver.clone());
        executor.register(
            HookScope::Api,
            Arc::new(StaticContextHook::default().with_attribute("region", "eu-west")),
        );
        executor.register(
            HookScope::Client,
            RecordingHook::new("B", &journal).observing("region").shared(),
        );

        executor
            .evaluate(
                EvaluationRequest::new("checkout", false)
                    .with_context(EvaluationContext::new().with_attribute("region", "us-east")),
            )
            .await
            .unwrap();

        let resolved = resolver.last_context().unwrap();
        assert_eq!(resolved.attribute("region"), Some(&FlagValue::from("eu-west")));
        assert!(journal.contains("B.before[region=eu-west]"));
    }
}
