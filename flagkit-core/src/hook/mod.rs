use crate::context::EvaluationContext;
use crate::error::{EvaluationError, HookError};
use crate::types::EvaluationDetails;

pub mod context;
pub mod hints;
pub mod registry;
pub mod scope;

pub use context::HookContext;
pub use hints::HookHints;

/// Result of the fallible stages: an optional context fragment to merge
pub type HookResult = Result<Option<EvaluationContext>, HookError>;

/// Extension point invoked around a single flag evaluation.
///
/// Every stage has a no-op default, so implementors only override the stages they
/// care about. A hook instance is shared by concurrent evaluations and must not
/// hold unguarded mutable state.
#[async_trait::async_trait]
pub trait Hook: Send + Sync {
    /// Name used in logs, events and errors
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Runs before resolution, in registration order. An error aborts the remaining
    /// `before` calls and the resolution.
    async fn before(&self, _ctx: &HookContext, _hints: &HookHints) -> HookResult {
        Ok(None)
    }

    /// Runs after a successful resolution, in reverse registration order
    async fn after(&self, _ctx: &HookContext, _details: &EvaluationDetails, _hints: &HookHints) -> HookResult {
        Ok(None)
    }

    /// Runs when `before`, the resolution or `after` failed. Must not fail.
    async fn error(&self, _ctx: &HookContext, _error: &EvaluationError, _hints: &HookHints) -> Option<EvaluationContext> {
        None
    }

    /// Runs last for every hook whose `before` was invoked. Must not fail.
    async fn finally(&self, _ctx: &HookContext, _hints: &HookHints) -> Option<EvaluationContext> {
        None
    }
}

/// Hook with every stage left as a no-op.
///
/// Embed it and delegate to it from the stages you do not implement:
///
/// ```
/// use flagkit_core::context::EvaluationContext;
/// use flagkit_core::hook::{Hook, HookContext, HookHints, HookResult, UnimplementedHook};
///
/// struct TenantHook {
///     inner: UnimplementedHook,
/// }
///
/// #[async_trait::async_trait]
/// impl Hook for TenantHook {
///     async fn before(&self, _ctx: &HookContext, _hints: &HookHints) -> HookResult {
///         Ok(Some(EvaluationContext::new().with_attribute("tenant", "acme")))
///     }
///
///     async fn finally(&self, ctx: &HookContext, hints: &HookHints) -> Option<EvaluationContext> {
///         self.inner.finally(ctx, hints).await
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct UnimplementedHook;

impl Hook for UnimplementedHook {
    fn name(&self) -> &str {
        "unimplemented"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EvaluationContext;
    use crate::error::ResolutionError;
    use crate::types::{ClientMetadata, FlagType, FlagValue, ProviderMetadata};

    struct BeforeOnly {
        inner: UnimplementedHook,
    }

    #[async_trait::async_trait]
    impl Hook for BeforeOnly {
        async fn before(&self, _ctx: &HookContext, _hints: &HookHints) -> HookResult {
            Ok(Some(EvaluationContext::new().with_attribute("seen", true)))
        }

        async fn error(&self, ctx: &HookContext, error: &EvaluationError, hints: &HookHints) -> Option<EvaluationContext> {
            self.inner.error(ctx, error, hints).await
        }
    }

    fn context() -> HookContext {
        HookContext::new(
            "banner",
            FlagType::String,
            FlagValue::from("off"),
            ClientMetadata::default(),
            ProviderMetadata::default(),
            EvaluationContext::new(),
        )
    }

    #[tokio::test]
    async fn only_overridden_stage_has_effect() {
        let hook = BeforeOnly { inner: UnimplementedHook };
        let ctx = context();
        let hints = HookHints::empty();
        let details = EvaluationDetails::new("banner", FlagValue::from("on"));
        let error = EvaluationError::from(ResolutionError::general("boom"));

        let delta = hook.before(&ctx, &hints).await.unwrap().unwrap();
        assert_eq!(delta.attribute("seen"), Some(&FlagValue::Boolean(true)));

        assert!(matches!(hook.after(&ctx, &details, &hints).await, Ok(None)));
        assert!(hook.error(&ctx, &error, &hints).await.is_none());
        assert!(hook.finally(&ctx, &hints).await.is_none());
    }

    #[test]
    fn default_name_is_the_type_name() {
        let hook = BeforeOnly { inner: UnimplementedHook };

        assert!(hook.name().ends_with("BeforeOnly"));
        assert_eq!(UnimplementedHook.name(), "unimplemented");
    }
}
