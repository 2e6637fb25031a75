use crate::context::{Cancellation, EvaluationContext};
use crate::types::{ClientMetadata, FlagType, FlagValue, ProviderMetadata};

/// Snapshot of the evaluation request visible to hooks.
///
/// All fields are fixed at construction. Merging a context fragment produces a
/// new snapshot and leaves the original untouched.
#[derive(Debug, Clone)]
pub struct HookContext {
    flag_key: String,
    flag_type: FlagType,
    default_value: FlagValue,
    client_metadata: ClientMetadata,
    provider_metadata: ProviderMetadata,
    evaluation_context: EvaluationContext,
}

impl HookContext {
    pub fn new(
        flag_key: impl Into<String>,
        flag_type: FlagType,
        default_value: FlagValue,
        client_metadata: ClientMetadata,
        provider_metadata: ProviderMetadata,
        evaluation_context: EvaluationContext,
    ) -> Self {
        Self {
            flag_key: flag_key.into(),
            flag_type,
            default_value,
            client_metadata,
            provider_metadata,
            evaluation_context,
        }
    }

    pub fn flag_key(&self) -> &str {
        &self.flag_key
    }

    pub fn flag_type(&self) -> FlagType {
        self.flag_type
    }

    pub fn default_value(&self) -> &FlagValue {
        &self.default_value
    }

    pub fn client_metadata(&self) -> &ClientMetadata {
        &self.client_metadata
    }

    pub fn provider_metadata(&self) -> &ProviderMetadata {
        &self.provider_metadata
    }

    pub fn evaluation_context(&self) -> &EvaluationContext {
        &self.evaluation_context
    }

    /// Cancellation and deadline of the evaluation, for hooks doing I/O
    pub fn cancellation(&self) -> &Cancellation {
        self.evaluation_context.cancellation()
    }

    pub fn with_evaluation_context(&self, evaluation_context: EvaluationContext) -> Self {
        Self {
            evaluation_context,
            ..self.clone()
        }
    }

    /// New snapshot with `delta` merged on top of the current evaluation context
    pub fn merged(&self, delta: &EvaluationContext) -> Self {
        self.with_evaluation_context(self.evaluation_context.merge(delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> HookContext {
        HookContext::new(
            "new-checkout",
            FlagType::Boolean,
            FlagValue::from(false),
            ClientMetadata::new("storefront"),
            ProviderMetadata::new("in-memory"),
            EvaluationContext::new().with_attribute("country", "IT"),
        )
    }

    #[test]
    fn accessors_return_constructed_fields() {
        let ctx = context();

        assert_eq!(ctx.flag_key(), "new-checkout");
        assert_eq!(ctx.flag_type(), FlagType::Boolean);
        assert_eq!(ctx.default_value(), &FlagValue::Boolean(false));
        assert_eq!(ctx.client_metadata().domain, "storefront");
        assert_eq!(ctx.provider_metadata().name, "in-memory");
        assert_eq!(ctx.evaluation_context().attribute("country"), Some(&FlagValue::from("IT")));
        assert!(!ctx.cancellation().is_cancelled());
    }

    #[test]
    fn merged_snapshot_is_independent() {
        let original = context();
        let merged = original.merged(&EvaluationContext::new().with_attribute("country", "FR"));

        assert_eq!(merged.evaluation_context().attribute("country"), Some(&FlagValue::from("FR")));
        assert_eq!(original.evaluation_context().attribute("country"), Some(&FlagValue::from("IT")));
        assert_eq!(merged.flag_key(), original.flag_key());
    }
}
