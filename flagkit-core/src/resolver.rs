use std::sync::Arc;
use crate::context::EvaluationContext;
use crate::error::ResolutionError;
use crate::hook::Hook;
use crate::types::{EvaluationDetails, FlagType, FlagValue, ProviderMetadata};

/// The engine that resolves flag values, typically a provider
#[async_trait::async_trait]
pub trait FlagResolver: Send + Sync {
    fn metadata(&self) -> ProviderMetadata;

    /// Hooks the provider wants in every evaluation, run in the provider scope
    fn hooks(&self) -> Vec<Arc<dyn Hook>> {
        Vec::new()
    }

    async fn resolve(
        &self,
        flag_key: &str,
        flag_type: FlagType,
        default_value: &FlagValue,
        context: &EvaluationContext,
    ) -> Result<EvaluationDetails, ResolutionError>;
}
