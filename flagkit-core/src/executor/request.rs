use std::sync::Arc;
use crate::context::EvaluationContext;
use crate::hook::{Hook, HookHints};
use crate::types::{ClientMetadata, FlagType, FlagValue};

/// Parameters of a single evaluation call
#[derive(Clone)]
pub struct EvaluationRequest {
    pub(crate) flag_key: String,
    pub(crate) default_value: FlagValue,
    pub(crate) client_metadata: ClientMetadata,
    pub(crate) evaluation_context: EvaluationContext,
    pub(crate) hints: HookHints,
    pub(crate) hooks: Vec<Arc<dyn Hook>>,
}

impl EvaluationRequest {
    /// The flag type is taken from the default value
    pub fn new(flag_key: impl Into<String>, default_value: impl Into<FlagValue>) -> Self {
        Self {
            flag_key: flag_key.into(),
            default_value: default_value.into(),
            client_metadata: ClientMetadata::default(),
            evaluation_context: EvaluationContext::default(),
            hints: HookHints::empty(),
            hooks: Vec::new(),
        }
    }

    pub fn with_client(mut self, client_metadata: ClientMetadata) -> Self {
        self.client_metadata = client_metadata;
        self
    }

    pub fn with_context(mut self, evaluation_context: EvaluationContext) -> Self {
        self.evaluation_context = evaluation_context;
        self
    }

    pub fn with_hints(mut self, hints: HookHints) -> Self {
        self.hints = hints;
        self
    }

    /// Add a hook for this call only
    pub fn with_hook(mut self, hook: Arc<dyn Hook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn flag_key(&self) -> &str {
        &self.flag_key
    }

    pub fn flag_type(&self) -> FlagType {
        self.default_value.flag_type()
    }

    pub fn default_value(&self) -> &FlagValue {
        &self.default_value
    }
}
