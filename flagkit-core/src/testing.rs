//! Test doubles for exercising the hook lifecycle.
//!
//! Provides:
//! - [`Journal`]: an ordered, shareable log of lifecycle calls
//! - [`RecordingHook`]: a hook that writes every stage it runs to a journal and can
//!   be told to fail, panic or return context fragments
//! - [`StaticResolver`]: an in-memory resolver serving fixed values

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use crate::context::EvaluationContext;
use crate::error::{EvaluationError, HookError, ResolutionError};
use crate::hook::scope::HookStage;
use crate::hook::{Hook, HookContext, HookHints, HookResult};
use crate::resolver::FlagResolver;
use crate::types::{EvaluationDetails, FlagType, FlagValue, ProviderMetadata, Reason};

/// Ordered log of lifecycle calls shared by hooks and resolver
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries().iter().any(|it| it == entry)
    }
}

/// Hook recording `<name>.<stage>` for every stage it runs
pub struct RecordingHook {
    name: String,
    journal: Journal,
    fail_before: Option<HookError>,
    fail_after: Option<HookError>,
    panic_in: Option<HookStage>,
    before_delta: Option<EvaluationContext>,
    after_delta: Option<EvaluationContext>,
    observe: Option<String>,
    observe_hint: Option<String>,
}

impl RecordingHook {
    pub fn new(name: impl Into<String>, journal: &Journal) -> Self {
        Self {
            name: name.into(),
            journal: journal.clone(),
            fail_before: None,
            fail_after: None,
            panic_in: None,
            before_delta: None,
            after_delta: None,
            observe: None,
            observe_hint: None,
        }
    }

    pub fn failing_before(mut self, error: HookError) -> Self {
        self.fail_before = Some(error);
        self
    }

    pub fn failing_after(mut self, error: HookError) -> Self {
        self.fail_after = Some(error);
        self
    }

    pub fn panicking_in(mut self, stage: HookStage) -> Self {
        self.panic_in = Some(stage);
        self
    }

    pub fn with_before_delta(mut self, delta: EvaluationContext) -> Self {
        self.before_delta = Some(delta);
        self
    }

    pub fn with_after_delta(mut self, delta: EvaluationContext) -> Self {
        self.after_delta = Some(delta);
        self
    }

    /// Append `[key=value]` to every entry, read from the snapshot the stage received
    pub fn observing(mut self, key: impl Into<String>) -> Self {
        self.observe = Some(key.into());
        self
    }

    /// Append `{key=value}` to every entry, read from the hints the stage received
    pub fn observing_hint(mut self, key: impl Into<String>) -> Self {
        self.observe_hint = Some(key.into());
        self
    }

    pub fn shared(self) -> Arc<dyn Hook> {
        Arc::new(self)
    }

    fn record(&self, stage: HookStage, ctx: &HookContext, hints: &HookHints, suffix: Option<String>) {
        let mut entry = format!("{}.{}", self.name, stage);
        if let Some(suffix) = suffix {
            entry.push_str(&format!("({suffix})"));
        }
        if let Some(key) = &self.observe {
            let value = ctx
                .evaluation_context()
                .attribute(key)
                .map(describe)
                .unwrap_or_else(|| "-".to_string());
            entry.push_str(&format!("[{key}={value}]"));
        }
        if let Some(key) = &self.observe_hint {
            let value = hints
                .value(key)
                .map(|value| value.to_string())
                .unwrap_or_else(|| "-".to_string());
            entry.push_str(&format!("{{{key}={value}}}"));
        }
        self.journal.record(entry);

        if self.panic_in == Some(stage) {
            panic!("{} panicked in {}", self.name, stage);
        }
    }
}

#[async_trait::async_trait]
impl Hook for RecordingHook {
    fn name(&self) -> &str {
        &self.name
    }

    async fn before(&self, ctx: &HookContext, hints: &HookHints) -> HookResult {
        self.record(HookStage::Before, ctx, hints, None);
        match &self.fail_before {
            Some(error) => Err(error.clone()),
            None => Ok(self.before_delta.clone()),
        }
    }

    async fn after(&self, ctx: &HookContext, _details: &EvaluationDetails, hints: &HookHints) -> HookResult {
        self.record(HookStage::After, ctx, hints, None);
        match &self.fail_after {
            Some(error) => Err(error.clone()),
            None => Ok(self.after_delta.clone()),
        }
    }

    async fn error(&self, ctx: &HookContext, error: &EvaluationError, hints: &HookHints) -> Option<EvaluationContext> {
        self.record(HookStage::Error, ctx, hints, Some(error.to_string()));
        None
    }

    async fn finally(&self, ctx: &HookContext, hints: &HookHints) -> Option<EvaluationContext> {
        self.record(HookStage::Finally, ctx, hints, None);
        None
    }
}

fn describe(value: &FlagValue) -> String {
    match value {
        FlagValue::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| format!("{other:?}")),
    }
}

/// Resolver serving fixed values from memory
#[derive(Default)]
pub struct StaticResolver {
    flags: HashMap<String, (FlagValue, Option<String>)>,
    journal: Option<Journal>,
    delay: Option<Duration>,
    failure: Option<ResolutionError>,
    provider_hooks: Vec<Arc<dyn Hook>>,
    calls: AtomicUsize,
    last_context: Mutex<Option<EvaluationContext>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flag(mut self, key: impl Into<String>, value: impl Into<FlagValue>) -> Self {
        self.flags.insert(key.into(), (value.into(), None));
        self
    }

    pub fn with_variant(mut self, key: impl Into<String>, value: impl Into<FlagValue>, variant: impl Into<String>) -> Self {
        self.flags.insert(key.into(), (value.into(), Some(variant.into())));
        self
    }

    /// Record `resolve` in the journal on every call
    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = Some(journal.clone());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every resolution with `error`
    pub fn failing(mut self, error: ResolutionError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn with_provider_hook(mut self, hook: Arc<dyn Hook>) -> Self {
        self.provider_hooks.push(hook);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Evaluation context received by the most recent call
    pub fn last_context(&self) -> Option<EvaluationContext> {
        self.last_context.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait::async_trait]
impl FlagResolver for StaticResolver {
    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata::new("static")
    }

    fn hooks(&self) -> Vec<Arc<dyn Hook>> {
        self.provider_hooks.clone()
    }

    async fn resolve(
        &self,
        flag_key: &str,
        _flag_type: FlagType,
        _default_value: &FlagValue,
        context: &EvaluationContext,
    ) -> Result<EvaluationDetails, ResolutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_context.lock().unwrap_or_else(PoisonError::into_inner) = Some(context.clone());
        if let Some(journal) = &self.journal {
            journal.record("resolve");
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let (value, variant) = self
            .flags
            .get(flag_key)
            .ok_or_else(|| ResolutionError::flag_not_found(flag_key))?;

        let details = EvaluationDetails::new(flag_key, value.clone()).with_reason(Reason::Static);
        Ok(match variant {
            Some(variant) => details.with_variant(variant.clone()),
            None => details,
        })
    }
}
