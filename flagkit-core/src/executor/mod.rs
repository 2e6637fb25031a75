use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use futures::FutureExt;
use log::{debug, error, warn};
use uuid::Uuid;
use crate::context::EvaluationContext;
use crate::error::{EvaluationError, FlagkitResult, HookError, ResolutionError};
use crate::event::channel::{LifecycleEventChannel, LifecycleEventKind};
use crate::executor::config::{AfterErrorPolicy, ExecutorConfig};
use crate::executor::request::EvaluationRequest;
use crate::executor::state::LifecycleState;
use crate::hook::registry::{ActiveHook, HookRegistry};
use crate::hook::scope::{HookScope, HookStage};
use crate::hook::{Hook, HookContext, HookHints, HookResult};
use crate::resolver::FlagResolver;
use crate::types::EvaluationDetails;

pub mod config;
pub mod request;
pub mod state;

/// Runs the hook lifecycle around a flag resolution.
///
/// `before` runs front to back over the chain and stops at the first failure.
/// The resolver is called once if every `before` succeeded. `after` (on success)
/// or `error` (on failure) then unwind back to front, followed by `finally`, over
/// the hooks whose `before` was invoked. Context fragments returned by a stage are
/// merged into the snapshot seen by the hooks that run after it, later fragments
/// winning on conflicting keys. Only fragments from `before` reach the resolver.
pub struct HookExecutor {
    resolver: Arc<dyn FlagResolver>,
    registry: HookRegistry,
    config: ExecutorConfig,
    events: Option<LifecycleEventChannel>,
}

impl HookExecutor {
    pub fn new(resolver: Arc<dyn FlagResolver>) -> Self {
        Self {
            resolver,
            registry: HookRegistry::new(),
            config: ExecutorConfig::default(),
            events: None,
        }
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_registry(mut self, registry: HookRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_events(mut self, events: LifecycleEventChannel) -> Self {
        self.events = Some(events);
        self
    }

    /// Register a hook that runs on every evaluation
    pub fn register(&mut self, scope: HookScope, hook: Arc<dyn Hook>) {
        self.registry.register(scope, hook);
    }

    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Evaluate a flag with the registered hooks, the hooks of the request and the
    /// hooks of the provider.
    pub async fn evaluate(&self, request: EvaluationRequest) -> FlagkitResult<EvaluationDetails> {
        let mut registry = self.registry.clone();
        registry.register_all(HookScope::Invocation, request.hooks);
        registry.register_all(HookScope::Provider, self.resolver.hooks());

        let flag_type = request.default_value.flag_type();
        let context = HookContext::new(
            request.flag_key,
            flag_type,
            request.default_value,
            request.client_metadata,
            self.resolver.metadata(),
            request.evaluation_context,
        );

        self.run(&registry.chain(), context, &request.hints).await
    }

    /// Run the lifecycle for an explicit, already ordered chain
    pub async fn run(&self, chain: &[ActiveHook], context: HookContext, hints: &HookHints) -> FlagkitResult<EvaluationDetails> {
        let mut lifecycle = Lifecycle::new(context.flag_key(), self.events.as_ref());
        lifecycle.emit(LifecycleEventKind::EvaluationStarted {
            flag_key: context.flag_key().to_string(),
            hooks: chain.len(),
        });

        let mut context = context;

        lifecycle.advance(LifecycleState::BeforeRunning);
        let (invoked, failure) = self.run_before(chain, &mut context, hints, &lifecycle).await;
        let invoked = &chain[..invoked];

        let outcome = match failure {
            Some(error) => Err(error),
            None => {
                lifecycle.advance(LifecycleState::Resolving);
                self.resolve(&context, &lifecycle).await
            }
        };

        let outcome = match outcome {
            Ok(details) => {
                lifecycle.advance(LifecycleState::AfterRunning);
                self.run_after(invoked, &mut context, details, hints, &lifecycle).await
            }
            Err(error) => Err(error),
        };

        if let Err(error) = &outcome {
            lifecycle.advance(LifecycleState::ErrorRunning);
            self.run_error(invoked, &mut context, error, hints, &lifecycle).await;
        }

        lifecycle.advance(LifecycleState::FinallyRunning);
        self.run_finally(invoked, &mut context, hints, &lifecycle).await;

        lifecycle.advance(LifecycleState::Done);
        lifecycle.emit(LifecycleEventKind::EvaluationCompleted {
            success: outcome.is_ok(),
            duration_ms: lifecycle.started.elapsed().as_millis() as u64,
        });

        outcome
    }

    /// Returns how many hooks had `before` invoked and the first failure
    async fn run_before(
        &self,
        chain: &[ActiveHook],
        context: &mut HookContext,
        hints: &HookHints,
        lifecycle: &Lifecycle<'_>,
    ) -> (usize, Option<EvaluationError>) {
        for (index, active) in chain.iter().enumerate() {
            lifecycle.stage_started(active, HookStage::Before);
            let result = self.guarded(active.hook.before(context, hints)).await;

            match self.settle(active, HookStage::Before, result, lifecycle) {
                Ok(delta) => {
                    let changed = apply(context, delta);
                    lifecycle.stage_completed(active, HookStage::Before, changed);
                }
                Err(source) => {
                    return (index + 1, Some(EvaluationError::before(active.name(), source)));
                }
            }
        }

        (chain.len(), None)
    }

    async fn resolve(&self, context: &HookContext, lifecycle: &Lifecycle<'_>) -> FlagkitResult<EvaluationDetails> {
        let cancellation = context.cancellation();
        cancellation.check()?;

        let details = tokio::select! {
            biased;
            fired = cancellation.fired() => return Err(fired),
            result = self.resolver.resolve(
                context.flag_key(),
                context.flag_type(),
                context.default_value(),
                context.evaluation_context(),
            ) => result?,
        };

        let resolved_type = details.value.flag_type();
        if self.config.check_value_type && resolved_type != context.flag_type() {
            return Err(ResolutionError::type_mismatch(context.flag_type().to_string(), resolved_type.to_string()).into());
        }

        lifecycle.emit(LifecycleEventKind::ResolutionCompleted {
            variant: details.variant.clone(),
            reason: details.reason,
        });
        Ok(details)
    }

    async fn run_after(
        &self,
        invoked: &[ActiveHook],
        context: &mut HookContext,
        details: EvaluationDetails,
        hints: &HookHints,
        lifecycle: &Lifecycle<'_>,
    ) -> FlagkitResult<EvaluationDetails> {
        for active in invoked.iter().rev() {
            lifecycle.stage_started(active, HookStage::After);
            let result = self.guarded(active.hook.after(context, &details, hints)).await;

            match self.settle(active, HookStage::After, result, lifecycle) {
                Ok(delta) => {
                    let changed = apply(context, delta);
                    lifecycle.stage_completed(active, HookStage::After, changed);
                }
                Err(source) => match self.config.after_error_policy {
                    AfterErrorPolicy::Promote => {
                        return Err(EvaluationError::after(active.name(), source));
                    }
                    // already reported by settle
                    AfterErrorPolicy::Suppress => {}
                },
            }
        }

        Ok(details)
    }

    async fn run_error(
        &self,
        invoked: &[ActiveHook],
        context: &mut HookContext,
        error: &EvaluationError,
        hints: &HookHints,
        lifecycle: &Lifecycle<'_>,
    ) {
        for active in invoked.iter().rev() {
            lifecycle.stage_started(active, HookStage::Error);
            let result = isolated(active.hook.error(context, error, hints)).await;
            self.settle_infallible(active, HookStage::Error, result, context, lifecycle);
        }
    }

    async fn run_finally(
        &self,
        invoked: &[ActiveHook],
        context: &mut HookContext,
        hints: &HookHints,
        lifecycle: &Lifecycle<'_>,
    ) {
        for active in invoked.iter().rev() {
            lifecycle.stage_started(active, HookStage::Finally);
            let result = isolated(active.hook.finally(context, hints)).await;
            self.settle_infallible(active, HookStage::Finally, result, context, lifecycle);
        }
    }

    /// Await `before` or `after`, turning a panic into its message when panics are caught
    async fn guarded<F: Future>(&self, stage: F) -> Result<F::Output, String> {
        if self.config.catch_panics {
            isolated(stage).await
        } else {
            Ok(stage.await)
        }
    }

    /// Outcome of a fallible stage, with panics reported as [`HookError::Panicked`]
    fn settle(
        &self,
        active: &ActiveHook,
        stage: HookStage,
        result: Result<HookResult, String>,
        lifecycle: &Lifecycle<'_>,
    ) -> HookResult {
        match result {
            Ok(Ok(delta)) => Ok(delta),
            Ok(Err(source)) => {
                warn!("Flag '{}': {} hook '{}' failed: {}", lifecycle.flag_key, stage, active.name(), source);
                lifecycle.emit(LifecycleEventKind::StageFailed {
                    hook: active.name().to_string(),
                    stage,
                    error: source.to_string(),
                });
                Err(source)
            }
            Err(message) => {
                lifecycle.stage_panicked(active, stage, &message);
                Err(HookError::panicked(message))
            }
        }
    }

    fn settle_infallible(
        &self,
        active: &ActiveHook,
        stage: HookStage,
        result: Result<Option<EvaluationContext>, String>,
        context: &mut HookContext,
        lifecycle: &Lifecycle<'_>,
    ) {
        match result {
            Ok(delta) => {
                let changed = apply(context, delta);
                lifecycle.stage_completed(active, stage, changed);
            }
            Err(message) => lifecycle.stage_panicked(active, stage, &message),
        }
    }
}

/// Await a stage, always turning a panic into its message.
///
/// `error` and `finally` go through here regardless of `catch_panics` so one hook
/// cannot keep the rest of the chain from cleaning up.
async fn isolated<F: Future>(stage: F) -> Result<F::Output, String> {
    AssertUnwindSafe(stage).catch_unwind().await.map_err(panic_message)
}

/// Merge a stage fragment into the running snapshot, reporting whether it changed
fn apply(context: &mut HookContext, delta: Option<EvaluationContext>) -> bool {
    match delta {
        Some(delta) => {
            *context = context.merged(&delta);
            true
        }
        None => false,
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

/// Bookkeeping of one evaluation: state, identity and event emission
struct Lifecycle<'a> {
    id: Uuid,
    flag_key: String,
    state: LifecycleState,
    events: Option<&'a LifecycleEventChannel>,
    started: Instant,
}

impl<'a> Lifecycle<'a> {
    fn new(flag_key: &str, events: Option<&'a LifecycleEventChannel>) -> Self {
        Self {
            id: Uuid::new_v4(),
            flag_key: flag_key.to_string(),
            state: LifecycleState::Pending,
            events,
            started: Instant::now(),
        }
    }

    fn advance(&mut self, next: LifecycleState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid lifecycle transition {} -> {}",
            self.state,
            next
        );
        debug!("Evaluation {} of '{}': {} -> {}", self.id, self.flag_key, self.state, next);

        let from = std::mem::replace(&mut self.state, next);
        self.emit(LifecycleEventKind::StateChanged { from, to: next });
    }

    fn emit(&self, kind: LifecycleEventKind) {
        if let Some(events) = self.events {
            if let Err(closed) = events.emit(self.id, kind) {
                debug!("Evaluation {}: {}", self.id, closed);
            }
        }
    }

    fn stage_started(&self, active: &ActiveHook, stage: HookStage) {
        debug!("Evaluation {}: {} hook '{}' ({})", self.id, stage, active.name(), active.scope);
        self.emit(LifecycleEventKind::StageStarted {
            hook: active.name().to_string(),
            stage,
        });
    }

    fn stage_completed(&self, active: &ActiveHook, stage: HookStage, context_changed: bool) {
        self.emit(LifecycleEventKind::StageCompleted {
            hook: active.name().to_string(),
            stage,
            context_changed,
        });
    }

    fn stage_panicked(&self, active: &ActiveHook, stage: HookStage, message: &str) {
        error!("Flag '{}': {} hook '{}' panicked: {}", self.flag_key, stage, active.name(), message);
        self.emit(LifecycleEventKind::StagePanicked {
            hook: active.name().to_string(),
            stage,
            message: message.to_string(),
        });
    }
}
