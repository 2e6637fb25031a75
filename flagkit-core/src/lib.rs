//! Hook lifecycle for feature flag evaluation.
//!
//! A [`hook::Hook`] observes an evaluation in four stages: `before` the flag is
//! resolved, `after` a successful resolution, on `error`, and `finally`. The
//! [`executor::HookExecutor`] drives those stages around a [`resolver::FlagResolver`].

pub mod types;
pub mod context;
pub mod error;
pub mod event;
pub mod executor;
pub mod hook;
pub mod resolver;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use context::{Cancellation, EvaluationContext};
pub use error::{ErrorCode, EvaluationError, FlagkitResult, HookError, ResolutionError};
pub use executor::HookExecutor;
pub use executor::config::{AfterErrorPolicy, ExecutorConfig};
pub use executor::request::EvaluationRequest;
pub use hook::{Hook, HookContext, HookHints, HookResult, UnimplementedHook};
pub use hook::registry::HookRegistry;
pub use hook::scope::{HookScope, HookStage};
pub use resolver::FlagResolver;
pub use types::{ClientMetadata, EvaluationDetails, FlagType, FlagValue, ProviderMetadata, Reason};
