//! Ready-made hooks for the flagkit lifecycle.
//!
//! - [`LoggingHook`]: logs every stage of an evaluation
//! - [`FlagKeyValidationHook`]: rejects malformed flag keys before resolution
//! - [`StaticContextHook`]: merges fixed attributes into the evaluation context

pub mod enrichment;
pub mod logging;
pub mod validation;

pub use enrichment::{StaticContextConfig, StaticContextHook};
pub use logging::{LoggingConfig, LoggingHook};
pub use validation::FlagKeyValidationHook;
