use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Level a hook was registered at.
///
/// The declaration order is the order `before` runs in: API hooks first, provider
/// hooks last. The other stages unwind in the opposite direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookScope {
    /// Registered once for every client
    #[display("api")]
    Api,
    /// Registered on a single client
    #[display("client")]
    Client,
    /// Passed with one evaluation call
    #[display("invocation")]
    Invocation,
    /// Supplied by the provider
    #[display("provider")]
    Provider,
}

impl HookScope {
    pub const ORDER: [HookScope; 4] = [
        HookScope::Api,
        HookScope::Client,
        HookScope::Invocation,
        HookScope::Provider,
    ];
}

/// The four lifecycle stages of a hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookStage {
    #[display("before")]
    Before,
    #[display("after")]
    After,
    #[display("error")]
    Error,
    #[display("finally")]
    Finally,
}
