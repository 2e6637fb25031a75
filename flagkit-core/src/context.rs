use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use crate::error::EvaluationError;
use crate::types::FlagValue;

/// Cancellation signal and optional deadline carried by an evaluation.
///
/// Clones share the same token, cancelling one cancels them all.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: CancellationToken) -> Self {
        Self { token, deadline: None }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Fails if the evaluation was cancelled or its deadline has passed
    pub fn check(&self) -> Result<(), EvaluationError> {
        if self.is_cancelled() {
            return Err(EvaluationError::Cancelled);
        }
        if self.is_expired() {
            return Err(EvaluationError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Completes when the token is cancelled or the deadline elapses
    pub async fn fired(&self) -> EvaluationError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => EvaluationError::Cancelled,
                _ = tokio::time::sleep_until(deadline.into()) => EvaluationError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                EvaluationError::Cancelled
            }
        }
    }
}

/// Contextual attributes a provider uses to resolve a flag
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    targeting_key: Option<String>,
    attributes: HashMap<String, FlagValue>,
    cancellation: Cancellation,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_targeting_key(mut self, targeting_key: impl Into<String>) -> Self {
        self.targeting_key = Some(targeting_key.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<FlagValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn targeting_key(&self) -> Option<&str> {
        self.targeting_key.as_deref()
    }

    pub fn attribute(&self, key: &str) -> Option<&FlagValue> {
        self.attributes.get(key)
    }

    pub fn attributes(&self) -> &HashMap<String, FlagValue> {
        &self.attributes
    }

    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    pub fn is_empty(&self) -> bool {
        self.targeting_key.is_none() && self.attributes.is_empty()
    }

    /// Merge a context fragment on top of this one.
    ///
    /// The fragment wins on conflicting attributes and replaces the targeting key
    /// when it carries one. The cancellation of `self` is kept.
    pub fn merge(&self, delta: &EvaluationContext) -> EvaluationContext {
        let mut attributes = self.attributes.clone();
        attributes.extend(delta.attributes.iter().map(|(k, v)| (k.clone(), v.clone())));

        EvaluationContext {
            targeting_key: delta.targeting_key.clone().or_else(|| self.targeting_key.clone()),
            attributes,
            cancellation: self.cancellation.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_delta_and_keeps_cancellation() {
        let cancellation = Cancellation::new();
        let base = EvaluationContext::new()
            .with_targeting_key("user-1")
            .with_attribute("plan", "free")
            .with_attribute("region", "eu")
            .with_cancellation(cancellation.clone());
        let delta = EvaluationContext::new()
            .with_attribute("plan", "pro")
            .with_cancellation(Cancellation::new().with_timeout(Duration::ZERO));

        let merged = base.merge(&delta);

        assert_eq!(merged.targeting_key(), Some("user-1"));
        assert_eq!(merged.attribute("plan"), Some(&FlagValue::from("pro")));
        assert_eq!(merged.attribute("region"), Some(&FlagValue::from("eu")));
        assert_eq!(merged.cancellation().deadline(), None);

        cancellation.cancel();
        assert!(merged.cancellation().is_cancelled());
        // base untouched
        assert_eq!(base.attribute("plan"), Some(&FlagValue::from("free")));
    }

    #[test]
    fn delta_targeting_key_replaces_base() {
        let base = EvaluationContext::new().with_targeting_key("anonymous");
        let merged = base.merge(&EvaluationContext::new().with_targeting_key("user-9"));

        assert_eq!(merged.targeting_key(), Some("user-9"));
        assert!(!merged.is_empty());
    }

    #[test]
    fn check_reports_cancel_before_deadline() {
        let cancellation = Cancellation::new().with_timeout(Duration::ZERO);
        assert_eq!(cancellation.check(), Err(EvaluationError::DeadlineExceeded));

        cancellation.cancel();
        assert_eq!(cancellation.check(), Err(EvaluationError::Cancelled));
    }

    #[tokio::test]
    async fn fired_resolves_on_deadline() {
        let cancellation = Cancellation::new().with_timeout(Duration::from_millis(5));

        assert_eq!(cancellation.fired().await, EvaluationError::DeadlineExceeded);
    }
}
