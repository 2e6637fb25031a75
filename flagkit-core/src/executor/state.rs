use derive_more::Display;

/// Position of an evaluation in the hook lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum LifecycleState {
    #[display("pending")]
    Pending,
    #[display("before")]
    BeforeRunning,
    #[display("resolving")]
    Resolving,
    #[display("after")]
    AfterRunning,
    #[display("error")]
    ErrorRunning,
    #[display("finally")]
    FinallyRunning,
    #[display("done")]
    Done,
}

impl LifecycleState {
    /// Whether the lifecycle may move from `self` to `next`
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Pending, BeforeRunning)
                | (BeforeRunning, Resolving)
                | (BeforeRunning, ErrorRunning)
                | (Resolving, AfterRunning)
                | (Resolving, ErrorRunning)
                | (AfterRunning, ErrorRunning)
                | (AfterRunning, FinallyRunning)
                | (ErrorRunning, FinallyRunning)
                | (FinallyRunning, Done)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::LifecycleState::*;

    #[test]
    fn before_failure_skips_resolution() {
        assert!(BeforeRunning.can_transition_to(ErrorRunning));
        assert!(!BeforeRunning.can_transition_to(AfterRunning));
        assert!(!Pending.can_transition_to(Resolving));
        assert!(!Done.can_transition_to(Pending));
    }
}
