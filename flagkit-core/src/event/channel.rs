use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;
use crate::executor::state::LifecycleState;
use crate::hook::scope::HookStage;
use crate::types::Reason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("lifecycle event receiver dropped")]
pub struct EventChannelClosed;

/// Channel streaming lifecycle events out of the executor
#[derive(Debug, Clone)]
pub struct LifecycleEventChannel {
    sender: mpsc::UnboundedSender<LifecycleEvent>,
}

impl LifecycleEventChannel {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LifecycleEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn emit(&self, evaluation_id: Uuid, kind: LifecycleEventKind) -> Result<(), EventChannelClosed> {
        let event = LifecycleEvent {
            id: Uuid::new_v4(),
            evaluation_id,
            timestamp: Utc::now(),
            kind,
        };
        self.sender.send(event).map_err(|_| EventChannelClosed)
    }
}

#[derive(Debug, Clone)]
pub struct LifecycleEvent {
    pub id: Uuid,
    /// Shared by every event of one evaluation
    pub evaluation_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub kind: LifecycleEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEventKind {
    EvaluationStarted {
        flag_key: String,
        hooks: usize,
    },
    StateChanged {
        from: LifecycleState,
        to: LifecycleState,
    },
    StageStarted {
        hook: String,
        stage: HookStage,
    },
    StageCompleted {
        hook: String,
        stage: HookStage,
        context_changed: bool,
    },
    StageFailed {
        hook: String,
        stage: HookStage,
        error: String,
    },
    StagePanicked {
        hook: String,
        stage: HookStage,
        message: String,
    },
    ResolutionCompleted {
        variant: Option<String>,
        reason: Reason,
    },
    EvaluationCompleted {
        success: bool,
        duration_ms: u64,
    },
}

impl LifecycleEvent {
    pub fn is_error(&self) -> bool {
        matches!(
            self.kind,
            LifecycleEventKind::StageFailed { .. }
                | LifecycleEventKind::StagePanicked { .. }
                | LifecycleEventKind::EvaluationCompleted { success: false, .. }
        )
    }

    pub fn stage(&self) -> Option<HookStage> {
        match &self.kind {
            LifecycleEventKind::StageStarted { stage, .. }
            | LifecycleEventKind::StageCompleted { stage, .. }
            | LifecycleEventKind::StageFailed { stage, .. }
            | LifecycleEventKind::StagePanicked { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub fn duration(&self) -> Option<u64> {
        match &self.kind {
            LifecycleEventKind::EvaluationCompleted { duration_ms, .. } => Some(*duration_ms),
            _ => None,
        }
    }
}
