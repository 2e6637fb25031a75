pub mod channel;

pub use channel::{LifecycleEvent, LifecycleEventChannel, LifecycleEventKind};
