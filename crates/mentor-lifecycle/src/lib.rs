//! # Mentor Lifecycle
//!
//! Program lifecycle state machine with post-transition hooks and events.

pub mod events;
pub mod hooks;
pub mod machine;

pub use events::{EventBus, EventFilter, LifecycleTrigger, TransitionEvent, TransitionSubscription};
pub use hooks::{FnHook, HookError, HookRegistry, HookResult, TransitionHook, TransitionPattern};
pub use machine::{allowed_transitions, can_transition, ProgramStateMachine, TransitionReport};
