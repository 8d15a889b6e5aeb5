//! Post-transition hooks.
//!
//! Hooks run after a transition is committed. Each one is isolated: an error
//! or a panic inside a hook is turned into a [`MentorError::HookFailed`] and
//! never undoes the transition.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use mentor_core::{MentorError, ProgramState};

use crate::events::{LifecycleTrigger, TransitionEvent};

/// Error type returned by hooks.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by hooks.
pub type HookResult = std::result::Result<(), HookError>;

/// A side effect attached to lifecycle transitions.
#[async_trait]
pub trait TransitionHook: Send + Sync {
    /// Name used in logs and failure reports.
    fn name(&self) -> &str;

    async fn on_transition(&self, event: &TransitionEvent) -> HookResult;
}

/// Adapter that turns an async closure into a [`TransitionHook`].
pub struct FnHook<F> {
    name: String,
    func: F,
}

impl<F, Fut> FnHook<F>
where
    F: Fn(TransitionEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult> + Send + 'static,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F, Fut> TransitionHook for FnHook<F>
where
    F: Fn(TransitionEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_transition(&self, event: &TransitionEvent) -> HookResult {
        (self.func)(event.clone()).await
    }
}

/// Which transitions a hook is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransitionPattern {
    /// `None` matches any source state.
    pub from: Option<ProgramState>,
    /// `None` matches any target state.
    pub to: Option<ProgramState>,
}

impl TransitionPattern {
    /// Exactly `from -> to`.
    pub fn edge(from: ProgramState, to: ProgramState) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Any transition entering `to`.
    pub fn entering(to: ProgramState) -> Self {
        Self {
            from: None,
            to: Some(to),
        }
    }

    /// Any transition leaving `from`.
    pub fn leaving(from: ProgramState) -> Self {
        Self {
            from: Some(from),
            to: None,
        }
    }

    /// Every transition.
    pub fn any() -> Self {
        Self {
            from: None,
            to: None,
        }
    }

    pub fn matches(&self, from: ProgramState, to: ProgramState) -> bool {
        self.from.map_or(true, |f| f == from) && self.to.map_or(true, |t| t == to)
    }
}

impl From<LifecycleTrigger> for TransitionPattern {
    fn from(trigger: LifecycleTrigger) -> Self {
        match trigger {
            LifecycleTrigger::RequestPlanGeneration => {
                TransitionPattern::entering(ProgramState::PlanDraft)
            }
            LifecycleTrigger::ScheduleFirstWeek => {
                TransitionPattern::edge(ProgramState::Approved, ProgramState::Active)
            }
            LifecycleTrigger::StartReengagement => {
                TransitionPattern::entering(ProgramState::Stalled)
            }
        }
    }
}

/// Registry of hooks keyed by transition pattern.
///
/// Hooks run in registration order.
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: Vec<(TransitionPattern, Arc<dyn TransitionHook>)>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook for every transition matching `pattern`.
    pub fn register(
        &mut self,
        pattern: impl Into<TransitionPattern>,
        hook: Arc<dyn TransitionHook>,
    ) {
        self.hooks.push((pattern.into(), hook));
    }

    /// Hooks that apply to `from -> to`.
    pub fn hooks_for(&self, from: ProgramState, to: ProgramState) -> Vec<Arc<dyn TransitionHook>> {
        self.hooks
            .iter()
            .filter(|(pattern, _)| pattern.matches(from, to))
            .map(|(_, hook)| Arc::clone(hook))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook that applies to `event`, collecting failures.
    pub async fn dispatch(&self, event: &TransitionEvent) -> Vec<MentorError> {
        let mut failures = Vec::new();

        for hook in self.hooks_for(event.from, event.to) {
            let outcome = AssertUnwindSafe(hook.on_transition(event))
                .catch_unwind()
                .await;

            let message = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err.to_string(),
                Err(panic) => format!("hook panicked: {}", panic_message(panic.as_ref())),
            };

            tracing::warn!(
                program_id = %event.program_id,
                from = %event.from,
                to = %event.to,
                reason = event.reason.as_deref().unwrap_or(""),
                hook = hook.name(),
                error = %message,
                "Transition hook failed"
            );

            failures.push(MentorError::HookFailed {
                hook: hook.name().to_string(),
                from: event.from,
                to: event.to,
                message,
            });
        }

        failures
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;
    use uuid::Uuid;

    fn event(from: ProgramState, to: ProgramState) -> TransitionEvent {
        TransitionEvent {
            program_id: Uuid::new_v4(),
            from,
            to,
            reason: Some("test".to_string()),
            at: Utc::now(),
            triggers: LifecycleTrigger::for_transition(from, to),
        }
    }

    fn counting_hook(name: &str, calls: Arc<AtomicUsize>) -> Arc<dyn TransitionHook> {
        Arc::new(FnHook::new(name, move |_event| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<(), HookError>(())
            }
        }))
    }

    struct PanickingHook;

    #[async_trait]
    impl TransitionHook for PanickingHook {
        fn name(&self) -> &str {
            "panicky"
        }

        async fn on_transition(&self, _event: &TransitionEvent) -> HookResult {
            panic!("boom")
        }
    }

    #[test]
    fn test_pattern_matching() {
        let edge = TransitionPattern::edge(ProgramState::Approved, ProgramState::Active);
        assert!(edge.matches(ProgramState::Approved, ProgramState::Active));
        assert!(!edge.matches(ProgramState::Paused, ProgramState::Active));

        let entering = TransitionPattern::entering(ProgramState::Stalled);
        assert!(entering.matches(ProgramState::Active, ProgramState::Stalled));

        let leaving = TransitionPattern::leaving(ProgramState::Active);
        assert!(leaving.matches(ProgramState::Active, ProgramState::Paused));
        assert!(!leaving.matches(ProgramState::Paused, ProgramState::Active));

        assert!(TransitionPattern::any().matches(ProgramState::Complete, ProgramState::Start));
    }

    #[test]
    fn test_trigger_patterns_agree_with_triggers() {
        for trigger in LifecycleTrigger::ALL {
            let pattern = TransitionPattern::from(trigger);
            for from in ProgramState::ALL {
                for to in ProgramState::ALL {
                    assert_eq!(pattern.matches(from, to), trigger.fires_on(from, to));
                }
            }
        }
    }

    #[tokio::test]
    async fn test_dispatch_only_matching_hooks() {
        let stalled = Arc::new(AtomicUsize::new(0));
        let active = Arc::new(AtomicUsize::new(0));

        let mut registry = HookRegistry::new();
        registry.register(
            LifecycleTrigger::StartReengagement,
            counting_hook("reengage", stalled.clone()),
        );
        registry.register(
            TransitionPattern::entering(ProgramState::Active),
            counting_hook("active", active.clone()),
        );
        assert_eq!(registry.len(), 2);

        let failures = registry
            .dispatch(&event(ProgramState::Active, ProgramState::Stalled))
            .await;

        assert!(failures.is_empty());
        assert_eq!(stalled.load(Ordering::SeqCst), 1);
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failing_and_panicking_hooks_are_isolated() {
        let after = Arc::new(AtomicUsize::new(0));

        let mut registry = HookRegistry::new();
        registry.register(
            TransitionPattern::any(),
            Arc::new(FnHook::new("broken", |_event| async {
                Err::<(), HookError>("mailer offline".into())
            })),
        );
        registry.register(TransitionPattern::any(), Arc::new(PanickingHook));
        registry.register(TransitionPattern::any(), counting_hook("after", after.clone()));

        let failures = registry
            .dispatch(&event(ProgramState::Active, ProgramState::Paused))
            .await;

        assert_eq!(failures.len(), 2);
        assert!(matches!(
            &failures[0],
            MentorError::HookFailed { hook, message, .. }
                if hook == "broken" && message == "mailer offline"
        ));
        assert!(matches!(
            &failures[1],
            MentorError::HookFailed { hook, message, .. }
                if hook == "panicky" && message.contains("boom")
        ));
        assert_eq!(after.load(Ordering::SeqCst), 1);
    }
}
