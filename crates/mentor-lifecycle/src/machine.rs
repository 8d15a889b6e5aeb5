//! Program lifecycle state machine.
//!
//! The machine validates and commits transitions; it never decides when to
//! transition. Orchestration code calls [`ProgramStateMachine::transition`]
//! and serializes calls for a given program.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use mentor_core::{MentorError, Program, ProgramState, Result};
use uuid::Uuid;

use crate::events::{
    EventBus, EventFilter, LifecycleTrigger, TransitionEvent, TransitionSubscription,
};
use crate::hooks::{HookRegistry, TransitionHook, TransitionPattern};

/// Legal destinations from `state`.
pub fn allowed_transitions(state: ProgramState) -> &'static [ProgramState] {
    use ProgramState::*;

    match state {
        Start => &[Discovery],
        Discovery => &[PlanDraft],
        PlanDraft => &[PlanReview],
        PlanReview => &[Approved, PlanDraft, Start],
        Approved => &[Active],
        Active => &[Assess, Stalled, Paused, Complete],
        Assess => &[Adapt, Active],
        Adapt => &[Active],
        Stalled => &[Active, Paused, PlanReview],
        Paused => &[Active, Complete],
        Complete => &[Start],
    }
}

/// Pure membership test against the transition table.
pub fn can_transition(current: ProgramState, target: ProgramState) -> bool {
    allowed_transitions(current).contains(&target)
}

/// Outcome of a committed transition.
#[derive(Debug, Clone)]
pub struct TransitionReport {
    pub program_id: Uuid,
    pub from: ProgramState,
    pub to: ProgramState,
    pub reason: Option<String>,
    pub at: DateTime<Utc>,

    /// Failures of post-commit hooks. The transition stands regardless.
    pub hook_failures: Vec<MentorError>,
}

impl TransitionReport {
    pub fn has_hook_failures(&self) -> bool {
        !self.hook_failures.is_empty()
    }
}

/// Enforces the lifecycle table and runs hooks after each commit.
#[derive(Default)]
pub struct ProgramStateMachine {
    hooks: HookRegistry,
    events: EventBus,
}

impl ProgramStateMachine {
    /// Create a machine without hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a machine with a prepared hook registry.
    pub fn with_hooks(hooks: HookRegistry) -> Self {
        Self {
            hooks,
            events: EventBus::new(),
        }
    }

    /// Register a hook for transitions matching `pattern`.
    pub fn register_hook(
        &mut self,
        pattern: impl Into<TransitionPattern>,
        hook: Arc<dyn TransitionHook>,
    ) {
        self.hooks.register(pattern, hook);
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Subscribe to committed transitions.
    pub fn subscribe(&self, filter: EventFilter) -> TransitionSubscription {
        self.events.subscribe(filter)
    }

    pub fn can_transition(&self, current: ProgramState, target: ProgramState) -> bool {
        can_transition(current, target)
    }

    /// Move `program` to `target`.
    ///
    /// On an illegal target the program is left untouched and
    /// [`MentorError::IllegalTransition`] is returned. Otherwise the new state
    /// and timestamps are committed first, then the transition event is
    /// published and matching hooks run. Hook failures end up in the report.
    pub async fn transition(
        &self,
        program: &mut Program,
        target: ProgramState,
        reason: Option<&str>,
    ) -> Result<TransitionReport> {
        let from = program.state;

        if !can_transition(from, target) {
            tracing::debug!(
                program_id = %program.id,
                from = %from,
                to = %target,
                "Rejected illegal transition"
            );
            return Err(MentorError::IllegalTransition {
                program_id: program.id,
                from,
                to: target,
                allowed: allowed_transitions(from).to_vec(),
            });
        }

        let now = next_timestamp(program.updated_at);
        if target == ProgramState::Approved {
            program.approved_at = Some(now);
        }
        program.state = target;
        program.updated_at = now;

        tracing::info!(
            program_id = %program.id,
            from = %from,
            to = %target,
            reason = reason.unwrap_or(""),
            "Program transitioned"
        );

        let event = TransitionEvent {
            program_id: program.id,
            from,
            to: target,
            reason: reason.map(str::to_string),
            at: now,
            triggers: LifecycleTrigger::for_transition(from, target),
        };

        self.events.publish(event.clone());
        let hook_failures = self.hooks.dispatch(&event).await;

        Ok(TransitionReport {
            program_id: event.program_id,
            from,
            to: target,
            reason: event.reason,
            at: now,
            hook_failures,
        })
    }
}

/// Current time, forced strictly past `previous`.
fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}
