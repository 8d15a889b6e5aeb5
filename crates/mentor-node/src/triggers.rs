//! Hooks for the built-in lifecycle triggers.
//!
//! The runner has no planner, scheduler or messaging backend attached, so
//! these hooks only record that the side effect was requested.

use std::sync::Arc;

use async_trait::async_trait;
use mentor_lifecycle::{
    HookResult, LifecycleTrigger, ProgramStateMachine, TransitionEvent, TransitionHook,
};
use tracing::info;

/// Logs each lifecycle trigger as it fires.
pub struct TriggerLogHook {
    trigger: LifecycleTrigger,
    name: String,
}

impl TriggerLogHook {
    pub fn new(trigger: LifecycleTrigger) -> Self {
        Self {
            trigger,
            name: format!("log:{:?}", trigger),
        }
    }
}

#[async_trait]
impl TransitionHook for TriggerLogHook {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_transition(&self, event: &TransitionEvent) -> HookResult {
        let action = match self.trigger {
            LifecycleTrigger::RequestPlanGeneration => "📋 Requesting plan generation",
            LifecycleTrigger::ScheduleFirstWeek => "📅 Scheduling first-week delivery",
            LifecycleTrigger::StartReengagement => "📣 Starting re-engagement flow",
        };
        info!(program_id = %event.program_id, from = %event.from, to = %event.to, "{}", action);
        Ok(())
    }
}

/// Attach a [`TriggerLogHook`] for every built-in trigger.
pub fn register_trigger_hooks(machine: &mut ProgramStateMachine) {
    for trigger in LifecycleTrigger::ALL {
        machine.register_hook(trigger, Arc::new(TriggerLogHook::new(trigger)));
    }
}
