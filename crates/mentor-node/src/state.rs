//! Application state.

use std::sync::Arc;

use mentor_lifecycle::ProgramStateMachine;
use mentor_verify::VerificationEngine;

use crate::config::RunnerConfig;
use crate::triggers::register_trigger_hooks;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The verification engine (owns the verdict cache).
    pub engine: Arc<VerificationEngine>,

    /// The lifecycle state machine.
    pub machine: Arc<ProgramStateMachine>,
}

impl AppState {
    pub fn new(engine: VerificationEngine, machine: ProgramStateMachine) -> Self {
        Self {
            engine: Arc::new(engine),
            machine: Arc::new(machine),
        }
    }

    /// Build an HTTP-probing engine and a machine with the trigger hooks.
    pub fn from_config(config: &RunnerConfig) -> anyhow::Result<Self> {
        let engine = VerificationEngine::http(
            config.policy.clone(),
            config.engine.clone(),
            config.prober.clone(),
        )?;

        let mut machine = ProgramStateMachine::new();
        register_trigger_hooks(&mut machine);

        Ok(Self::new(engine, machine))
    }
}
