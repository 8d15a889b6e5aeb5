//! Error types for MentorOS.

use thiserror::Error;
use uuid::Uuid;

use crate::types::ProgramState;

/// Main error type for MentorOS operations.
#[derive(Error, Debug, Clone)]
pub enum MentorError {
    /// The requested lifecycle transition is not in the transition table.
    #[error(
        "Illegal transition for program {program_id}: {from} -> {to} (allowed from {from}: {})",
        format_states(.allowed)
    )]
    IllegalTransition {
        program_id: Uuid,
        from: ProgramState,
        to: ProgramState,
        allowed: Vec<ProgramState>,
    },

    /// A post-transition hook failed. The transition itself stays committed.
    #[error("Hook '{hook}' failed after {from} -> {to}: {message}")]
    HookFailed {
        hook: String,
        from: ProgramState,
        to: ProgramState,
        message: String,
    },

    /// The plan document could not be turned into a program.
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    /// A resource URL is not a well-formed absolute URI.
    #[error("Invalid resource URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MentorError {
    /// Returns true if the caller can recover and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MentorError::IllegalTransition { .. } | MentorError::HookFailed { .. }
        )
    }

    /// Returns the program ID if available.
    pub fn program_id(&self) -> Option<Uuid> {
        match self {
            MentorError::IllegalTransition { program_id, .. } => Some(*program_id),
            _ => None,
        }
    }
}

fn format_states(states: &[ProgramState]) -> String {
    if states.is_empty() {
        return "none".to_string();
    }
    states
        .iter()
        .map(ProgramState::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience Result type for MentorOS operations.
pub type Result<T> = std::result::Result<T, MentorError>;

impl From<serde_json::Error> for MentorError {
    fn from(err: serde_json::Error) -> Self {
        MentorError::SerializationError(err.to_string())
    }
}
