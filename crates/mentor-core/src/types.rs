//! Common types used across MentorOS.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a [`Program`](crate::Program).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgramState {
    /// Nothing has happened yet (initial state).
    #[default]
    Start,
    /// Collecting the learner's goal, level and constraints.
    Discovery,
    /// A plan is being generated.
    PlanDraft,
    /// The generated plan is waiting for review.
    PlanReview,
    /// The plan was approved.
    Approved,
    /// The program is running week by week.
    Active,
    /// Progress is being assessed.
    Assess,
    /// The plan is being adapted after an assessment.
    Adapt,
    /// The learner stopped making progress.
    Stalled,
    /// The learner paused the program.
    Paused,
    /// The program finished. A new cycle may start from here.
    Complete,
}

impl ProgramState {
    /// Every lifecycle state, in declaration order.
    pub const ALL: [ProgramState; 11] = [
        ProgramState::Start,
        ProgramState::Discovery,
        ProgramState::PlanDraft,
        ProgramState::PlanReview,
        ProgramState::Approved,
        ProgramState::Active,
        ProgramState::Assess,
        ProgramState::Adapt,
        ProgramState::Stalled,
        ProgramState::Paused,
        ProgramState::Complete,
    ];

    /// Wire name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramState::Start => "START",
            ProgramState::Discovery => "DISCOVERY",
            ProgramState::PlanDraft => "PLAN_DRAFT",
            ProgramState::PlanReview => "PLAN_REVIEW",
            ProgramState::Approved => "APPROVED",
            ProgramState::Active => "ACTIVE",
            ProgramState::Assess => "ASSESS",
            ProgramState::Adapt => "ADAPT",
            ProgramState::Stalled => "STALLED",
            ProgramState::Paused => "PAUSED",
            ProgramState::Complete => "COMPLETE",
        }
    }

    /// Returns true while the learner is working through the plan.
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            ProgramState::Active | ProgramState::Assess | ProgramState::Adapt
        )
    }

    /// Returns true before the plan has been approved.
    pub fn is_planning(&self) -> bool {
        matches!(
            self,
            ProgramState::Start
                | ProgramState::Discovery
                | ProgramState::PlanDraft
                | ProgramState::PlanReview
        )
    }
}

impl fmt::Display for ProgramState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Liveness status of a resource link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    /// Not processed by the verification engine yet.
    #[default]
    Pending,
    /// The link answered with a non-error status.
    Verified,
    /// The link could not be reached or answered with an error status.
    Failed,
}

impl VerificationStatus {
    /// Returns true once the engine has reached a verdict.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, VerificationStatus::Pending)
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationStatus::Pending => f.write_str("PENDING"),
            VerificationStatus::Verified => f.write_str("VERIFIED"),
            VerificationStatus::Failed => f.write_str("FAILED"),
        }
    }
}

/// Kind of work a task asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    Reading,
    Video,
    Drill,
    Reflection,
    Quiz,
    Project,
}

/// Progress of a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Skipped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_state_wire_names() {
        for state in ProgramState::ALL {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state.as_str()));
        }
        assert_eq!(ProgramState::default(), ProgramState::Start);
    }

    #[test]
    fn test_program_state_phases() {
        assert!(ProgramState::PlanReview.is_planning());
        assert!(!ProgramState::Approved.is_planning());
        assert!(ProgramState::Assess.is_running());
        assert!(!ProgramState::Paused.is_running());
    }

    #[test]
    fn test_verification_status_terminal() {
        assert!(!VerificationStatus::Pending.is_terminal());
        assert!(VerificationStatus::Verified.is_terminal());
        assert!(VerificationStatus::Failed.is_terminal());
        assert_eq!(VerificationStatus::default(), VerificationStatus::Pending);
    }

    #[test]
    fn test_task_type_parses_upper_case() {
        let kind: TaskType = serde_json::from_str("\"REFLECTION\"").unwrap();
        assert_eq!(kind, TaskType::Reflection);
        assert!(serde_json::from_str::<TaskType>("\"PODCAST\"").is_err());
    }
}
