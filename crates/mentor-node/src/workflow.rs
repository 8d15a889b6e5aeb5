//! End-to-end plan workflow.
//!
//! Draft program -> verify every resource -> PLAN_REVIEW -> APPROVED -> ACTIVE.

use mentor_core::{PlanDocument, Program, ProgramState};
use mentor_lifecycle::TransitionReport;
use mentor_verify::VerificationSummary;
use tracing::{info, warn};

use crate::state::AppState;

/// Plan used when no plan file is given.
pub const SAMPLE_PLAN: &str = r#"{
    "program_title": "Python Mastery",
    "duration_weeks": 4,
    "weekly_load_minutes": 120,
    "description": "A focused intro to Python.",
    "modules": [
        {
            "week_number": 1,
            "title": "Basics",
            "objectives": ["Install Python", "Variables"],
            "tasks": [
                {
                    "type": "READING",
                    "title": "Official Docs",
                    "estimated_minutes": 30,
                    "resources": [
                        {"url": "https://docs.python.org/3/tutorial/", "title": "Tutorial", "is_paid": false}
                    ]
                }
            ]
        }
    ]
}"#;

/// Transitions applied once the draft is verified.
const ACTIVATION_PATH: [(ProgramState, &str); 3] = [
    (ProgramState::PlanReview, "Plan generation complete"),
    (ProgramState::Approved, "User approved plan"),
    (ProgramState::Active, "System activation"),
];

/// Result of a workflow run.
#[derive(Debug)]
pub struct WorkflowOutcome {
    pub program: Program,
    pub summary: VerificationSummary,
    pub transitions: Vec<TransitionReport>,
}

impl WorkflowOutcome {
    /// True if the program never left its draft.
    pub fn halted(&self) -> bool {
        self.program.state == ProgramState::PlanDraft
    }
}

/// Turn `plan` into a program, verify its links and activate it.
///
/// With `require_verified`, a plan with failed links stays in `PLAN_DRAFT`
/// when its policy demands verification for all links.
pub async fn run_workflow(
    state: &AppState,
    plan: PlanDocument,
    user_id: &str,
    require_verified: bool,
) -> anyhow::Result<WorkflowOutcome> {
    let mut program = plan.into_program(user_id, state.engine.policy())?;
    info!(
        program_id = %program.id,
        title = %program.title,
        modules = program.modules.len(),
        resources = program.resource_count(),
        "Draft program created"
    );

    let summary = state.engine.verify_program(&mut program).await;

    if require_verified
        && program.policy.require_verification_for_all_links
        && !summary.all_verified()
    {
        warn!(
            program_id = %program.id,
            failed = summary.failed,
            "Plan has unreachable links, keeping it in draft"
        );
        return Ok(WorkflowOutcome {
            program,
            summary,
            transitions: Vec::new(),
        });
    }

    let mut transitions = Vec::with_capacity(ACTIVATION_PATH.len());
    for (target, reason) in ACTIVATION_PATH {
        let report = state
            .machine
            .transition(&mut program, target, Some(reason))
            .await?;
        transitions.push(report);
    }

    Ok(WorkflowOutcome {
        program,
        summary,
        transitions,
    })
}

/// Human-readable run report.
pub fn render_report(outcome: &WorkflowOutcome) -> String {
    let program = &outcome.program;
    let mut lines = vec![
        format!("[Plan] {} ({})", program.title, program.id),
        format!("       Modules: {}", program.modules.len()),
    ];

    for resource in program.resources() {
        lines.push(format!(
            "       [Resource Check] {} ({}) -> {}",
            resource.title, resource.url, resource.verification_status
        ));
    }

    lines.push(format!(
        "[Verify] {}/{} verified, {} failed",
        outcome.summary.verified, outcome.summary.total, outcome.summary.failed
    ));

    for report in &outcome.transitions {
        lines.push(format!("[State] {} -> {}", report.from, report.to));
        for failure in &report.hook_failures {
            lines.push(format!("        hook failure: {}", failure));
        }
    }
    lines.push(format!("[State] Final: {}", program.state));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    use async_trait::async_trait;
    use mentor_core::{VerificationPolicy, VerificationStatus};
    use mentor_lifecycle::ProgramStateMachine;
    use mentor_verify::{EngineConfig, LinkProber, VerificationCache, VerificationEngine};

    struct FixedProber {
        reachable: HashSet<String>,
    }

    #[async_trait]
    impl LinkProber for FixedProber {
        async fn probe(&self, url: &str) -> VerificationStatus {
            if self.reachable.contains(url) {
                VerificationStatus::Verified
            } else {
                VerificationStatus::Failed
            }
        }
    }

    fn state_with(reachable: &[&str]) -> AppState {
        let policy = VerificationPolicy::default();
        let engine = VerificationEngine::new(
            VerificationCache::from_policy(&policy),
            Arc::new(FixedProber {
                reachable: reachable.iter().map(|s| s.to_string()).collect(),
            }),
            policy,
            EngineConfig::default(),
        );
        AppState::new(engine, ProgramStateMachine::new())
    }

    fn sample() -> PlanDocument {
        PlanDocument::from_json(SAMPLE_PLAN).unwrap()
    }

    #[tokio::test]
    async fn test_sample_plan_reaches_active() {
        let state = state_with(&["https://docs.python.org/3/tutorial/"]);

        let outcome = run_workflow(&state, sample(), "user-1", true).await.unwrap();

        assert!(!outcome.halted());
        assert!(outcome.summary.all_verified());
        assert_eq!(outcome.program.state, ProgramState::Active);
        assert!(outcome.program.approved_at.is_some());
        assert_eq!(outcome.transitions.len(), 3);
        assert_eq!(outcome.transitions[0].from, ProgramState::PlanDraft);

        let report = render_report(&outcome);
        assert!(report.contains("-> VERIFIED"));
        assert!(report.contains("Final: ACTIVE"));
    }

    #[tokio::test]
    async fn test_failed_links_hold_draft_when_required() {
        let state = state_with(&[]);

        let outcome = run_workflow(&state, sample(), "user-1", true).await.unwrap();

        assert!(outcome.halted());
        assert_eq!(outcome.summary.failed, 1);
        assert!(outcome.transitions.is_empty());
        assert!(outcome.program.approved_at.is_none());
    }

    #[tokio::test]
    async fn test_failed_links_tolerated_when_not_required() {
        let state = state_with(&[]);

        let outcome = run_workflow(&state, sample(), "user-1", false).await.unwrap();

        assert_eq!(outcome.program.state, ProgramState::Active);
        assert_eq!(outcome.summary.failed, 1);
        assert!(render_report(&outcome).contains("-> FAILED"));
    }
}
