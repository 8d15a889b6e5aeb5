//! Plan documents produced by the plan generator.
//!
//! The generator is opaque to the core; it hands over a JSON document with
//! modules, tasks and resources. [`PlanDocument::into_program`] turns it into
//! a draft [`Program`] whose resources are all `PENDING`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MentorError, Result};
use crate::policy::VerificationPolicy;
use crate::program::{Module, Program, Resource, Task};
use crate::types::{ProgramState, TaskStatus, TaskType, VerificationStatus};

/// Top-level plan document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDocument {
    #[serde(default = "default_program_title")]
    pub program_title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub duration_weeks: Option<u32>,

    #[serde(default)]
    pub weekly_load_minutes: u32,

    #[serde(default)]
    pub modules: Vec<PlanModule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanModule {
    pub week_number: u32,
    pub title: String,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<PlanTask>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanTask {
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub estimated_minutes: u32,
    #[serde(default)]
    pub deliverable: Option<String>,
    #[serde(default)]
    pub resources: Vec<PlanResource>,
}

/// A resource as the generator emits it. The URL is validated on conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResource {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub cost_usd: f64,
}

fn default_program_title() -> String {
    "Custom Program".to_string()
}

impl PlanDocument {
    /// Parse a plan document from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| MentorError::InvalidPlan(e.to_string()))
    }

    /// Total number of resources across the plan.
    pub fn resource_count(&self) -> usize {
        self.modules
            .iter()
            .flat_map(|m| m.tasks.iter())
            .map(|t| t.resources.len())
            .sum()
    }

    /// Build a draft program in `PLAN_DRAFT` owned by `user_id`.
    ///
    /// Every module and task gets a fresh id and every resource starts out
    /// `PENDING`. A resource with a relative or malformed URL, or a module
    /// scheduled outside `1..=duration_weeks`, rejects the whole plan.
    pub fn into_program(
        self,
        user_id: impl Into<String>,
        policy: &VerificationPolicy,
    ) -> Result<Program> {
        let mut modules = Vec::with_capacity(self.modules.len());

        for plan_module in self.modules {
            let week_number = plan_module.week_number;
            if let Some(weeks) = self.duration_weeks {
                if week_number == 0 || week_number > weeks {
                    return Err(MentorError::InvalidPlan(format!(
                        "module '{}' is scheduled for week {} of a {}-week plan",
                        plan_module.title, week_number, weeks
                    )));
                }
            }
            let mut tasks = Vec::with_capacity(plan_module.tasks.len());

            for plan_task in plan_module.tasks {
                let resources = plan_task
                    .resources
                    .into_iter()
                    .map(PlanResource::into_resource)
                    .collect::<Result<Vec<_>>>()?;

                tasks.push(Task {
                    id: Uuid::new_v4(),
                    week_number,
                    title: plan_task.title,
                    description: plan_task.description,
                    task_type: plan_task.task_type,
                    estimated_minutes: plan_task.estimated_minutes,
                    resources,
                    status: TaskStatus::Pending,
                    completed_at: None,
                    deliverable: plan_task.deliverable,
                });
            }

            modules.push(Module {
                id: Uuid::new_v4(),
                week_number,
                title: plan_module.title,
                objectives: plan_module.objectives,
                tasks,
                is_completed: false,
            });
        }

        let now = Utc::now();
        Ok(Program {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            title: self.program_title,
            description: self.description,
            state: ProgramState::PlanDraft,
            created_at: now,
            updated_at: now,
            approved_at: None,
            modules,
            weekly_load_minutes: self.weekly_load_minutes,
            policy: policy.clone(),
        })
    }
}

impl PlanResource {
    fn into_resource(self) -> Result<Resource> {
        let mut resource = Resource::new(&self.url, self.title).map_err(|e| {
            MentorError::InvalidPlan(format!("resource rejected: {}", e))
        })?;
        resource.provider = self.provider;
        resource.is_paid = self.is_paid;
        resource.cost_usd = self.cost_usd;
        resource.verification_status = VerificationStatus::Pending;
        Ok(resource)
    }
}
