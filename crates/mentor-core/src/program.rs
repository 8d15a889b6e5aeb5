//! Program, module, task and resource entities.
//!
//! A [`Program`] owns its modules, each module owns its tasks and each task
//! owns its resources. The lifecycle and verification crates only touch the
//! lifecycle timestamps and the verification fields of these records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::{MentorError, Result};
use crate::policy::VerificationPolicy;
use crate::types::{ProgramState, TaskStatus, TaskType, VerificationStatus};

/// An external link referenced by a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Absolute URL of the resource.
    pub url: Url,

    /// Human-readable title.
    pub title: String,

    /// Who publishes the resource (e.g. "Coursera").
    #[serde(default)]
    pub provider: Option<String>,

    /// Whether the resource sits behind a paywall.
    #[serde(default)]
    pub is_paid: bool,

    /// Cost in USD (0 for free resources).
    #[serde(default)]
    pub cost_usd: f64,

    /// Result of the last liveness check.
    #[serde(default)]
    pub verification_status: VerificationStatus,

    /// When the last liveness check happened.
    #[serde(default)]
    pub last_verified_at: Option<DateTime<Utc>>,
}

impl Resource {
    /// Create a free, unverified resource. Fails unless `url` is absolute.
    pub fn new(url: &str, title: impl Into<String>) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| MentorError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            url,
            title: title.into(),
            provider: None,
            is_paid: false,
            cost_usd: 0.0,
            verification_status: VerificationStatus::Pending,
            last_verified_at: None,
        })
    }

    /// Mark the resource as paid.
    pub fn paid(mut self, cost_usd: f64) -> Self {
        self.is_paid = true;
        self.cost_usd = cost_usd;
        self
    }

    /// Set the provider.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Record the outcome of a liveness check.
    pub fn record_verification(&mut self, status: VerificationStatus, at: DateTime<Utc>) {
        self.verification_status = status;
        self.last_verified_at = Some(at);
    }

    pub fn is_verified(&self) -> bool {
        self.verification_status == VerificationStatus::Verified
    }
}

/// A unit of work inside a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub week_number: u32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub estimated_minutes: u32,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// What the learner should hand in.
    #[serde(default)]
    pub deliverable: Option<String>,
}

/// One week (or block) of a program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: Uuid,
    pub week_number: u32,
    pub title: String,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub is_completed: bool,
}

/// The lifecycle-bearing learning program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Unique identifier for this program.
    pub id: Uuid,

    /// Learner who owns the program.
    pub user_id: String,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Current lifecycle state.
    #[serde(default)]
    pub state: ProgramState,

    pub created_at: DateTime<Utc>,

    /// Set on every committed transition.
    pub updated_at: DateTime<Utc>,

    /// Set on every entry into `APPROVED`; never cleared.
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub modules: Vec<Module>,

    /// Expected weekly load in minutes.
    #[serde(default)]
    pub weekly_load_minutes: u32,

    /// Policy snapshot taken when the program was created.
    #[serde(default)]
    pub policy: VerificationPolicy,
}

impl Program {
    /// Create an empty program in the `START` state.
    pub fn new(user_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            title: title.into(),
            description: None,
            state: ProgramState::Start,
            created_at: now,
            updated_at: now,
            approved_at: None,
            modules: Vec::new(),
            weekly_load_minutes: 0,
            policy: VerificationPolicy::default(),
        }
    }

    /// Iterate over every resource in every task of every module.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.modules
            .iter()
            .flat_map(|m| m.tasks.iter())
            .flat_map(|t| t.resources.iter())
    }

    /// Mutable counterpart of [`Program::resources`].
    pub fn resources_mut(&mut self) -> impl Iterator<Item = &mut Resource> {
        self.modules
            .iter_mut()
            .flat_map(|m| m.tasks.iter_mut())
            .flat_map(|t| t.resources.iter_mut())
    }

    pub fn resource_count(&self) -> usize {
        self.resources().count()
    }

    /// Resources whose last check failed.
    pub fn failed_resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources()
            .filter(|r| r.verification_status == VerificationStatus::Failed)
    }

    /// True when every resource has been verified as reachable.
    pub fn all_resources_verified(&self) -> bool {
        self.resources().all(Resource::is_verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_with(resources: Vec<Resource>) -> Task {
        Task {
            id: Uuid::new_v4(),
            week_number: 1,
            title: "Read".to_string(),
            description: None,
            task_type: TaskType::Reading,
            estimated_minutes: 30,
            resources,
            status: TaskStatus::Pending,
            completed_at: None,
            deliverable: None,
        }
    }

    #[test]
    fn test_resource_requires_absolute_url() {
        assert!(Resource::new("https://docs.python.org/3/", "Docs").is_ok());

        let err = Resource::new("/relative/path", "Nope").unwrap_err();
        assert!(matches!(err, MentorError::InvalidUrl { .. }));
    }

    #[test]
    fn test_resource_starts_pending() {
        let resource = Resource::new("https://example.com", "Example")
            .unwrap()
            .paid(19.0)
            .with_provider("Example Inc");

        assert_eq!(resource.verification_status, VerificationStatus::Pending);
        assert!(resource.last_verified_at.is_none());
        assert!(resource.is_paid);
        assert_eq!(resource.provider.as_deref(), Some("Example Inc"));
    }

    #[test]
    fn test_resource_json_rejects_relative_url() {
        let json = r#"{"url": "not a url", "title": "x"}"#;
        assert!(serde_json::from_str::<Resource>(json).is_err());
    }

    #[test]
    fn test_program_resource_walk() {
        let mut program = Program::new("user-1", "Python");
        program.modules.push(Module {
            id: Uuid::new_v4(),
            week_number: 1,
            title: "Basics".to_string(),
            objectives: vec![],
            tasks: vec![
                task_with(vec![Resource::new("https://a.example", "A").unwrap()]),
                task_with(vec![
                    Resource::new("https://b.example", "B").unwrap(),
                    Resource::new("https://c.example", "C").unwrap(),
                ]),
            ],
            is_completed: false,
        });

        assert_eq!(program.state, ProgramState::Start);
        assert_eq!(program.resource_count(), 3);
        assert!(!program.all_resources_verified());

        let now = Utc::now();
        for resource in program.resources_mut() {
            resource.record_verification(VerificationStatus::Verified, now);
        }
        assert!(program.all_resources_verified());
        assert_eq!(program.failed_resources().count(), 0);
    }
}
