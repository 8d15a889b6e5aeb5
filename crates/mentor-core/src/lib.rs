//! # Mentor Core
//!
//! Core primitives shared by the MentorOS lifecycle and verification crates.
//!
//! This crate provides the fundamental building blocks:
//! - [`Program`] - The lifecycle-bearing learning program and its modules
//! - [`Resource`] - An external link referenced by a task
//! - [`PlanDocument`] - The structured plan produced by plan generation
//! - [`VerificationPolicy`] - Read-only verification settings
//! - [`MentorError`] - Error types

pub mod error;
pub mod plan;
pub mod policy;
pub mod program;
pub mod types;

// Re-exports for convenience
pub use error::{MentorError, Result};
pub use plan::PlanDocument;
pub use policy::VerificationPolicy;
pub use program::{Module, Program, Resource, Task};
pub use types::*;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{MentorError, Result};
    pub use crate::plan::PlanDocument;
    pub use crate::policy::VerificationPolicy;
    pub use crate::program::{Module, Program, Resource, Task};
    pub use crate::types::{ProgramState, TaskStatus, TaskType, VerificationStatus};
}
