//! # Mentor Verify
//!
//! Liveness verification for resource links embedded in learning programs.
//!
//! - [`VerificationCache`] - URL verdicts with TTL expiry
//! - [`HttpProber`] - HEAD-then-GET liveness probe
//! - [`VerificationEngine`] - cache + prober, single and batch verification

pub mod cache;
pub mod engine;
pub mod prober;

pub use cache::{CacheEntry, VerificationCache};
pub use engine::{EngineConfig, VerificationEngine, VerificationSummary};
pub use prober::{HttpProber, LinkProber, ProberConfig};
