//! Verification engine.
//!
//! Combines the [`VerificationCache`] and a [`LinkProber`]. The engine is an
//! explicitly constructed value; share it behind an `Arc` for the lifetime of
//! the process or request scope.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use mentor_core::{Program, Resource, Result, VerificationPolicy, VerificationStatus};
use url::Url;

use crate::cache::VerificationCache;
use crate::prober::{HttpProber, LinkProber, ProberConfig};

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on probes in flight during a batch.
    pub max_concurrent_probes: usize,

    /// Maximum number of cached verdicts. `None` means unbounded.
    pub cache_capacity: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_probes: 16,
            cache_capacity: Some(10_000),
        }
    }
}

/// Outcome of verifying every resource in a program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationSummary {
    pub total: usize,
    pub verified: usize,
    pub failed: usize,
    /// URLs that failed, in program order.
    pub failed_urls: Vec<String>,
}

impl VerificationSummary {
    pub fn all_verified(&self) -> bool {
        self.failed == 0 && self.verified == self.total
    }
}

/// Cached, concurrent link verification.
pub struct VerificationEngine {
    cache: VerificationCache,
    prober: Arc<dyn LinkProber>,
    policy: VerificationPolicy,
    config: EngineConfig,
}

impl VerificationEngine {
    /// Create an engine around an existing cache and prober.
    ///
    /// The cache is used as given; `config.cache_capacity` only sizes the
    /// cache built by [`VerificationEngine::http`].
    pub fn new(
        cache: VerificationCache,
        prober: Arc<dyn LinkProber>,
        policy: VerificationPolicy,
        config: EngineConfig,
    ) -> Self {
        Self {
            cache,
            prober,
            policy,
            config,
        }
    }

    /// Create an engine that probes over HTTP with a fresh cache sized by
    /// `config` and expiring per `policy`.
    pub fn http(
        policy: VerificationPolicy,
        config: EngineConfig,
        prober_config: ProberConfig,
    ) -> Result<Self> {
        let cache = match config.cache_capacity {
            Some(capacity) => VerificationCache::bounded(policy.ttl(), capacity),
            None => VerificationCache::new(policy.ttl()),
        };
        let prober = Arc::new(HttpProber::new(prober_config)?);
        Ok(Self::new(cache, prober, policy, config))
    }

    pub fn cache(&self) -> &VerificationCache {
        &self.cache
    }

    pub fn policy(&self) -> &VerificationPolicy {
        &self.policy
    }

    /// Verify a URL, consulting the cache first.
    ///
    /// URLs that are malformed or excluded by the domain policy fail without
    /// a probe and are not cached, even when a shared cache holds a verdict
    /// for them. Entries are keyed on the normalized URL.
    pub async fn verify_url(&self, url: &str) -> VerificationStatus {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(url, error = %e, "Malformed link");
                return VerificationStatus::Failed;
            }
        };
        if !self.policy.permits(&parsed) {
            tracing::warn!(url, "Link excluded by domain policy");
            return VerificationStatus::Failed;
        }

        let key = parsed.as_str();
        if let Some(entry) = self.cache.get(key).await {
            tracing::debug!(url = key, status = %entry.status, "Cache hit");
            return entry.status;
        }

        let status = self.prober.probe(key).await;
        self.cache.put(key, status, Utc::now()).await;
        status
    }

    /// Verify `resource` and record the verdict on it.
    ///
    /// Paid resources fail without a probe when the policy disallows
    /// paywalled links.
    pub async fn verify_resource<'a>(&self, resource: &'a mut Resource) -> &'a mut Resource {
        let status = if resource.is_paid && !self.policy.allow_paywalled_links {
            tracing::warn!(url = %resource.url, "Paywalled link excluded by policy");
            VerificationStatus::Failed
        } else {
            self.verify_url(resource.url.as_str()).await
        };
        resource.record_verification(status, Utc::now());
        resource
    }

    /// Verify every resource concurrently.
    ///
    /// The returned statuses follow the input order. A failed link never
    /// stops the others. Dropping the future cancels all in-flight probes.
    pub async fn batch_verify(&self, resources: &mut [Resource]) -> Vec<VerificationStatus> {
        self.verify_all(resources.iter_mut()).await
    }

    /// Verify every resource of every task of every module in `program`.
    pub async fn verify_program(&self, program: &mut Program) -> VerificationSummary {
        let statuses = self.verify_all(program.resources_mut()).await;

        let mut summary = VerificationSummary {
            total: statuses.len(),
            ..Default::default()
        };
        for (resource, status) in program.resources().zip(statuses) {
            match status {
                VerificationStatus::Verified => summary.verified += 1,
                _ => {
                    summary.failed += 1;
                    summary.failed_urls.push(resource.url.to_string());
                }
            }
        }

        tracing::info!(
            program_id = %program.id,
            total = summary.total,
            verified = summary.verified,
            failed = summary.failed,
            "Program resources verified"
        );

        summary
    }

    async fn verify_all<'a, I>(&self, resources: I) -> Vec<VerificationStatus>
    where
        I: IntoIterator<Item = &'a mut Resource>,
    {
        let limit = self.config.max_concurrent_probes.max(1);

        stream::iter(resources)
            .map(move |resource| async move {
                self.verify_resource(resource).await.verification_status
            })
            .buffered(limit)
            .collect()
            .await
    }
}
