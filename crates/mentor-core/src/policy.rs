//! Verification policy.
//!
//! Policies are immutable inputs: the core reads them but never changes them.

use serde::{Deserialize, Serialize};
use url::Url;

/// Default number of days a verification result stays fresh.
pub const DEFAULT_VERIFICATION_TTL_DAYS: u32 = 14;

/// Read-only settings that govern link verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationPolicy {
    /// Every link must be verified before a plan leaves its draft.
    pub require_verification_for_all_links: bool,

    /// How long a verification result may be reused, in days.
    pub verification_ttl_days: u32,

    /// Paywalled links may appear in a plan.
    pub allow_paywalled_links: bool,

    /// If non-empty, only links on these domains (or their subdomains) pass.
    pub allowed_domains: Vec<String>,

    /// Links on these domains (or their subdomains) always fail.
    pub blocked_domains: Vec<String>,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            require_verification_for_all_links: true,
            verification_ttl_days: DEFAULT_VERIFICATION_TTL_DAYS,
            allow_paywalled_links: true,
            allowed_domains: Vec::new(),
            blocked_domains: Vec::new(),
        }
    }
}

impl VerificationPolicy {
    /// Time-to-live for cached verification results.
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.verification_ttl_days))
    }

    /// Check the domain allow/block lists for a URL.
    ///
    /// URLs without a host never pass once either list is in use.
    pub fn permits(&self, url: &Url) -> bool {
        if self.allowed_domains.is_empty() && self.blocked_domains.is_empty() {
            return true;
        }

        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();

        if self.blocked_domains.iter().any(|d| domain_matches(&host, d)) {
            return false;
        }

        self.allowed_domains.is_empty()
            || self.allowed_domains.iter().any(|d| domain_matches(&host, d))
    }
}

fn domain_matches(host: &str, domain: &str) -> bool {
    let domain = domain.trim().trim_start_matches('.').to_ascii_lowercase();
    if domain.is_empty() {
        return false;
    }
    host == domain || host.ends_with(&format!(".{}", domain))
}
