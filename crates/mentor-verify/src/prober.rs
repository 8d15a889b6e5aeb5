//! Network liveness probes.
//!
//! A probe never fails: every outcome, including transport errors, maps to
//! `VERIFIED` or `FAILED`.

use std::time::Duration;

use async_trait::async_trait;
use mentor_core::{MentorError, Result, VerificationStatus};
use reqwest::StatusCode;
use thiserror::Error;

/// Status codes from a HEAD request that earn one GET retry. Some servers
/// reject HEAD outright or answer it differently from GET.
const RETRY_WITH_GET: [StatusCode; 3] = [
    StatusCode::FORBIDDEN,
    StatusCode::NOT_FOUND,
    StatusCode::METHOD_NOT_ALLOWED,
];

/// Checks whether a single URL is reachable.
#[async_trait]
pub trait LinkProber: Send + Sync {
    async fn probe(&self, url: &str) -> VerificationStatus;
}

/// Configuration for [`HttpProber`].
#[derive(Debug, Clone)]
pub struct ProberConfig {
    /// Time allowed to establish a connection.
    pub connect_timeout: Duration,

    /// Time allowed for a whole request, connection included.
    pub request_timeout: Duration,

    /// Maximum number of redirects to follow.
    pub max_redirects: usize,

    pub user_agent: String,
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            max_redirects: 10,
            user_agent: "MentorOS/1.0 (LinkVerifier; +https://mentoros.ai)".to_string(),
        }
    }
}

/// Why a probe did not verify the link.
#[derive(Debug, Error)]
enum ProbeError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server answered {0}")]
    Rejected(StatusCode),
}

/// HEAD-then-GET prober over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(config: ProberConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| MentorError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn check(&self, url: &str) -> std::result::Result<(), ProbeError> {
        let head = self.client.head(url).send().await?;
        let status = head.status();
        if status.as_u16() < 400 {
            return Ok(());
        }
        if !RETRY_WITH_GET.contains(&status) {
            return Err(ProbeError::Rejected(status));
        }

        tracing::debug!(url, %status, "HEAD rejected, retrying with GET");

        // Only the status line and headers are awaited; the body is dropped unread.
        let get = self.client.get(url).send().await?;
        let status = get.status();
        if status.as_u16() < 400 {
            Ok(())
        } else {
            Err(ProbeError::Rejected(status))
        }
    }
}

#[async_trait]
impl LinkProber for HttpProber {
    async fn probe(&self, url: &str) -> VerificationStatus {
        match self.check(url).await {
            Ok(()) => VerificationStatus::Verified,
            Err(err @ ProbeError::Transport(_)) => {
                tracing::warn!(url, error = %err, "Verification network error");
                VerificationStatus::Failed
            }
            Err(err) => {
                tracing::debug!(url, error = %err, "Link rejected");
                VerificationStatus::Failed
            }
        }
    }
}
