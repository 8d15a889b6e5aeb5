//! Runner configuration.
//!
//! Every flag can also be set through the environment:
//! - `MENTOR_POLICY_PATH` - JSON verification policy. Defaults to the built-in policy.
//! - `MENTOR_TTL_DAYS` - Overrides the policy's verification TTL.
//! - `MENTOR_MAX_CONCURRENT_PROBES` - Probes in flight per batch. Defaults to `16`.
//! - `MENTOR_CONNECT_TIMEOUT_SECS` - Connect timeout per probe. Defaults to `5`.
//! - `MENTOR_PROBE_TIMEOUT_SECS` - Overall timeout per probe request. Defaults to `10`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use mentor_core::VerificationPolicy;
use mentor_verify::{EngineConfig, ProberConfig};

#[derive(Debug, Parser)]
#[command(
    name = "mentor-node",
    version,
    about = "Verify a generated learning plan and drive it through the program lifecycle"
)]
pub struct Cli {
    /// Plan document (JSON). The built-in sample plan is used when omitted.
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Learner who owns the program
    #[arg(long, default_value = "demo-user")]
    pub user_id: String,

    /// Verification policy (JSON)
    #[arg(long, env = "MENTOR_POLICY_PATH")]
    pub policy: Option<PathBuf>,

    /// Days a verification result stays fresh
    #[arg(long, env = "MENTOR_TTL_DAYS")]
    pub ttl_days: Option<u32>,

    #[arg(long, env = "MENTOR_MAX_CONCURRENT_PROBES", default_value_t = 16)]
    pub max_concurrent_probes: usize,

    #[arg(long, env = "MENTOR_CONNECT_TIMEOUT_SECS", default_value_t = 5)]
    pub connect_timeout_secs: u64,

    #[arg(long, env = "MENTOR_PROBE_TIMEOUT_SECS", default_value_t = 10)]
    pub probe_timeout_secs: u64,

    /// Keep the program in PLAN_DRAFT if any link fails and the policy
    /// requires every link to be verified
    #[arg(long)]
    pub require_verified: bool,
}

/// Resolved runner configuration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub plan_path: Option<PathBuf>,
    pub user_id: String,
    pub policy: VerificationPolicy,
    pub engine: EngineConfig,
    pub prober: ProberConfig,
    pub require_verified: bool,
}

impl RunnerConfig {
    /// Resolve the command line into a configuration.
    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        let mut policy = match cli.policy.as_deref() {
            Some(path) => load_policy(path)?,
            None => VerificationPolicy::default(),
        };
        if let Some(days) = cli.ttl_days {
            policy.verification_ttl_days = days;
        }

        if cli.max_concurrent_probes == 0 {
            bail!("max concurrent probes must be at least 1");
        }
        if cli.connect_timeout_secs == 0 || cli.probe_timeout_secs == 0 {
            bail!("probe timeouts must be positive");
        }
        if cli.connect_timeout_secs > cli.probe_timeout_secs {
            bail!(
                "connect timeout ({}s) must not exceed the probe timeout ({}s)",
                cli.connect_timeout_secs,
                cli.probe_timeout_secs
            );
        }

        let prober = ProberConfig {
            connect_timeout: Duration::from_secs(cli.connect_timeout_secs),
            request_timeout: Duration::from_secs(cli.probe_timeout_secs),
            ..Default::default()
        };
        let engine = EngineConfig {
            max_concurrent_probes: cli.max_concurrent_probes,
            ..Default::default()
        };

        Ok(Self {
            plan_path: cli.plan,
            user_id: cli.user_id,
            policy,
            engine,
            prober,
            require_verified: cli.require_verified,
        })
    }
}

fn load_policy(path: &Path) -> anyhow::Result<VerificationPolicy> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read policy file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid policy file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["mentor-node"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = RunnerConfig::from_cli(parse(&[])).unwrap();

        assert_eq!(config.user_id, "demo-user");
        assert!(config.plan_path.is_none());
        assert_eq!(config.policy, VerificationPolicy::default());
        assert_eq!(config.prober.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.prober.request_timeout, Duration::from_secs(10));
        assert_eq!(config.engine.max_concurrent_probes, 16);
        assert!(!config.require_verified);
    }

    #[test]
    fn test_ttl_override() {
        let config = RunnerConfig::from_cli(parse(&["--ttl-days", "3"])).unwrap();
        assert_eq!(config.policy.verification_ttl_days, 3);
    }

    #[test]
    fn test_inverted_timeouts_rejected() {
        let cli = parse(&["--connect-timeout-secs", "10", "--probe-timeout-secs", "5"]);
        assert!(RunnerConfig::from_cli(cli).is_err());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let cli = parse(&["--max-concurrent-probes", "0"]);
        assert!(RunnerConfig::from_cli(cli).is_err());
    }

    #[test]
    fn test_policy_file() {
        let path =
            std::env::temp_dir().join(format!("mentor-policy-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"{"verification_ttl_days": 7, "blocked_domains": ["spam.example"]}"#,
        )
        .unwrap();

        let cli = parse(&["--policy", path.to_str().unwrap()]);
        let config = RunnerConfig::from_cli(cli).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.policy.verification_ttl_days, 7);
        assert_eq!(config.policy.blocked_domains, vec!["spam.example".to_string()]);
    }

    #[test]
    fn test_missing_policy_file() {
        let cli = parse(&["--policy", "/definitely/not/here.json"]);
        let err = RunnerConfig::from_cli(cli).unwrap_err();
        assert!(err.to_string().contains("Failed to read policy file"));
    }
}
