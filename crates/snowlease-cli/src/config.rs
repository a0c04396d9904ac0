use core::time::Duration;

use anyhow::bail;
use clap::Parser;
use snowlease::{LeaseConfig, RenewalPolicy, SnowflakeLeaseId};

/// Runtime configuration for the `snowlease` binary.
///
/// Every value is parsed from CLI arguments or environment variables. Lease
/// defaults mirror [`LeaseConfig::default`].
#[derive(Parser, Debug, Clone)]
#[command(
    name = "snowlease",
    version,
    about = "Lease worker IDs from a shared store and print Snowflake IDs"
)]
pub struct CliArgs {
    /// Number of generators competing for worker IDs in the same store.
    ///
    /// Each one runs the full leasing protocol, so they end up holding
    /// distinct worker IDs.
    ///
    /// Environment variable: `GENERATORS`
    #[arg(long, env = "GENERATORS", default_value_t = 1)]
    pub generators: usize,

    /// IDs to print per generator.
    ///
    /// Environment variable: `COUNT`
    #[arg(long, env = "COUNT", default_value_t = 10)]
    pub count: u64,

    /// Namespace of lease keys; worker `n` lives under `<prefix>-<n>`.
    ///
    /// Environment variable: `KEY_PREFIX`
    #[arg(long, env = "KEY_PREFIX", default_value_t = String::from("snowflake:worker"))]
    pub key_prefix: String,

    /// Key of the lock guarding the scan-and-claim step.
    ///
    /// Environment variable: `LOCK_KEY`
    #[arg(long, env = "LOCK_KEY", default_value_t = String::from("snowflake:lock"))]
    pub lock_key: String,

    /// Lifetime of a lease record, in milliseconds.
    ///
    /// Environment variable: `LEASE_TTL_MS`
    #[arg(long, env = "LEASE_TTL_MS", default_value_t = 30_000)]
    pub lease_ttl_ms: u64,

    /// How often each lease is refreshed, in milliseconds. Defaults to half
    /// of `--lease-ttl-ms`.
    ///
    /// Environment variable: `RENEW_INTERVAL_MS`
    #[arg(long, env = "RENEW_INTERVAL_MS")]
    pub renew_interval_ms: Option<u64>,

    /// Leasing attempts before a generator gives up.
    ///
    /// Environment variable: `MAX_ATTEMPTS`
    #[arg(long, env = "MAX_ATTEMPTS", default_value_t = 3)]
    pub max_attempts: u32,

    /// Pause between leasing attempts, in milliseconds.
    ///
    /// Environment variable: `RETRY_DELAY_MS`
    #[arg(long, env = "RETRY_DELAY_MS", default_value_t = 2_000)]
    pub retry_delay_ms: u64,

    /// Keep issuing IDs when renewal keeps failing instead of stopping once
    /// the lease may have expired.
    ///
    /// Environment variable: `FAIL_OPEN`
    #[arg(long, env = "FAIL_OPEN", default_value_t = false)]
    pub fail_open: bool,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub generators: usize,
    pub count: u64,
    pub lease: LeaseConfig,
}

impl TryFrom<CliArgs> for RunConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let worker_space = SnowflakeLeaseId::max_worker_id() as usize + 1;

        if args.generators == 0 {
            bail!("GENERATORS must be greater than 0");
        }

        if args.generators > worker_space {
            bail!(
                "GENERATORS ({}) exceeds the worker ID space (max = {})",
                args.generators,
                worker_space
            );
        }

        let mut lease = LeaseConfig::new()
            .with_key_prefix(args.key_prefix)
            .with_lock_key(args.lock_key)
            .with_lease_ttl(Duration::from_millis(args.lease_ttl_ms))
            .with_max_attempts(args.max_attempts)
            .with_retry_delay(Duration::from_millis(args.retry_delay_ms));

        if let Some(renew_interval_ms) = args.renew_interval_ms {
            lease = lease.with_renew_interval(Duration::from_millis(renew_interval_ms));
        }

        if args.fail_open {
            lease = lease.with_renewal_policy(RenewalPolicy::FailOpen);
        }

        lease.validate_for::<SnowflakeLeaseId>()?;

        Ok(Self {
            generators: args.generators,
            count: args.count,
            lease,
        })
    }
}
