#![doc = include_str!("../README.md")]

mod config;
mod telemetry;

use std::io::{self, BufWriter, Write};

use clap::Parser;
use config::{CliArgs, RunConfig};
use futures::future::{join_all, try_join_all};
use snowlease::{LeasedSnowflakeGenerator, MemoryStore, SnowflakeLeaseId, SystemClock};
use telemetry::init_telemetry;
use tokio::signal;
use tokio_util::sync::CancellationToken;

type Generator = LeasedSnowflakeGenerator<SnowflakeLeaseId, SystemClock>;

/// IDs written between cooperative yields, so a pending Ctrl+C gets polled.
const YIELD_EVERY: u64 = 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = RunConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    let store = MemoryStore::new();
    let token = CancellationToken::new();

    let generators = tokio::select! {
        res = lease_all(&store, &config, &token) => res?,
        res = shutdown_signal() => {
            res?;
            token.cancel();
            return Ok(());
        }
    };

    let outcome = tokio::select! {
        res = emit(&generators, config.count) => res,
        res = shutdown_signal() => res.map_err(anyhow::Error::from),
    };

    token.cancel();
    join_all(generators.into_iter().map(Generator::shutdown)).await;
    tracing::info!(leases_held = store.len(), "Generators shut down");
    outcome
}

fn log_startup_info(config: &RunConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting with full config: {:#?}", config);
    } else {
        tracing::info!(
            generators = config.generators,
            count = config.count,
            "Starting generators"
        );
    }
}

/// Leases a worker ID for every generator concurrently. Renewal tasks hang
/// off `token`, so cancelling it stops all of them.
async fn lease_all(
    store: &MemoryStore,
    config: &RunConfig,
    token: &CancellationToken,
) -> anyhow::Result<Vec<Generator>> {
    let generators = try_join_all((0..config.generators).map(|_| {
        Generator::with_clock_and_token(
            store.clone(),
            config.lease.clone(),
            SystemClock::default(),
            token.child_token(),
        )
    }))
    .await?;

    for generator in &generators {
        tracing::info!(
            worker_id = generator.worker_id(),
            lease_key = generator.lease_key(),
            "Generator ready"
        );
    }
    Ok(generators)
}

/// Round-robins `count` IDs out of every generator onto stdout.
async fn emit(generators: &[Generator], count: u64) -> anyhow::Result<()> {
    let mut out = BufWriter::new(io::stdout().lock());
    for round in 0..count {
        for generator in generators {
            let id = generator.next()?;
            writeln!(
                out,
                "{id}\tworker={} timestamp={} sequence={}",
                id.worker_id(),
                id.timestamp(),
                id.sequence()
            )?;
        }
        if (round + 1) % YIELD_EVERY == 0 {
            out.flush()?;
            tokio::task::yield_now().await;
        }
    }
    out.flush()?;
    Ok(())
}

async fn shutdown_signal() -> io::Result<()> {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())?
            .recv()
            .await;
        io::Result::Ok(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<io::Result<()>>();

    tokio::select! {
        res = signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C signal");
            res
        },
        res = terminate => {
            tracing::info!("Received SIGTERM signal");
            res
        },
    }
}
