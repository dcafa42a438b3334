//! Proctoring monitor server.
//!
//! ```
//! cargo run -p monitor -- --addr 127.0.0.1:3000 --replica-lag-ms 2000
//! ```
//!
//! Watch the live feed as a teacher:
//! ```
//! curl -N -H 'x-proctor-role: teacher' http://127.0.0.1:3000/api/teacher/monitor_stream
//! ```

use std::{future::IntoFuture, net::SocketAddr, str::FromStr, time::Duration};

use anyhow::Result;
use clap::Parser;
use proctor::ConfigBuilder;
use proctor_axum::{router, AppState};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "monitor")]
#[command(about = "Live proctoring stream and distributed-systems demos")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "PROCTOR_ADDR", default_value = "127.0.0.1:3000")]
    addr: SocketAddr,

    /// Delay before writes reach the replica, in milliseconds
    #[arg(long, env = "PROCTOR_REPLICA_LAG_MS", default_value_t = 2000)]
    replica_lag_ms: u64,

    /// Probability that the simulated primary rejects a request
    #[arg(long, env = "PROCTOR_PRIMARY_FAILURE_RATIO", default_value_t = 0.5)]
    primary_failure_ratio: f64,

    /// Keep-alive interval of monitor streams, in seconds
    #[arg(long, env = "PROCTOR_KEEP_ALIVE_SECS", default_value_t = 15)]
    keep_alive_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::from_str("error,proctor=debug,proctor_axum=debug,monitor=info")?,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();

    let args = Args::parse();

    let config = ConfigBuilder::new()
        .replica_lag(Duration::from_millis(args.replica_lag_ms))
        .primary_failure_ratio(args.primary_failure_ratio)
        .keep_alive(Duration::from_secs(args.keep_alive_secs))
        .build()?;

    let state = AppState::new(&config)?;
    let store = state.store.clone();

    let listener = TcpListener::bind(args.addr).await?;
    info!("listening on {}", args.addr);

    // open monitor streams are dropped, not drained
    tokio::select! {
        res = axum::serve(listener, router(state)).into_future() => res?,
        _ = tokio::signal::ctrl_c() => info!("shutting down"),
    }

    store.shutdown().await;

    Ok(())
}
