//! Leader/replica key-value store with an artificial replication lag.
//!
//! Writes land on the leader immediately and reach the replica after a fixed
//! delay, so eventual reads can observe stale or missing values for the
//! length of the lag window. That divergence is the point of the simulation.
//!
//! Replica updates run as tracked tasks owned by the store: [`ConsistencyStore::shutdown`]
//! cancels whatever is still pending, and so does dropping the last handle.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    collections::HashMap,
    fmt,
    str::FromStr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::time::sleep;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::debug;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadMode {
    Strong,
    Eventual,
}

impl FromStr for ReadMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "strong" => Ok(Self::Strong),
            "eventual" => Ok(Self::Eventual),
            other => Err(Error::InvalidInput(format!("unknown read mode {other}"))),
        }
    }
}

impl fmt::Display for ReadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strong => f.write_str("strong"),
            Self::Eventual => f.write_str("eventual"),
        }
    }
}

#[derive(Debug, Clone)]
struct Versioned {
    version: u64,
    value: Value,
}

type Shared = Arc<RwLock<HashMap<String, Versioned>>>;

struct Inner {
    leader: RwLock<HashMap<String, Versioned>>,
    replica: Shared,
    next_version: AtomicU64,
    lag: Duration,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[derive(Clone)]
pub struct ConsistencyStore(Arc<Inner>);

impl ConsistencyStore {
    pub fn new(lag: Duration) -> Self {
        Self(Arc::new(Inner {
            leader: RwLock::default(),
            replica: Shared::default(),
            next_version: AtomicU64::new(0),
            lag,
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }))
    }

    /// Writes `value` to the leader and schedules the replica update.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn write<K: Into<String>>(&self, key: K, value: Value) -> Result<()> {
        let key = key.into();
        check_key(&key)?;

        let version = {
            let mut leader = self.0.leader.write();
            // assigned under the leader lock so versions follow leader order
            let version = self.0.next_version.fetch_add(1, Ordering::Relaxed) + 1;

            leader.insert(
                key.to_owned(),
                Versioned {
                    version,
                    value: value.clone(),
                },
            );

            version
        };

        let replica = self.0.replica.clone();
        let cancel = self.0.cancel.clone();
        let lag = self.0.lag;

        self.0.tracker.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("replication of {key}@{version} cancelled");
                }
                _ = sleep(lag) => {
                    let mut replica = replica.write();

                    if replica.get(&key).is_some_and(|current| current.version > version) {
                        debug!("replication of {key}@{version} superseded");
                    } else {
                        replica.insert(key, Versioned { version, value });
                    }
                }
            }
        });

        Ok(())
    }

    pub fn read(&self, key: &str, mode: ReadMode) -> Result<Option<Value>> {
        check_key(key)?;

        let value = match mode {
            ReadMode::Strong => self.0.leader.read().get(key).map(|v| v.value.clone()),
            ReadMode::Eventual => self.0.replica.read().get(key).map(|v| v.value.clone()),
        };

        Ok(value)
    }

    /// Number of replica updates that have not landed yet.
    pub fn pending_replications(&self) -> usize {
        self.0.tracker.len()
    }

    /// Cancels pending replica updates and waits for their tasks to finish.
    pub async fn shutdown(&self) {
        debug!(
            "cancelling {} pending replications",
            self.pending_replications()
        );

        self.0.cancel.cancel();
        self.0.tracker.close();
        self.0.tracker.wait().await;
    }
}

fn check_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(Error::InvalidInput("missing key".to_owned()));
    }

    Ok(())
}
