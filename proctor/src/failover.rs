//! Primary/backup request dispatch.
//!
//! The primary handler is allowed to fail; a failure is retried exactly once
//! on the backup. Only a double failure reaches the caller.

use async_trait::async_trait;
use dyn_clone::DynClone;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::error::{Error, Result};

#[async_trait]
pub trait Handler: DynClone + Send + Sync {
    async fn handle(&self, payload: Value) -> anyhow::Result<Value>;
}

dyn_clone::clone_trait_object!(Handler);

/// Primary that fails with `primary_overloaded` with probability `failure_ratio`.
#[derive(Debug, Clone, Copy)]
pub struct FlakyPrimary {
    failure_ratio: f64,
}

impl FlakyPrimary {
    pub fn new(failure_ratio: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&failure_ratio) {
            return Err(Error::InvalidInput(format!(
                "failure ratio {failure_ratio} is outside [0, 1]"
            )));
        }

        Ok(Self { failure_ratio })
    }

    pub fn failure_ratio(&self) -> f64 {
        self.failure_ratio
    }
}

#[async_trait]
impl Handler for FlakyPrimary {
    async fn handle(&self, payload: Value) -> anyhow::Result<Value> {
        if rand::thread_rng().gen_bool(self.failure_ratio) {
            anyhow::bail!("primary_overloaded");
        }

        Ok(json!({ "processor": "primary", "received": payload }))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Backup;

#[async_trait]
impl Handler for Backup {
    async fn handle(&self, payload: Value) -> anyhow::Result<Value> {
        Ok(json!({ "processor": "backup", "received": payload }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServedBy {
    Primary,
    Backup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dispatched {
    pub path: ServedBy,
    pub result: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_error: Option<String>,
}

#[derive(Clone)]
pub struct Dispatcher {
    primary: Box<dyn Handler>,
    backup: Box<dyn Handler>,
}

impl Dispatcher {
    pub fn new<P, B>(primary: P, backup: B) -> Self
    where
        P: Handler + 'static,
        B: Handler + 'static,
    {
        Self {
            primary: Box::new(primary),
            backup: Box::new(backup),
        }
    }

    /// Flaky primary with the given failure ratio, plain echo backup.
    pub fn simulated(failure_ratio: f64) -> Result<Self> {
        Ok(Self::new(FlakyPrimary::new(failure_ratio)?, Backup))
    }

    pub async fn dispatch(&self, payload: Value) -> Result<Dispatched> {
        let primary = match self.primary.handle(payload.clone()).await {
            Ok(result) => {
                debug!("primary served request");

                return Ok(Dispatched {
                    path: ServedBy::Primary,
                    result,
                    primary_error: None,
                });
            }
            Err(e) => e.to_string(),
        };

        warn!(
            "{}, failing over to backup",
            Error::PrimaryUnavailable(primary.to_owned())
        );

        match self.backup.handle(payload).await {
            Ok(result) => Ok(Dispatched {
                path: ServedBy::Backup,
                result,
                primary_error: Some(primary),
            }),
            Err(e) => {
                let err = Error::BothPathsFailed {
                    primary,
                    backup: e.to_string(),
                };

                error!("{err}");

                Err(err)
            }
        }
    }
}
