#![forbid(unsafe_code)]

pub mod audit;
pub mod broadcaster;
pub mod config;
pub mod consistency;
pub mod failover;
pub mod grading;
pub mod mutex;

mod error;
mod event;

pub use audit::{AuditEntry, AuditLog, MemoryAudit, Role};
pub use broadcaster::{Broadcaster, Subscription};
pub use config::{ConfigBuilder, ProctorConfig};
pub use consistency::{ConsistencyStore, ReadMode};
pub use error::*;
pub use event::Event;
pub use failover::{Backup, Dispatched, Dispatcher, FlakyPrimary, Handler, ServedBy};
pub use grading::{Graded, PenaltyTier, Submission};
pub use mutex::{CsEntry, CsPhase, MutexRequest, Schedule};
