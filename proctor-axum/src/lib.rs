#![forbid(unsafe_code)]

mod error;
mod extract;
mod identity;
mod monitor;
mod student;
mod teacher;

pub use error::*;
pub use identity::*;

use axum::{
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use proctor::{AuditLog, Broadcaster, ConsistencyStore, Dispatcher, MemoryAudit, ProctorConfig};
use serde_json::{json, Value};
use std::time::Duration;

/// Handles shared by every route. Producers and consumers reach the core only through these.
#[derive(Clone)]
pub struct AppState {
    pub broadcaster: Broadcaster,
    pub dispatcher: Dispatcher,
    pub store: ConsistencyStore,
    pub audit: Box<dyn AuditLog>,
    pub keep_alive: Duration,
}

impl AppState {
    pub fn new(config: &ProctorConfig) -> proctor::Result<Self> {
        Ok(Self {
            broadcaster: Broadcaster::new(),
            dispatcher: Dispatcher::simulated(config.primary_failure_ratio)?,
            store: ConsistencyStore::new(config.replica_lag),
            audit: Box::new(MemoryAudit::new()),
            keep_alive: config.keep_alive,
        })
    }

    pub fn audit<A: AuditLog + 'static>(mut self, audit: A) -> Self {
        self.audit = Box::new(audit);
        self
    }

    pub fn dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/server_time", get(server_time))
        .route("/api/student/event", post(student::event))
        .route("/api/student/submit_exam", post(student::submit_exam))
        .route("/api/teacher/monitor_stream", get(monitor::stream))
        .route("/api/teacher/ricart_agarwala", post(teacher::ricart_agarwala))
        .route("/api/teacher/lb_process", post(teacher::lb_process))
        .route("/api/teacher/consistency_write", post(teacher::consistency_write))
        .route("/api/teacher/consistency_read", get(teacher::consistency_read))
        .route("/api/teacher/cheating_logs", get(teacher::cheating_logs))
        .with_state(state)
}

async fn server_time() -> Json<Value> {
    Json(json!({
        "ok": true,
        "server_time_utc": Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
    }))
}
