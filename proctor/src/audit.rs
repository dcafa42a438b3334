use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dyn_clone::DynClone;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr, sync::Arc};
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "teacher" => Ok(Self::Teacher),
            "student" => Ok(Self::Student),
            other => Err(Error::InvalidInput(format!("unknown role {other}"))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => f.write_str("admin"),
            Self::Teacher => f.write_str("teacher"),
            Self::Student => f.write_str("student"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub who_user_id: Option<i64>,
    pub username: Option<String>,
    pub role: Role,
    pub event_type: String,
    pub meta: Value,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new<E: Into<String>>(role: Role, event_type: E) -> Self {
        Self {
            id: Uuid::new_v4(),
            who_user_id: None,
            username: None,
            role,
            event_type: event_type.into(),
            meta: Value::Object(Default::default()),
            created_at: Utc::now(),
        }
    }

    pub fn who(mut self, user_id: Option<i64>, username: Option<String>) -> Self {
        self.who_user_id = user_id;
        self.username = username;
        self
    }

    pub fn meta<M: Serialize>(mut self, value: M) -> Result<Self> {
        self.meta = serde_json::to_value(value)?;

        Ok(self)
    }
}

/// Append-only journal of user actions, backed by the platform's relational store.
#[async_trait]
pub trait AuditLog: DynClone + Send + Sync {
    async fn record(&self, entry: AuditEntry) -> Result<()>;

    /// Most recent entries first.
    async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>>;

    /// Most recent entries of one `event_type` first.
    async fn recent_of(&self, event_type: &str, limit: usize) -> Result<Vec<AuditEntry>>;
}

dyn_clone::clone_trait_object!(AuditLog);

#[derive(Debug, Clone, Default)]
pub struct MemoryAudit(Arc<RwLock<Vec<AuditEntry>>>);

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditLog for MemoryAudit {
    async fn record(&self, entry: AuditEntry) -> Result<()> {
        self.0.write().push(entry);

        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        Ok(self.0.read().iter().rev().take(limit).cloned().collect())
    }

    async fn recent_of(&self, event_type: &str, limit: usize) -> Result<Vec<AuditEntry>> {
        Ok(self
            .0
            .read()
            .iter()
            .rev()
            .filter(|entry| entry.event_type == event_type)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn memory_audit_returns_newest_first() {
        let audit = MemoryAudit::new();

        for event_type in ["consistency_write", "consistency_read", "lb_backup"] {
            audit
                .record(
                    AuditEntry::new(Role::Teacher, event_type)
                        .who(Some(1), Some("grace".to_owned()))
                        .meta(json!({"key": "x"}))
                        .unwrap(),
                )
                .await
                .unwrap();
        }

        let recent = audit.recent(2).await.unwrap();

        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].event_type, "lb_backup");
        assert_eq!(recent[1].event_type, "consistency_read");
        assert_eq!(recent[0].username.as_deref(), Some("grace"));
    }

    #[tokio::test]
    async fn recent_of_filters_by_event_type() {
        let audit = MemoryAudit::new();

        for (event_type, exam_id) in [
            ("cheating_detected", 1),
            ("submit_exam", 1),
            ("cheating_detected", 2),
            ("cheating_detected", 3),
        ] {
            audit
                .record(
                    AuditEntry::new(Role::Student, event_type)
                        .meta(json!({"exam_id": exam_id}))
                        .unwrap(),
                )
                .await
                .unwrap();
        }

        let recent = audit.recent_of("cheating_detected", 2).await.unwrap();

        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].meta, json!({"exam_id": 3}));
        assert_eq!(recent[1].meta, json!({"exam_id": 2}));
        assert!(audit.recent_of("lb_error", 10).await.unwrap().is_empty());
    }

    #[test]
    fn role_parsing() {
        assert_eq!("Teacher".parse::<Role>().unwrap(), Role::Teacher);
        assert!("janitor".parse::<Role>().is_err());
    }
}
