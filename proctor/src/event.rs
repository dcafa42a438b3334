use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::Result;

/// Free-form event record pushed to live monitors.
///
/// The payload is frozen behind an `Arc` once built, so fan-out to many
/// subscribers clones a pointer, not the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Arc<Map<String, Value>>);

impl Event {
    pub fn new<K: Into<String>>(kind: K) -> Self {
        let mut fields = Map::new();
        fields.insert("type".to_owned(), Value::String(kind.into()));

        Self(Arc::new(fields))
    }

    pub fn field<K: Into<String>, V: Serialize>(mut self, key: K, value: V) -> Result<Self> {
        let value = serde_json::to_value(value)?;
        Arc::make_mut(&mut self.0).insert(key.into(), value);

        Ok(self)
    }

    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn builder_keeps_type_and_fields() {
        let event = Event::new("exam_start")
            .field("student_id", 7)
            .unwrap()
            .field("meta", json!({"tab": "hidden"}))
            .unwrap();

        assert_eq!(event.kind(), Some("exam_start"));
        assert_eq!(event.get("student_id"), Some(&json!(7)));
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "exam_start", "student_id": 7, "meta": {"tab": "hidden"}})
        );
    }
}
