//! Ricart–Agrawala critical-section ordering, without the message exchange.
//!
//! Requests are totally ordered by `(timestamp, node_id)`; each request then
//! enters and leaves the critical section in turn.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutexRequest {
    pub node_id: i64,
    pub timestamp: i64,
}

impl MutexRequest {
    pub fn new(node_id: i64, timestamp: i64) -> Self {
        Self { node_id, timestamp }
    }

    /// Parses a list of `{ "node_id": .., "timestamp": .. }` objects, failing
    /// on the first malformed entry.
    pub fn parse_all(values: &[Value]) -> Result<Vec<Self>> {
        values.iter().map(Self::try_from).collect()
    }
}

impl TryFrom<&Value> for MutexRequest {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self> {
        Ok(Self {
            node_id: int_field(value, "node_id")?,
            timestamp: int_field(value, "timestamp")?,
        })
    }
}

fn int_field(value: &Value, name: &str) -> Result<i64> {
    let field = value
        .get(name)
        .ok_or_else(|| Error::InvalidInput(format!("missing {name}")))?;

    let parsed = match field {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| Error::InvalidInput(format!("{name} must be an integer, got {field}")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsPhase {
    EnterCs,
    ExitCs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsEntry {
    pub event: CsPhase,
    pub node: i64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub order: Vec<i64>,
    pub log: Vec<CsEntry>,
}

/// Computes the order in which `requests` are granted the critical section.
pub fn simulate(requests: &[MutexRequest]) -> Schedule {
    let mut ordered = requests.to_vec();
    // stable: equal (timestamp, node) pairs keep input order
    ordered.sort_by_key(|r| (r.timestamp, r.node_id));

    let mut schedule = Schedule {
        order: Vec::with_capacity(ordered.len()),
        log: Vec::with_capacity(ordered.len() * 2),
    };

    for request in ordered {
        schedule.order.push(request.node_id);

        for event in [CsPhase::EnterCs, CsPhase::ExitCs] {
            schedule.log.push(CsEntry {
                event,
                node: request.node_id,
                timestamp: request.timestamp,
            });
        }
    }

    schedule
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn orders_by_timestamp_then_node() {
        let schedule = simulate(&[
            MutexRequest::new(2, 5),
            MutexRequest::new(1, 5),
            MutexRequest::new(3, 1),
        ]);

        assert_eq!(schedule.order, vec![3, 1, 2]);

        let expected = [(3, 1), (1, 5), (2, 5)]
            .into_iter()
            .flat_map(|(node, timestamp)| {
                [CsPhase::EnterCs, CsPhase::ExitCs].map(|event| CsEntry {
                    event,
                    node,
                    timestamp,
                })
            })
            .collect::<Vec<_>>();

        assert_eq!(schedule.log, expected);
    }

    #[test]
    fn empty_input() {
        assert_eq!(simulate(&[]), Schedule::default());
    }

    #[test]
    fn duplicates_are_kept() {
        let schedule = simulate(&[
            MutexRequest::new(4, 2),
            MutexRequest::new(4, 2),
            MutexRequest::new(1, 9),
        ]);

        assert_eq!(schedule.order, vec![4, 4, 1]);
        assert_eq!(schedule.log.len(), 6);
    }

    #[test]
    fn result_is_sorted_for_arbitrary_input() {
        let requests = (0..50)
            .map(|i| MutexRequest::new((i * 7) % 5, (i * 13) % 11))
            .collect::<Vec<_>>();

        let schedule = simulate(&requests);
        let mut seen = requests.clone();
        seen.sort_by_key(|r| (r.timestamp, r.node_id));

        assert_eq!(
            schedule.order,
            seen.iter().map(|r| r.node_id).collect::<Vec<_>>()
        );

        for pair in seen.windows(2) {
            assert!(
                pair[0].timestamp < pair[1].timestamp
                    || (pair[0].timestamp == pair[1].timestamp && pair[0].node_id <= pair[1].node_id)
            );
        }
    }

    #[test]
    fn log_serializes_like_the_api() {
        let schedule = simulate(&[MutexRequest::new(1, 3)]);

        assert_eq!(
            serde_json::to_value(&schedule.log).unwrap(),
            json!([
                {"event": "enter_cs", "node": 1, "timestamp": 3},
                {"event": "exit_cs", "node": 1, "timestamp": 3},
            ])
        );
    }

    #[test]
    fn parse_accepts_numbers_and_numeric_strings() {
        let requests = MutexRequest::parse_all(&[
            json!({"node_id": 1, "timestamp": "4"}),
            json!({"node_id": " 2 ", "timestamp": 3}),
        ])
        .unwrap();

        assert_eq!(
            requests,
            vec![MutexRequest::new(1, 4), MutexRequest::new(2, 3)]
        );
    }

    #[test]
    fn parse_rejects_malformed_entries() {
        for bad in [
            json!({"node_id": 1}),
            json!({"node_id": "one", "timestamp": 1}),
            json!({"node_id": 1.5, "timestamp": 1}),
            json!([1, 2]),
        ] {
            assert!(matches!(
                MutexRequest::parse_all(&[bad]),
                Err(Error::InvalidInput(_))
            ));
        }
    }
}
