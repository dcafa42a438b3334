use std::time::Duration;

use proctor::{ConsistencyStore, Error, ReadMode};
use serde_json::json;
use tokio::time::sleep;
use tracing_test::traced_test;

const LAG: Duration = Duration::from_millis(100);

#[tokio_shared_rt::test]
#[traced_test]
async fn strong_read_sees_write_immediately_eventual_after_lag() {
    let store = ConsistencyStore::new(LAG);
    store.write("x", json!("a")).unwrap();

    assert_eq!(store.read("x", ReadMode::Strong).unwrap(), Some(json!("a")));
    assert_eq!(store.read("x", ReadMode::Eventual).unwrap(), None);

    sleep(LAG * 3).await;

    assert_eq!(store.read("x", ReadMode::Eventual).unwrap(), Some(json!("a")));
    assert_eq!(store.pending_replications(), 0);
}

#[tokio_shared_rt::test]
#[traced_test]
async fn eventual_read_can_be_stale() {
    let store = ConsistencyStore::new(LAG);
    store.write("x", json!(1)).unwrap();
    sleep(LAG * 3).await;

    store.write("x", json!(2)).unwrap();

    assert_eq!(store.read("x", ReadMode::Strong).unwrap(), Some(json!(2)));
    assert_eq!(store.read("x", ReadMode::Eventual).unwrap(), Some(json!(1)));

    sleep(LAG * 3).await;
    assert_eq!(store.read("x", ReadMode::Eventual).unwrap(), Some(json!(2)));
}

#[tokio_shared_rt::test]
#[traced_test]
async fn last_write_wins_on_both_copies() {
    let store = ConsistencyStore::new(LAG);

    for value in ["a", "b", "c", "d"] {
        store.write("k", json!(value)).unwrap();
    }

    assert_eq!(store.read("k", ReadMode::Strong).unwrap(), Some(json!("d")));

    sleep(LAG * 3).await;

    assert_eq!(store.read("k", ReadMode::Eventual).unwrap(), Some(json!("d")));
    assert_eq!(store.read("k", ReadMode::Strong).unwrap(), Some(json!("d")));
}

#[tokio_shared_rt::test]
#[traced_test]
async fn shutdown_cancels_pending_replications() {
    let store = ConsistencyStore::new(Duration::from_secs(60));
    store.write("x", json!("a")).unwrap();
    store.write("y", json!("b")).unwrap();
    assert_eq!(store.pending_replications(), 2);

    store.shutdown().await;

    assert_eq!(store.pending_replications(), 0);
    assert_eq!(store.read("x", ReadMode::Eventual).unwrap(), None);
    assert_eq!(store.read("x", ReadMode::Strong).unwrap(), Some(json!("a")));
    assert!(logs_contain("cancelling 2 pending replications"));
}

#[tokio_shared_rt::test]
#[traced_test]
async fn blank_keys_are_rejected_before_any_write() {
    let store = ConsistencyStore::new(LAG);

    assert!(matches!(
        store.write("  ", json!(1)),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        store.read("", ReadMode::Strong),
        Err(Error::InvalidInput(_))
    ));
    assert_eq!(store.pending_replications(), 0);
}

#[test]
fn read_mode_parsing() {
    assert_eq!("strong".parse::<ReadMode>().unwrap(), ReadMode::Strong);
    assert_eq!("eventual".parse::<ReadMode>().unwrap(), ReadMode::Eventual);
    assert!("linearizable".parse::<ReadMode>().is_err());
    assert_eq!(ReadMode::Eventual.to_string(), "eventual");
}
