//! Session store integration tests.
//!
//! End-to-end behavior through the public API: expiry, overwrite,
//! reclamation, and recovery from the durable snapshot across restarts.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use outcome_sessions::{DurableLog, SessionEntry, SessionStore, StoreConfig};
use tempfile::TempDir;

fn config(dir: &TempDir) -> StoreConfig {
    StoreConfig::new(dir.path().join("sessions.log"))
}

// ============================================================================
// Liveness Scenarios
// ============================================================================

#[tokio::test]
async fn test_session_expires_after_ttl() {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::open(config(&dir));

    store.create("s1", Duration::from_millis(100), "user=alice");
    assert!(store.validate_session("s1"));

    tokio::time::sleep(Duration::from_millis(150)).await;

    assert!(!store.validate_session("s1"));
    assert_eq!(store.get_session_data("s1"), (String::new(), false));
}

#[test]
fn test_overwrite_keeps_latest_payload() {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::open(config(&dir));

    store.create("s2", Duration::from_secs(3600), "user=bob");
    store.create("s2", Duration::from_secs(3600), "user=carol");

    assert_eq!(
        store.get_session_data("s2"),
        ("user=carol".to_string(), true)
    );
}

#[test]
fn test_expiry_boundary() {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::open(config(&dir));

    let expiry = store.create("edge", Duration::from_secs(3600), "x");
    let entry = SessionEntry::new("edge", expiry, "x");

    assert!(entry.is_live(expiry - TimeDelta::milliseconds(1)));
    assert!(!entry.is_live(expiry));
    assert!(!entry.is_live(expiry + TimeDelta::milliseconds(1)));

    // Coarse end-to-end check on both sides of the boundary
    assert!(store.validate_session("edge"));
    store.create("gone", Duration::ZERO, "x");
    assert!(!store.validate_session("gone"));
}

#[test]
fn test_remove_twice_never_fails() {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::open(config(&dir));

    store.create("s3", Duration::from_secs(60), "user=dave");
    store.remove_session("s3");
    store.remove_session("s3");
    store.remove_session("ghost");

    assert!(!store.validate_session("s3"));
    assert_eq!(store.get_session_data("s3"), (String::new(), false));
}

// ============================================================================
// Reclamation
// ============================================================================

#[tokio::test]
async fn test_reclaimer_converges_without_reads() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SessionStore::open(
        config(&dir).with_reclaim_interval(Duration::from_millis(50)),
    ));
    let reclaimer = store.spawn_reclaimer();

    for i in 0..10 {
        store.create(format!("tmp-{i}"), Duration::from_millis(20), "x");
    }
    store.create("keep", Duration::from_secs(3600), "user=erin");

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(store.len(), 1);
    assert!(store.contains_entry("keep"));

    reclaimer.shutdown().await;

    // The sweep persisted, so a restart sees only the live entry
    let reopened = SessionStore::open(config(&dir));
    assert_eq!(reopened.len(), 1);
}

// ============================================================================
// Recovery
// ============================================================================

#[test]
fn test_recovery_round_trip() {
    let dir = TempDir::new().unwrap();

    {
        let store = SessionStore::open(config(&dir));
        for i in 0..20 {
            store.create(
                format!("sess-{i}"),
                Duration::from_secs(3600),
                format!("user=u{i} role=student"),
            );
        }
    }

    let store = SessionStore::open(config(&dir));
    assert_eq!(store.len(), 20);
    for i in 0..20 {
        assert_eq!(
            store.get_session_data(&format!("sess-{i}")),
            (format!("user=u{i} role=student"), true)
        );
    }
}

#[test]
fn test_recovery_with_mixed_liveness() {
    let dir = TempDir::new().unwrap();
    let now = Utc::now();
    let entries = vec![
        SessionEntry::new("live", now + TimeDelta::hours(1), "user=alice"),
        SessionEntry::new("stale", now - TimeDelta::minutes(5), "user=bob"),
    ];
    DurableLog::new(dir.path().join("sessions.log"))
        .write_snapshot(&entries)
        .unwrap();

    let store = SessionStore::open(config(&dir));

    // Both are loaded, only one is readable
    assert_eq!(store.len(), 2);
    assert_eq!(store.live_count(), 1);
    assert_eq!(
        store.get_session_data("live"),
        ("user=alice".to_string(), true)
    );
    assert!(!store.validate_session("stale"));

    assert_eq!(store.reclaim_expired(), 1);
    assert!(!store.contains_entry("stale"));
}

#[test]
fn test_recovery_after_remove() {
    let dir = TempDir::new().unwrap();

    {
        let store = SessionStore::open(config(&dir));
        store.create("a", Duration::from_secs(60), "1");
        store.create("b", Duration::from_secs(60), "2");
        store.remove_session("a");
    }

    let store = SessionStore::open(config(&dir));
    assert!(!store.validate_session("a"));
    assert!(store.validate_session("b"));
}

#[test]
fn test_recovery_skips_malformed_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sessions.log");
    let good = SessionEntry::new("ok", Utc::now() + TimeDelta::hours(1), "user=frank");
    fs::write(
        &path,
        format!("broken-line\n{}\nx not-a-timestamp y\n", good.to_line()),
    )
    .unwrap();

    let store = SessionStore::open(config(&dir));

    assert_eq!(store.len(), 1);
    assert_eq!(
        store.get_session_data("ok"),
        ("user=frank".to_string(), true)
    );
}

#[test]
fn test_missing_log_starts_empty() {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::open(StoreConfig::new(dir.path().join("nested/absent.log")));

    assert!(store.is_empty());

    store.create("first", Duration::from_secs(60), "x");
    assert!(dir.path().join("nested/absent.log").exists());
}

#[test]
fn test_payload_with_whitespace_survives_restart() {
    let dir = TempDir::new().unwrap();
    let payload = "{\"name\": \"Grace Hopper\",\n \"roles\": [\"lecturer\"]}";

    SessionStore::open(config(&dir)).create("json", Duration::from_secs(60), payload);

    let store = SessionStore::open(config(&dir));
    assert_eq!(store.session_data("json").as_deref(), Some(payload));
}

#[test]
fn test_recovery_survives_undecodable_bytes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sessions.log");
    let expiry = Utc::now() + TimeDelta::hours(1);
    let before = SessionEntry::new("ok", expiry, "user=gina");
    let after = SessionEntry::new("ok2", expiry, "user=hal");

    let mut contents = format!("{}\n", before.to_line()).into_bytes();
    contents.extend_from_slice(b"bad \xff\xfe garbage\n");
    contents.extend_from_slice(format!("{}\n", after.to_line()).as_bytes());
    fs::write(&path, contents).unwrap();

    let store = SessionStore::open(config(&dir));

    assert_eq!(store.len(), 2);
    assert!(store.validate_session("ok"));
    assert!(store.validate_session("ok2"));
}
