//! Tests for leak detection

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use floodgate_core::{session_key, FloodgateError, Result, Session};

use super::detector::{LeakDetector, ReclaimLeaked};

struct IdleSession {
    closed: AtomicBool,
}

impl IdleSession {
    fn new() -> Arc<dyn Session> {
        Arc::new(Self {
            closed: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl Session for IdleSession {
    async fn is_alive(&self, _timeout: Duration) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Handler that records reclaimed sessions and can fail on demand.
struct RecordingHandler {
    reclaimed: Mutex<Vec<usize>>,
    fail_for: Mutex<Option<usize>>,
}

impl RecordingHandler {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            reclaimed: Mutex::new(Vec::new()),
            fail_for: Mutex::new(None),
        })
    }

    fn reclaimed(&self) -> Vec<usize> {
        self.reclaimed.lock().clone()
    }
}

#[async_trait]
impl ReclaimLeaked for RecordingHandler {
    async fn reclaim_leaked(&self, session: Arc<dyn Session>) -> Result<()> {
        let key = session_key(&session);
        self.reclaimed.lock().push(key);
        if *self.fail_for.lock() == Some(key) {
            return Err(FloodgateError::Backend("close refused".into()));
        }
        Ok(())
    }
}

fn detector(threshold: Duration, handler: &Arc<RecordingHandler>) -> LeakDetector {
    let weak: Weak<RecordingHandler> = Arc::downgrade(handler);
    LeakDetector::new(threshold, weak)
}

#[tokio::test]
async fn register_and_deregister_track_membership() {
    let handler = RecordingHandler::new();
    let detector = detector(Duration::from_secs(60), &handler);
    let session = IdleSession::new();

    assert!(!detector.is_registered(&session));
    detector.register(&session);
    assert!(detector.is_registered(&session));
    assert_eq!(detector.tracked_count(), 1);

    detector.deregister(&session);
    assert!(!detector.is_registered(&session));

    // deregistering an untracked session is a no-op
    detector.deregister(&session);
    assert_eq!(detector.tracked_count(), 0);
}

#[tokio::test]
async fn scan_leaves_fresh_sessions_alone() {
    let handler = RecordingHandler::new();
    let detector = detector(Duration::from_secs(60), &handler);
    let session = IdleSession::new();
    detector.register(&session);

    detector.scan().await;

    assert!(handler.reclaimed().is_empty());
    assert!(detector.is_registered(&session));
}

#[tokio::test]
async fn scan_reclaims_sessions_held_past_the_threshold() {
    let handler = RecordingHandler::new();
    let detector = detector(Duration::from_millis(1), &handler);
    let session = IdleSession::new();
    detector.register(&session);

    tokio::time::sleep(Duration::from_millis(10)).await;
    detector.scan().await;

    assert_eq!(handler.reclaimed(), vec![session_key(&session)]);
    assert!(!detector.is_registered(&session));
}

#[tokio::test]
async fn scan_reclaims_only_the_overdue_sessions() {
    let handler = RecordingHandler::new();
    let detector = detector(Duration::from_millis(20), &handler);

    let overdue = IdleSession::new();
    detector.register(&overdue);
    tokio::time::sleep(Duration::from_millis(40)).await;
    let fresh = IdleSession::new();
    detector.register(&fresh);

    detector.scan().await;

    assert_eq!(handler.reclaimed(), vec![session_key(&overdue)]);
    assert!(detector.is_registered(&fresh));
    assert!(!detector.is_registered(&overdue));
}

#[tokio::test]
async fn a_failing_reclaim_does_not_skip_the_others() {
    let handler = RecordingHandler::new();
    let detector = detector(Duration::from_millis(1), &handler);

    let first = IdleSession::new();
    let second = IdleSession::new();
    detector.register(&first);
    detector.register(&second);
    *handler.fail_for.lock() = Some(session_key(&first));

    tokio::time::sleep(Duration::from_millis(10)).await;
    detector.scan().await;

    let reclaimed = handler.reclaimed();
    assert_eq!(reclaimed.len(), 2, "both sessions should be visited");
    assert_eq!(detector.tracked_count(), 0, "both should be culled");
}

#[tokio::test]
async fn scan_is_a_noop_once_the_handler_is_gone() {
    let handler = RecordingHandler::new();
    let detector = detector(Duration::from_millis(1), &handler);
    let session = IdleSession::new();
    detector.register(&session);
    drop(handler);

    tokio::time::sleep(Duration::from_millis(10)).await;
    detector.scan().await;

    // nothing was reclaimed and tracking is untouched
    assert!(detector.is_registered(&session));
}
