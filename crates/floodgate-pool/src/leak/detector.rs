//! Leak detector implementation

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use floodgate_core::{session_key, Result, Session};

use crate::scheduler::PeriodicTask;

/// Reclaims a session the detector has judged leaked.
///
/// Implemented by the pool. The implementation must only touch the
/// active set and its counter; in particular it must not take the
/// pool's sizing lock, which may be held by a borrower while a scan
/// runs.
#[async_trait]
pub trait ReclaimLeaked: Send + Sync {
    async fn reclaim_leaked(&self, session: Arc<dyn Session>) -> Result<()>;
}

struct TrackedSession {
    session: Arc<dyn Session>,
    handed_out_at: Instant,
}

/// Tracks handed-out sessions and reclaims stragglers.
///
/// Holds a weak reference to its reclaim handler, so the detector never
/// keeps the pool alive on its own.
pub struct LeakDetector {
    threshold: Duration,
    outstanding: Mutex<HashMap<usize, TrackedSession>>,
    handler: Weak<dyn ReclaimLeaked>,
}

impl LeakDetector {
    pub fn new(threshold: Duration, handler: Weak<dyn ReclaimLeaked>) -> Self {
        Self {
            threshold,
            outstanding: Mutex::new(HashMap::new()),
            handler,
        }
    }

    /// Record the handout time for `session`.
    pub fn register(&self, session: &Arc<dyn Session>) {
        self.outstanding.lock().insert(
            session_key(session),
            TrackedSession {
                session: session.clone(),
                handed_out_at: Instant::now(),
            },
        );
    }

    /// Stop tracking `session`. No-op if it was never registered.
    pub fn deregister(&self, session: &Arc<dyn Session>) {
        self.outstanding.lock().remove(&session_key(session));
    }

    pub fn is_registered(&self, session: &Arc<dyn Session>) -> bool {
        self.outstanding.lock().contains_key(&session_key(session))
    }

    pub fn tracked_count(&self) -> usize {
        self.outstanding.lock().len()
    }

    /// Reclaim every tracked session held past the threshold.
    ///
    /// Works from a snapshot so registration and return can proceed
    /// while the scan runs. A failed reclaim is logged and the session
    /// is still dropped from tracking; the scan always continues to the
    /// remaining sessions.
    pub async fn scan(&self) {
        let Some(handler) = self.handler.upgrade() else {
            return;
        };

        let snapshot: Vec<(usize, Arc<dyn Session>, Instant)> = self
            .outstanding
            .lock()
            .iter()
            .map(|(key, tracked)| (*key, tracked.session.clone(), tracked.handed_out_at))
            .collect();

        let mut cull = Vec::new();
        for (key, session, handed_out_at) in snapshot {
            let age = handed_out_at.elapsed();
            if age <= self.threshold {
                continue;
            }
            tracing::warn!(
                ?age,
                threshold = ?self.threshold,
                "detected a leaked session, reclaiming"
            );
            if let Err(error) = handler.reclaim_leaked(session).await {
                tracing::warn!(%error, "failed to reclaim leaked session");
            }
            cull.push(key);
        }

        if !cull.is_empty() {
            let mut outstanding = self.outstanding.lock();
            for key in cull {
                outstanding.remove(&key);
            }
        }
    }
}

#[async_trait]
impl PeriodicTask for LeakDetector {
    async fn tick(&self) {
        self.scan().await;
    }
}
