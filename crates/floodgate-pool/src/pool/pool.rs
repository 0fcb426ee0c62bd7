//! Pool manager implementation

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::Mutex as AsyncMutex;

use floodgate_core::{session_key, FloodgateError, Result, Session};

use crate::factory::SessionFactory;
use crate::leak::{LeakDetector, ReclaimLeaked};
use crate::scheduler::{Scheduler, TokioScheduler};
use crate::settings::PoolSettings;

use super::queue::FreeQueue;
use super::stats::PoolStats;

/// An elastic pool of database sessions.
///
/// Borrowers call [`acquire`](Pool::acquire) and hand the session back
/// with [`release`](Pool::release). Capacity moves between the settings'
/// baseline and maximum: the pool grows when the active/capacity ratio
/// crosses the high-load threshold and shrinks, after a run of low-load
/// observations, on release. An empty free queue is topped up with
/// freshly opened sessions before the borrower starts waiting.
///
/// All observers identify sessions by handle; see the `Session` trait
/// docs for the no-rewrapping requirement.
pub struct Pool {
    settings: Arc<dyn PoolSettings>,
    factory: Arc<dyn SessionFactory>,
    capacity: AtomicUsize,
    free: RwLock<Arc<FreeQueue>>,
    active: RwLock<HashMap<usize, Arc<dyn Session>>>,
    active_count: AtomicUsize,
    low_load_streak: AtomicU32,
    leak_armed: AtomicBool,
    closed: AtomicBool,
    /// Serializes grow, top-up, and shrink. Never held while a borrower
    /// waits on the free queue.
    sizing: AsyncMutex<()>,
    detector: Arc<LeakDetector>,
    scheduler: Arc<dyn Scheduler>,
}

impl Pool {
    /// Create a pool with the Tokio-backed leak-scan scheduler.
    pub async fn new(
        settings: Arc<dyn PoolSettings>,
        factory: Arc<dyn SessionFactory>,
    ) -> Result<Arc<Self>> {
        Self::with_scheduler(settings, factory, Arc::new(TokioScheduler::new())).await
    }

    /// Create a pool with a caller-supplied scheduler.
    pub async fn with_scheduler(
        settings: Arc<dyn PoolSettings>,
        factory: Arc<dyn SessionFactory>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<Arc<Self>> {
        crate::settings::validate(settings.as_ref())?;

        let capacity = settings.baseline_capacity();
        let leak_threshold = settings.leak_threshold();
        let pool = Arc::new_cyclic(|weak: &Weak<Pool>| {
            let handler: Weak<dyn ReclaimLeaked> = weak.clone();
            Pool {
                detector: Arc::new(LeakDetector::new(leak_threshold, handler)),
                capacity: AtomicUsize::new(capacity),
                free: RwLock::new(Arc::new(FreeQueue::new(capacity))),
                active: RwLock::new(HashMap::new()),
                active_count: AtomicUsize::new(0),
                low_load_streak: AtomicU32::new(0),
                leak_armed: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                sizing: AsyncMutex::new(()),
                settings,
                factory,
                scheduler,
            }
        });

        let fill = pool.settings.initial_fill().min(capacity);
        pool.fill_free(fill).await?;
        tracing::info!(capacity, initial_fill = fill, "session pool ready");
        Ok(pool)
    }

    /// Borrow a validated session.
    ///
    /// On success the session is in the active set, registered with the
    /// leak detector, and the periodic leak scan is armed. Fails with
    /// [`AcquireTimeout`](FloodgateError::AcquireTimeout) when no session
    /// becomes available in time, [`Backend`](FloodgateError::Backend)
    /// when opening a needed session fails, or
    /// [`PoolClosed`](FloodgateError::PoolClosed) after shutdown.
    pub async fn acquire(&self) -> Result<Arc<dyn Session>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(FloodgateError::PoolClosed);
        }

        if self.load_ratio() > self.settings.high_load_ratio() {
            self.handle_high_load().await;
        }
        if self.free_queue().is_empty() {
            self.top_up().await?;
        }

        let timeout = self.settings.acquire_timeout();
        let queue = self.free_queue();
        let session = match queue.poll(timeout).await {
            Some(session) => session,
            None if queue.is_closed() => return Err(FloodgateError::PoolClosed),
            None => return Err(FloodgateError::AcquireTimeout(timeout)),
        };
        let session = self.validate_for_handout(session).await?;

        self.detector.register(&session);
        self.arm_leak_scan();
        self.active_count.fetch_add(1, Ordering::SeqCst);
        self.active
            .write()
            .insert(session_key(&session), session.clone());
        Ok(session)
    }

    /// Return a borrowed session.
    ///
    /// A session that is still alive goes back on the free queue (or is
    /// closed when the queue is full); a dead one is closed and not
    /// replaced. Either way the session leaves the active set and the
    /// leak detector, and the shrink policy gets a look at the load.
    pub async fn release(&self, session: Arc<dyn Session>) {
        let was_active = self
            .active
            .write()
            .remove(&session_key(&session))
            .is_some();

        if session.is_alive(self.settings.validation_timeout()).await {
            if !self.free_queue().offer(session.clone()) {
                tracing::debug!("free queue is full, closing returned session");
                self.close_session(&session).await;
            }
        } else {
            tracing::debug!("session failed validation on return, closing");
            self.close_session(&session).await;
        }

        if was_active {
            self.active_count.fetch_sub(1, Ordering::SeqCst);
        }
        self.detector.deregister(&session);
        self.handle_low_load().await;
    }

    /// Forcibly take back a leaked session.
    ///
    /// Invoked by the leak detector. Closes the session and clears it
    /// from the active set; the free queue, capacity, and shrink
    /// hysteresis are untouched, and the sizing lock is never taken.
    pub async fn reclaim_leaked(&self, session: Arc<dyn Session>) -> Result<()> {
        let was_active = self
            .active
            .write()
            .remove(&session_key(&session))
            .is_some();
        let outcome = session.close().await;
        if was_active {
            self.active_count.fetch_sub(1, Ordering::SeqCst);
        }
        outcome
    }

    /// Number of idle sessions in the free queue.
    pub fn free_count(&self) -> usize {
        self.free_queue().len()
    }

    /// Number of sessions currently held by borrowers.
    pub fn active_count(&self) -> usize {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Current capacity bound.
    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::SeqCst)
    }

    /// Whether `session` was handed out by this pool and not yet returned.
    pub fn is_active(&self, session: &Arc<dyn Session>) -> bool {
        self.active.read().contains_key(&session_key(session))
    }

    /// Whether the periodic leak scan has been armed.
    pub fn is_leak_scan_armed(&self) -> bool {
        self.leak_armed.load(Ordering::SeqCst)
    }

    /// Point-in-time snapshot of the pool's state.
    pub fn stats(&self) -> PoolStats {
        PoolStats::new(
            self.capacity(),
            self.free_count(),
            self.active_count(),
            self.low_load_streak.load(Ordering::SeqCst),
        )
    }

    /// Shut the pool down: stop the leak scan, wake parked borrowers,
    /// and close every idle session. Idempotent. Sessions still out with
    /// borrowers are closed as they come back through `release`.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.scheduler.shutdown();
        let queue = self.free_queue();
        queue.close();
        for session in queue.drain_all() {
            self.close_session(&session).await;
        }
        tracing::info!("session pool shut down");
    }

    fn free_queue(&self) -> Arc<FreeQueue> {
        self.free.read().clone()
    }

    fn load_ratio(&self) -> f64 {
        let capacity = self.capacity.load(Ordering::SeqCst);
        if capacity == 0 {
            return 0.0;
        }
        self.active_count.load(Ordering::SeqCst) as f64 / capacity as f64
    }

    /// Hand out `session` if it still answers the liveness probe,
    /// otherwise close it and open a replacement.
    async fn validate_for_handout(&self, session: Arc<dyn Session>) -> Result<Arc<dyn Session>> {
        if session.is_alive(self.settings.validation_timeout()).await {
            return Ok(session);
        }
        tracing::debug!("session failed validation at handout, replacing");
        // not registered yet on this path; deregister is a no-op then
        self.detector.deregister(&session);
        self.close_session(&session).await;
        self.factory.open().await
    }

    /// Raise the capacity ceiling when the load ratio is over the
    /// high-load threshold. Never opens sessions; an empty pool still
    /// needs a top-up afterwards.
    async fn handle_high_load(&self) {
        let _guard = self.sizing.lock().await;
        if self.load_ratio() <= self.settings.high_load_ratio() {
            return;
        }
        let capacity = self.capacity.load(Ordering::SeqCst);
        let max = self.settings.max_capacity();
        if capacity >= max {
            return;
        }
        let target = ((capacity as f64 * self.settings.grow_factor()) as usize).min(max);
        if target > capacity {
            self.capacity.store(target, Ordering::SeqCst);
            let overflow = self.swap_free(target);
            for session in overflow {
                self.close_session(&session).await;
            }
            tracing::info!(capacity = target, "session pool resized");
        }
    }

    /// Open a batch of fresh sessions into an empty free queue.
    async fn top_up(&self) -> Result<()> {
        let _guard = self.sizing.lock().await;
        let capacity = self.capacity.load(Ordering::SeqCst);
        let batch = ((capacity as f64 * self.settings.top_up_factor()) as usize)
            .min(self.settings.max_top_up())
            // a batch that rounds to zero would stall every borrower
            .max(1);
        tracing::info!(batch, "topping up the free queue");
        self.fill_free(batch).await
    }

    /// Evaluate the shrink policy after a release.
    async fn handle_low_load(&self) {
        let _guard = self.sizing.lock().await;
        let capacity = self.capacity.load(Ordering::SeqCst);
        let baseline = self.settings.baseline_capacity();
        if capacity == baseline {
            return;
        }

        let active = self.active_count.load(Ordering::SeqCst);
        let ratio = active as f64 / capacity as f64;
        if ratio >= self.settings.low_load_ratio() {
            self.low_load_streak.store(0, Ordering::SeqCst);
            return;
        }

        let streak = self.low_load_streak.fetch_add(1, Ordering::SeqCst) + 1;
        if streak >= self.settings.low_load_hysteresis() {
            let shrunk = (capacity as f64 * self.settings.shrink_factor()) as usize;
            let floor = baseline.max(active);
            // never below the baseline, even when the shrink factor
            // lands under it
            let target = floor.min(shrunk).max(baseline);
            self.shrink_to(target).await;
            self.low_load_streak.store(0, Ordering::SeqCst);
        }
    }

    /// Shrink the free queue to `new_capacity`, closing the overflow.
    async fn shrink_to(&self, new_capacity: usize) {
        self.capacity.store(new_capacity, Ordering::SeqCst);
        let queue = self.free_queue();
        while queue.len() > new_capacity {
            let Some(session) = queue.try_poll() else {
                break;
            };
            // a free session is never simultaneously active
            debug_assert!(!self.is_active(&session));
            self.close_session(&session).await;
        }
        let overflow = self.swap_free(new_capacity);
        for session in overflow {
            self.close_session(&session).await;
        }
        tracing::info!(capacity = new_capacity, "session pool resized");
    }

    /// Replace the free queue with one bounded at `new_capacity`,
    /// carrying the queued sessions over. Sessions that no longer fit
    /// (a release can slip in mid-swap) are returned for closing.
    fn swap_free(&self, new_capacity: usize) -> Vec<Arc<dyn Session>> {
        let replacement = Arc::new(FreeQueue::new(new_capacity));
        let mut overflow = Vec::new();
        for session in self.free_queue().drain_all() {
            if !replacement.offer(session.clone()) {
                overflow.push(session);
            }
        }
        *self.free.write() = replacement;
        overflow
    }

    /// Open up to `count` sessions into the free queue, stopping early
    /// when the queue reaches the capacity bound.
    async fn fill_free(&self, count: usize) -> Result<()> {
        for _ in 0..count {
            if self.free_queue().len() >= self.capacity.load(Ordering::SeqCst) {
                break;
            }
            let session = self.factory.open().await?;
            if !self.free_queue().offer(session.clone()) {
                self.close_session(&session).await;
                break;
            }
        }
        Ok(())
    }

    fn arm_leak_scan(&self) {
        if self
            .leak_armed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let interval = self.settings.leak_scan_interval();
            self.scheduler
                .schedule_periodic(self.detector.clone(), interval);
            tracing::debug!(?interval, "leak scan armed");
        }
    }

    async fn close_session(&self, session: &Arc<dyn Session>) {
        if let Err(error) = session.close().await {
            tracing::warn!(%error, "failed to close session");
        }
    }

    #[cfg(test)]
    pub(crate) fn detector(&self) -> &LeakDetector {
        &self.detector
    }

    #[cfg(test)]
    pub(crate) fn inject_idle(&self, session: Arc<dyn Session>) -> bool {
        self.free_queue().offer(session)
    }
}

#[async_trait]
impl ReclaimLeaked for Pool {
    async fn reclaim_leaked(&self, session: Arc<dyn Session>) -> Result<()> {
        Pool::reclaim_leaked(self, session).await
    }
}
