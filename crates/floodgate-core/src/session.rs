//! Session trait and handle identity

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

/// An open database session.
///
/// The pool treats sessions as opaque handles: it only needs to probe
/// liveness before handing one out (or taking one back) and to close
/// sessions it discards. Drivers implement this trait over their native
/// connection type.
///
/// Session identity is the handle itself: two `Arc<dyn Session>` values
/// refer to the same session if and only if they share an allocation
/// (`Arc::ptr_eq`). Callers must not re-wrap a borrowed session in a new
/// allocation (for example a proxy) before passing it back to the pool's
/// observers, or the pool will no longer recognize it.
#[async_trait]
pub trait Session: Send + Sync {
    /// Probe whether the session is still usable.
    ///
    /// `timeout` bounds how long the probe itself may take.
    /// Implementations must report a failed or timed-out probe as `false`
    /// rather than surfacing an error.
    async fn is_alive(&self, timeout: Duration) -> bool;

    /// Close the session. Implementations should be idempotent.
    async fn close(&self) -> Result<()>;
}

/// Stable map key for a session handle, derived from its allocation address.
///
/// Valid only while the session is still referenced somewhere; the pool
/// keeps every tracked session alive for exactly that span.
pub fn session_key(session: &Arc<dyn Session>) -> usize {
    Arc::as_ptr(session) as *const () as usize
}

/// Whether two handles refer to the same session.
pub fn same_session(a: &Arc<dyn Session>, b: &Arc<dyn Session>) -> bool {
    Arc::ptr_eq(a, b)
}
