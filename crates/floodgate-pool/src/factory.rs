//! Session factory seam

use std::sync::Arc;

use async_trait::async_trait;

use floodgate_core::{Result, Session};

/// Factory trait for opening new database sessions.
///
/// Each call establishes a fresh session; the factory does no pooling or
/// caching of its own. Failure to reach the backend surfaces as
/// [`Backend`](floodgate_core::FloodgateError::Backend).
#[async_trait]
pub trait SessionFactory: Send + Sync + 'static {
    /// Open a new session.
    async fn open(&self) -> Result<Arc<dyn Session>>;
}

#[async_trait]
impl<T: SessionFactory> SessionFactory for Arc<T> {
    async fn open(&self) -> Result<Arc<dyn Session>> {
        (**self).open().await
    }
}
