//! Process-wide pool registry
//!
//! The `Arc<Pool>` handle returned by [`Pool::new`] is the primary API;
//! this module is the optional ambient convenience for applications that
//! want exactly one pool per process.

use std::sync::Arc;

use tokio::sync::OnceCell;

use floodgate_core::{FloodgateError, Result};

use crate::factory::SessionFactory;
use crate::pool::Pool;
use crate::settings::PoolSettings;

static POOL: OnceCell<Arc<Pool>> = OnceCell::const_new();

/// Initialize the process-wide pool.
///
/// The first successful call builds the pool; every later call returns
/// the existing handle untouched. Concurrent callers race on the first
/// construction and all receive the winner's pool.
pub async fn initialize(
    settings: Arc<dyn PoolSettings>,
    factory: Arc<dyn SessionFactory>,
) -> Result<Arc<Pool>> {
    POOL.get_or_try_init(|| Pool::new(settings, factory))
        .await
        .map(Arc::clone)
}

/// The process-wide pool, if [`initialize`] has succeeded.
pub fn instance() -> Result<Arc<Pool>> {
    POOL.get().cloned().ok_or(FloodgateError::NotInitialized)
}
