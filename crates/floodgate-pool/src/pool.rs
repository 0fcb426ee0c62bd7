//! Session pool
//!
//! The pool hands out validated sessions, resizes itself between a
//! baseline and a maximum capacity, and reclaims leaked sessions through
//! the detector in [`crate::leak`].
//!
//! # Example
//!
//! ```ignore
//! use floodgate_pool::{Pool, DefaultSettings};
//!
//! let pool = Pool::new(Arc::new(DefaultSettings), factory).await?;
//! let session = pool.acquire().await?;
//! // Use session...
//! pool.release(session).await;
//! ```

mod pool;
mod queue;
mod stats;


pub use pool::Pool;
pub use stats::PoolStats;
