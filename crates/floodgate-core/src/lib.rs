//! Floodgate Core - seam traits and error types for the session pool
//!
//! This crate provides the fundamental contracts that the pool crate and
//! driver integrations depend on. It defines:
//!
//! - `Session` - Trait for an open database session (liveness probe, close)
//! - `FloodgateError` / `Result` - Common error type and result alias
//! - Handle-identity helpers (`session_key`, `same_session`)

mod error;
mod session;

pub use error::{FloodgateError, Result};
pub use session::{same_session, session_key, Session};
