//! Floodgate Pool - elastic database session pooling
//!
//! This crate implements a bounded cache of live database sessions.
//! Borrowers take a session with [`Pool::acquire`] and hand it back with
//! [`Pool::release`]; every handout is revalidated against the backend
//! first. The pool resizes itself between a baseline and a maximum
//! capacity (growing under high load, shrinking with hysteresis under
//! low load), tops itself up when the free queue runs dry, and reclaims
//! sessions that borrowers hold past a configurable leak threshold.
//!
//! The database driver stays outside the crate: embedders implement
//! [`SessionFactory`] (and the `Session` trait from `floodgate-core`)
//! over their native connection type.

mod credentials;
mod factory;
pub mod leak;
pub mod pool;
mod registry;
pub mod scheduler;
pub mod settings;

pub use credentials::Credentials;
pub use factory::SessionFactory;
pub use leak::{LeakDetector, ReclaimLeaked};
pub use pool::{Pool, PoolStats};
pub use registry::{initialize, instance};
pub use scheduler::{PeriodicTask, Scheduler, TokioScheduler};
pub use settings::{DefaultSettings, PoolSettings, PropertiesSettings};
