//! Read-only accessor contract for pool tunables

use std::time::Duration;

use floodgate_core::{FloodgateError, Result};

/// Immutable view of the pool's tunables.
///
/// The pool core depends only on this contract; where the values come
/// from (hardcoded defaults, a properties file, the embedder's own
/// config system) is the provider's concern. Implementations must return
/// the same value for every call to the same accessor.
pub trait PoolSettings: Send + Sync {
    /// Floor capacity. The pool starts here and never shrinks below it.
    fn baseline_capacity(&self) -> usize;

    /// Number of sessions opened eagerly at startup (clamped to the
    /// starting capacity).
    fn initial_fill(&self) -> usize;

    /// Hard ceiling. The pool never grows beyond it.
    fn max_capacity(&self) -> usize;

    /// Maximum wait on an empty free queue during acquire.
    fn acquire_timeout(&self) -> Duration;

    /// Bound on the liveness probe performed at handout and return.
    fn validation_timeout(&self) -> Duration;

    /// A session held by a borrower longer than this is considered leaked.
    fn leak_threshold(&self) -> Duration;

    /// Period of the background leak scan.
    fn leak_scan_interval(&self) -> Duration;

    /// Active/capacity ratio above which the pool grows.
    fn high_load_ratio(&self) -> f64;

    /// Active/capacity ratio below which a release counts toward a shrink.
    fn low_load_ratio(&self) -> f64;

    /// Capacity multiplier applied when growing. Must exceed 1.
    fn grow_factor(&self) -> f64;

    /// Fraction of current capacity opened when the free queue empties.
    fn top_up_factor(&self) -> f64;

    /// Hard cap on the size of a single top-up batch.
    fn max_top_up(&self) -> usize;

    /// Capacity multiplier applied when shrinking. Must be below 1.
    fn shrink_factor(&self) -> f64;

    /// Consecutive low-load observations required before a shrink.
    fn low_load_hysteresis(&self) -> u32;
}

/// Reject settings the sizing policy cannot operate under.
pub(crate) fn validate(settings: &dyn PoolSettings) -> Result<()> {
    let baseline = settings.baseline_capacity();
    let max = settings.max_capacity();
    if baseline == 0 {
        return Err(config_error("baseline capacity must be at least 1"));
    }
    if baseline > max {
        return Err(config_error(format!(
            "baseline capacity ({baseline}) cannot exceed maximum capacity ({max})"
        )));
    }

    let high = settings.high_load_ratio();
    let low = settings.low_load_ratio();
    if !(0.0..=1.0).contains(&high) || high <= 0.0 {
        return Err(config_error(format!(
            "high load ratio must be in (0, 1], got {high}"
        )));
    }
    if low <= 0.0 || low >= high {
        return Err(config_error(format!(
            "low load ratio must be in (0, high load ratio), got {low}"
        )));
    }

    let grow = settings.grow_factor();
    if grow <= 1.0 {
        return Err(config_error(format!(
            "grow factor must exceed 1, got {grow}"
        )));
    }
    let shrink = settings.shrink_factor();
    if shrink <= 0.0 || shrink >= 1.0 {
        return Err(config_error(format!(
            "shrink factor must be in (0, 1), got {shrink}"
        )));
    }
    let top_up = settings.top_up_factor();
    if top_up <= 0.0 || top_up > 1.0 {
        return Err(config_error(format!(
            "top-up factor must be in (0, 1], got {top_up}"
        )));
    }
    if settings.max_top_up() == 0 {
        return Err(config_error("maximum top-up count must be at least 1"));
    }
    if settings.low_load_hysteresis() == 0 {
        return Err(config_error("low-load hysteresis count must be at least 1"));
    }
    Ok(())
}

fn config_error(message: impl Into<String>) -> FloodgateError {
    FloodgateError::Configuration(message.into())
}
