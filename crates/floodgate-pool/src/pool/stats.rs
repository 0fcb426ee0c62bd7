//! Pool statistics types

use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of the pool's state.
///
/// Taken without a global lock, so the fields are individually accurate
/// but not mutually atomic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Current capacity bound
    capacity: usize,
    /// Number of idle sessions in the free queue
    idle: usize,
    /// Number of sessions held by borrowers
    active: usize,
    /// Consecutive low-load observations so far
    low_load_streak: u32,
}

impl PoolStats {
    pub fn new(capacity: usize, idle: usize, active: usize, low_load_streak: u32) -> Self {
        Self {
            capacity,
            idle,
            active,
            low_load_streak,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn idle(&self) -> usize {
        self.idle
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn low_load_streak(&self) -> u32 {
        self.low_load_streak
    }

    /// Active sessions as a fraction of capacity (0.0 when capacity is 0).
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.active as f64 / self.capacity as f64
        }
    }

    /// Whether every slot the pool could hand out is in use.
    pub fn is_exhausted(&self) -> bool {
        self.idle == 0 && self.active >= self.capacity
    }
}
