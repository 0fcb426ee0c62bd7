//! Properties-file settings provider
//!
//! Reads the `key = value` external form. All required keys are resolved
//! eagerly at construction, so a missing or malformed entry surfaces as
//! an error before the pool ever starts. Unknown keys are ignored.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use floodgate_core::{FloodgateError, Result};

use super::provider::PoolSettings;

const INITIAL_MAX_POOL_SIZE: &str = "initial.max.pool.size";
const INITIAL_POOL_SIZE: &str = "initial.pool.size";
const CONNECTION_TIMEOUT_AMOUNT: &str = "connection.timeout.amount";
const CONNECTION_TIMEOUT_UNIT: &str = "connection.timeout.unit";
const CONNECTION_LEAK_THRESHOLD_AMOUNT: &str = "connection.leak.threshold.amount";
const CONNECTION_LEAK_THRESHOLD_UNIT: &str = "connection.leak.threshold.unit";
const CONNECTION_VALIDATION_TIMEOUT_SECONDS: &str = "connection.validation.timeout.seconds";
const LEAK_DETECTOR_SERVICE_INTERVAL: &str = "connection.leak.detector.service.interval";
const LEAK_DETECTOR_SERVICE_INTERVAL_UNIT: &str = "connection.leak.detector.service.interval.unit";
const HIGH_LOAD_THRESHOLD: &str = "high.load.threshold";
const LOW_LOAD_THRESHOLD: &str = "low.load.threshold";
const MAXIMUM_POOL_SIZE: &str = "maximum.pool.size";
const HIGH_LOAD_GROWTH_FACTOR: &str = "high.load.growth.factor";
const HIGH_LOAD_CONNECTION_GROWTH_FACTOR: &str = "high.load.connection.growth.factor";
const MAXIMUM_CONNECTION_GROWTH_AMOUNT: &str = "maximum.connection.growth.amount";
const LOW_LOAD_POOL_SHRINK_FACTOR: &str = "low.load.pool.shrink.factor";
const LOW_LOAD_HYSTERESIS_COUNT: &str = "low.load.hysteresis.count";

/// Minimal `key = value` property source.
///
/// Lines are trimmed; blank lines and lines starting with `#` or `!`
/// are skipped; everything after the first `=` is the value.
pub(crate) struct Properties {
    entries: HashMap<String, String>,
}

impl Properties {
    pub(crate) fn parse(text: &str) -> Self {
        let mut entries = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                entries.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        Self { entries }
    }

    pub(crate) fn get(&self, key: &str) -> Result<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| FloodgateError::MissingProperty(key.to_string()))
    }

    pub(crate) fn get_usize(&self, key: &str) -> Result<usize> {
        let value = self.get(key)?;
        value
            .parse()
            .map_err(|_| invalid(key, value, "a non-negative integer"))
    }

    pub(crate) fn get_u32(&self, key: &str) -> Result<u32> {
        let value = self.get(key)?;
        value
            .parse()
            .map_err(|_| invalid(key, value, "a non-negative integer"))
    }

    pub(crate) fn get_u64(&self, key: &str) -> Result<u64> {
        let value = self.get(key)?;
        value
            .parse()
            .map_err(|_| invalid(key, value, "a non-negative integer"))
    }

    pub(crate) fn get_f64(&self, key: &str) -> Result<f64> {
        let value = self.get(key)?;
        value.parse().map_err(|_| invalid(key, value, "a number"))
    }
}

fn invalid(key: &str, value: &str, expected: &'static str) -> FloodgateError {
    FloodgateError::InvalidProperty {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    }
}

/// Build a duration from an `<key>.amount` / `<key>.unit` property pair.
fn duration_property(props: &Properties, amount_key: &str, unit_key: &str) -> Result<Duration> {
    let amount = props.get_u64(amount_key)?;
    let unit = props.get(unit_key)?;
    duration_of(amount, unit)
        .ok_or_else(|| invalid(unit_key, unit, "a time unit (NANOS through DAYS)"))
}

/// Resolve a time-unit name. Accepts both the `ChronoUnit` and the
/// `TimeUnit` spellings, case-insensitively.
fn duration_of(amount: u64, unit: &str) -> Option<Duration> {
    let unit = unit.trim().to_ascii_uppercase();
    let duration = match unit.as_str() {
        "NANOS" | "NANOSECONDS" => Duration::from_nanos(amount),
        "MICROS" | "MICROSECONDS" => Duration::from_micros(amount),
        "MILLIS" | "MILLISECONDS" => Duration::from_millis(amount),
        "SECONDS" => Duration::from_secs(amount),
        "MINUTES" => Duration::from_secs(amount * 60),
        "HOURS" => Duration::from_secs(amount * 60 * 60),
        "DAYS" => Duration::from_secs(amount * 24 * 60 * 60),
        _ => return None,
    };
    Some(duration)
}

/// Settings provider backed by a properties file.
///
/// Every required key must be present and parseable; absence is a
/// [`FloodgateError::MissingProperty`], a bad value a
/// [`FloodgateError::InvalidProperty`].
#[derive(Debug, Clone)]
pub struct PropertiesSettings {
    baseline_capacity: usize,
    initial_fill: usize,
    max_capacity: usize,
    acquire_timeout: Duration,
    validation_timeout: Duration,
    leak_threshold: Duration,
    leak_scan_interval: Duration,
    high_load_ratio: f64,
    low_load_ratio: f64,
    grow_factor: f64,
    top_up_factor: f64,
    max_top_up: usize,
    shrink_factor: f64,
    low_load_hysteresis: u32,
}

impl PropertiesSettings {
    /// Parse settings from property text.
    pub fn parse(text: &str) -> Result<Self> {
        let props = Properties::parse(text);
        Ok(Self {
            baseline_capacity: props.get_usize(INITIAL_MAX_POOL_SIZE)?,
            initial_fill: props.get_usize(INITIAL_POOL_SIZE)?,
            max_capacity: props.get_usize(MAXIMUM_POOL_SIZE)?,
            acquire_timeout: duration_property(
                &props,
                CONNECTION_TIMEOUT_AMOUNT,
                CONNECTION_TIMEOUT_UNIT,
            )?,
            validation_timeout: Duration::from_secs(
                props.get_u64(CONNECTION_VALIDATION_TIMEOUT_SECONDS)?,
            ),
            leak_threshold: duration_property(
                &props,
                CONNECTION_LEAK_THRESHOLD_AMOUNT,
                CONNECTION_LEAK_THRESHOLD_UNIT,
            )?,
            leak_scan_interval: duration_property(
                &props,
                LEAK_DETECTOR_SERVICE_INTERVAL,
                LEAK_DETECTOR_SERVICE_INTERVAL_UNIT,
            )?,
            high_load_ratio: props.get_f64(HIGH_LOAD_THRESHOLD)?,
            low_load_ratio: props.get_f64(LOW_LOAD_THRESHOLD)?,
            grow_factor: props.get_f64(HIGH_LOAD_GROWTH_FACTOR)?,
            top_up_factor: props.get_f64(HIGH_LOAD_CONNECTION_GROWTH_FACTOR)?,
            max_top_up: props.get_usize(MAXIMUM_CONNECTION_GROWTH_AMOUNT)?,
            shrink_factor: props.get_f64(LOW_LOAD_POOL_SHRINK_FACTOR)?,
            low_load_hysteresis: props.get_u32(LOW_LOAD_HYSTERESIS_COUNT)?,
        })
    }

    /// Read and parse a properties file from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse(&std::fs::read_to_string(path)?)
    }
}

impl PoolSettings for PropertiesSettings {
    fn baseline_capacity(&self) -> usize {
        self.baseline_capacity
    }

    fn initial_fill(&self) -> usize {
        self.initial_fill
    }

    fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    fn acquire_timeout(&self) -> Duration {
        self.acquire_timeout
    }

    fn validation_timeout(&self) -> Duration {
        self.validation_timeout
    }

    fn leak_threshold(&self) -> Duration {
        self.leak_threshold
    }

    fn leak_scan_interval(&self) -> Duration {
        self.leak_scan_interval
    }

    fn high_load_ratio(&self) -> f64 {
        self.high_load_ratio
    }

    fn low_load_ratio(&self) -> f64 {
        self.low_load_ratio
    }

    fn grow_factor(&self) -> f64 {
        self.grow_factor
    }

    fn top_up_factor(&self) -> f64 {
        self.top_up_factor
    }

    fn max_top_up(&self) -> usize {
        self.max_top_up
    }

    fn shrink_factor(&self) -> f64 {
        self.shrink_factor
    }

    fn low_load_hysteresis(&self) -> u32 {
        self.low_load_hysteresis
    }
}
