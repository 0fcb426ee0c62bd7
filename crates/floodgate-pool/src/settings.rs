//! Pool tunables and their providers
//!
//! The pool reads its knobs through the read-only [`PoolSettings`]
//! accessor contract. Two providers ship with the crate:
//!
//! - [`DefaultSettings`] - hardcoded defaults
//! - [`PropertiesSettings`] - `key = value` file form
//!
//! # Example
//!
//! ```ignore
//! use floodgate_pool::settings::PropertiesSettings;
//!
//! let settings = PropertiesSettings::from_file("pool.properties")?;
//! let pool = Pool::new(Arc::new(settings), factory).await?;
//! ```

mod defaults;
mod file;
mod provider;


pub use defaults::DefaultSettings;
pub use file::PropertiesSettings;
pub use provider::PoolSettings;

pub(crate) use file::Properties;
pub(crate) use provider::validate;
