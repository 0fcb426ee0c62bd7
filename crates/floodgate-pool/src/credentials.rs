//! Database credentials carrier
//!
//! The pool core never dials the database itself; credentials exist for
//! [`SessionFactory`](crate::SessionFactory) implementations to consume.

use std::fmt;
use std::path::Path;

use floodgate_core::Result;

use crate::settings::Properties;

const USER_KEY: &str = "user";
const PASSWORD_KEY: &str = "password";
const URL_KEY: &str = "url";

/// Username, password, and base URL for establishing database sessions.
///
/// `Debug` output redacts the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    user: String,
    password: String,
    url: String,
}

impl Credentials {
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            url: url.into(),
        }
    }

    /// Parse credentials from property text with `user`, `password`, and
    /// `url` keys. A missing key is a
    /// [`MissingProperty`](floodgate_core::FloodgateError::MissingProperty)
    /// error.
    pub fn from_properties(text: &str) -> Result<Self> {
        let props = Properties::parse(text);
        Ok(Self {
            user: props.get(USER_KEY)?.to_string(),
            password: props.get(PASSWORD_KEY)?.to_string(),
            url: props.get(URL_KEY)?.to_string(),
        })
    }

    /// Read and parse a credentials property file from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_properties(&std::fs::read_to_string(path)?)
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("url", &self.url)
            .finish()
    }
}
