//! Platform login credentials and where they come from.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::{Error, Result};

/// Environment variable holding the platform login id.
pub const USER_NAME_ENV: &str = "USER_NAME";
/// Environment variable holding the platform password.
pub const USER_PASSWORD_ENV: &str = "USER_PASSWORD";

/// Login id and password, fixed for the lifetime of the process.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    #[serde(rename = "USER_NAME")]
    username: String,
    #[serde(rename = "USER_PASSWORD")]
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Read credentials from `USER_NAME` / `USER_PASSWORD`, falling back to a
    /// JSON file with the same keys when either variable is missing.
    pub fn load<F>(lookup: F, config_file: &Path) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let (Some(username), Some(password)) =
            (lookup(USER_NAME_ENV), lookup(USER_PASSWORD_ENV))
        {
            return Ok(Self::new(username, password));
        }

        Self::from_file(config_file)
    }

    /// Read credentials from a JSON file (`{"USER_NAME": .., "USER_PASSWORD": ..}`).
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::config(format!(
                    "environment variables {USER_NAME_ENV}/{USER_PASSWORD_ENV} are not set and {} does not exist",
                    path.display()
                )));
            }
            Err(e) => {
                return Err(Error::config(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            }
        };

        serde_json::from_str(&contents)
            .map_err(|e| Error::config(format!("invalid credentials file {}: {e}", path.display())))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
