//! Channel identity value object.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A broadcaster's login name on the platform.
///
/// The login doubles as the name of the channel's output directory, so it is
/// rejected up front if it could escape that directory or is not a single
/// path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelId(String);

impl ChannelId {
    /// Validate and wrap a channel login.
    pub fn parse(login: impl AsRef<str>) -> Result<Self, Error> {
        let login = login.as_ref().trim();

        if login.is_empty() {
            return Err(Error::config("channel login must not be empty"));
        }
        if login == "." || login == ".." {
            return Err(Error::config(format!("invalid channel login: {login}")));
        }
        if let Some(c) = login
            .chars()
            .find(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '\\' | ':'))
        {
            return Err(Error::config(format!(
                "invalid character {c:?} in channel login: {login}"
            )));
        }

        Ok(Self(login.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ChannelId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ChannelId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ChannelId> for String {
    fn from(value: ChannelId) -> Self {
        value.0
    }
}

impl AsRef<str> for ChannelId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
