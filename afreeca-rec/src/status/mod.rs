//! Live status resolution.
//!
//! The platform reports a channel's state as a numeric `RESULT` code. This
//! module turns that code into a [`LiveStatus`]; it never retries and never
//! re-authenticates on its own. An auth-required answer comes back as
//! [`LiveStatus::AuthRequired`] and the caller decides what to do with it.

mod afreeca;

pub use afreeca::AfreecaStatusResolver;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::session::SessionStore;
use crate::{ChannelId, Error, Result};

/// Channel is offline.
pub const RESULT_NOT_LIVE: i64 = 0;
/// Channel is broadcasting; an `AID` token accompanies the answer.
pub const RESULT_LIVE: i64 = 1;
/// The stream needs a logged-in session.
pub const RESULT_LOGIN_REQUIRED: i64 = -6;

/// Handle to a live broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamReference {
    /// Server-issued stream-access token.
    pub access_token: String,
    /// Playback address built from the token.
    pub playlist_url: String,
}

impl StreamReference {
    /// Build the playback address `<playlist_base>?aid=<token>`.
    pub fn new(playlist_base: &str, access_token: impl Into<String>) -> Result<Self> {
        let access_token = access_token.into();
        let url = Url::parse_with_params(playlist_base, &[("aid", access_token.as_str())])
            .map_err(|e| {
                Error::malformed(format!("invalid playlist url {playlist_base}: {e}"))
            })?;

        Ok(Self {
            access_token,
            playlist_url: url.into(),
        })
    }
}

/// Outcome of one status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveStatus {
    NotLive,
    Live(StreamReference),
    /// The platform wants a fresh login before it reveals the stream.
    AuthRequired,
}

impl fmt::Display for LiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotLive => f.write_str("NOT_LIVE"),
            Self::Live(_) => f.write_str("LIVE"),
            Self::AuthRequired => f.write_str("AUTH_REQUIRED"),
        }
    }
}

/// Map a platform `RESULT` code to a [`LiveStatus`].
///
/// Unknown codes are reported as [`LiveStatus::NotLive`] and logged, so a
/// platform-side change degrades to "keep polling" instead of an error loop.
pub fn classify(
    channel: &ChannelId,
    code: i64,
    access_token: Option<&str>,
    playlist_base: &str,
) -> Result<LiveStatus> {
    match code {
        RESULT_NOT_LIVE => Ok(LiveStatus::NotLive),
        RESULT_LIVE => {
            let token = access_token
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| {
                    Error::malformed(format!("[{channel}] live answer without a stream token"))
                })?;
            Ok(LiveStatus::Live(StreamReference::new(playlist_base, token)?))
        }
        RESULT_LOGIN_REQUIRED => Ok(LiveStatus::AuthRequired),
        other => {
            warn!(channel = %channel, code = other, "Unknown live status code, treating as not live");
            Ok(LiveStatus::NotLive)
        }
    }
}

/// Queries the platform for a channel's current state.
#[async_trait]
pub trait StatusResolver: Send + Sync {
    /// Resolve the channel's state, signing the request with the current
    /// session if there is one.
    ///
    /// Unreachable endpoints and unparsable answers fail with
    /// [`Error::Network`] or [`Error::MalformedResponse`].
    async fn resolve_status(
        &self,
        channel: &ChannelId,
        session: &SessionStore,
    ) -> Result<LiveStatus>;
}
