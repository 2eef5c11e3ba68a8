use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::COOKIE;
use serde::Deserialize;
use tracing::debug;

use super::{LiveStatus, StatusResolver, classify};
use crate::session::SessionStore;
use crate::{ChannelId, Error, Result};

#[derive(Debug, Deserialize)]
struct PlayerLiveResponse {
    #[serde(rename = "CHANNEL")]
    channel: Option<ChannelPayload>,
}

#[derive(Debug, Deserialize)]
struct ChannelPayload {
    #[serde(rename = "RESULT")]
    result: Option<i64>,
    #[serde(rename = "AID", default)]
    aid: Option<String>,
}

/// Status resolver backed by the AfreecaTV player live API.
pub struct AfreecaStatusResolver {
    client: Client,
    live_api_url: String,
    playlist_url: String,
}

impl AfreecaStatusResolver {
    pub fn new(
        client: Client,
        live_api_url: impl Into<String>,
        playlist_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            live_api_url: live_api_url.into(),
            playlist_url: playlist_url.into(),
        }
    }
}

#[async_trait]
impl StatusResolver for AfreecaStatusResolver {
    async fn resolve_status(
        &self,
        channel: &ChannelId,
        session: &SessionStore,
    ) -> Result<LiveStatus> {
        let form = [
            ("bid", channel.as_str()),
            ("quality", "original"),
            ("type", "aid"),
            ("pwd", ""),
            ("stream_type", "common"),
        ];

        let mut request = self.client.post(&self.live_api_url).form(&form);
        if let Some(session) = session.current().filter(|s| !s.is_empty()) {
            request = request.header(COOKIE, session.cookie_header());
        }

        let response = request.send().await?.error_for_status()?;
        let body = response.text().await?;

        let parsed: PlayerLiveResponse = serde_json::from_str(&body).map_err(|e| {
            Error::malformed(format!("[{channel}] unparsable live status payload: {e}"))
        })?;
        let payload = parsed
            .channel
            .ok_or_else(|| Error::malformed(format!("[{channel}] payload has no CHANNEL")))?;
        let code = payload
            .result
            .ok_or_else(|| Error::malformed(format!("[{channel}] payload has no RESULT")))?;

        debug!(channel = %channel, code, "Live status answer");
        classify(channel, code, payload.aid.as_deref(), &self.playlist_url)
    }
}
