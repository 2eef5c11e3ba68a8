//! Output file layout: `<root>/<channel>/<timestamp>.<extension>`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

use crate::ChannelId;

/// Sortable, filesystem-safe timestamp used for recording names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

/// Most suffixes tried before giving up on a free name.
const MAX_SUFFIX: u32 = 1000;

/// Path of a recording started at `started_at`.
pub fn recording_path<Tz>(
    root: &Path,
    channel: &ChannelId,
    started_at: &DateTime<Tz>,
    extension: &str,
) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let stamp = started_at.format(TIMESTAMP_FORMAT);
    root.join(channel.as_str()).join(format!("{stamp}.{extension}"))
}

/// Like [`recording_path`], but appends `_1`, `_2`, ... when a file with
/// that name already exists (two starts within the same second).
pub fn unique_recording_path<Tz>(
    root: &Path,
    channel: &ChannelId,
    started_at: &DateTime<Tz>,
    extension: &str,
) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let base = recording_path(root, channel, started_at, extension);
    if !base.exists() {
        return base;
    }

    let stamp = started_at.format(TIMESTAMP_FORMAT).to_string();
    let dir = root.join(channel.as_str());
    (1..=MAX_SUFFIX)
        .map(|n| dir.join(format!("{stamp}_{n}.{extension}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(base)
}
