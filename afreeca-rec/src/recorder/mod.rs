//! Recording jobs.
//!
//! A job is one supervised run of the capture tool for one broadcast. The
//! runner awaits the child for the whole broadcast, so the caller never has
//! two jobs for a channel in flight.

mod config;
mod output;
mod streamlink;

pub use config::StreamlinkConfig;
pub use output::{TIMESTAMP_FORMAT, recording_path, unique_recording_path};
pub use streamlink::StreamlinkRecorder;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::ChannelId;
use crate::status::StreamReference;

/// Terminal state of a recording job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The capture tool ran and exited, whatever its exit status.
    Completed {
        output: PathBuf,
        /// Exit code reported by the tool, `None` when killed by a signal.
        exit_code: Option<i32>,
        elapsed: Duration,
    },
    /// The capture tool could not be launched or waited on.
    Failed {
        output: Option<PathBuf>,
        reason: String,
    },
}

impl JobOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Runs one recording job to completion.
#[async_trait]
pub trait Recorder: Send + Sync {
    /// Record `stream` for `channel` until the capture tool exits.
    ///
    /// Never returns an error: every failure is folded into
    /// [`JobOutcome::Failed`].
    async fn run_job(&self, channel: &ChannelId, stream: &StreamReference) -> JobOutcome;
}
