//! Streamlink-based recording job runner.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use chrono::Local;
use parking_lot::Mutex;
use process_utils::{describe_exit, redact_args, tokio_command};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::{JobOutcome, Recorder, StreamlinkConfig, unique_recording_path};
use crate::ChannelId;
use crate::Result;
use crate::config::Credentials;
use crate::status::StreamReference;
use crate::utils::fs;

/// Records a live stream by running streamlink until it exits.
pub struct StreamlinkRecorder {
    config: StreamlinkConfig,
    credentials: Credentials,
    output_root: PathBuf,
    /// Channel directories already created by this runner.
    prepared_dirs: Mutex<HashSet<PathBuf>>,
}

impl StreamlinkRecorder {
    pub fn new(config: StreamlinkConfig, credentials: Credentials, output_root: PathBuf) -> Self {
        Self {
            config,
            credentials,
            output_root,
            prepared_dirs: Mutex::new(HashSet::new()),
        }
    }

    /// Directory holding all recordings for `channel`.
    pub fn channel_dir(&self, channel: &ChannelId) -> PathBuf {
        self.output_root.join(channel.as_str())
    }

    /// Create the channel directory on first use.
    pub async fn prepare_channel_dir(&self, channel: &ChannelId) -> Result<PathBuf> {
        let dir = self.channel_dir(channel);
        if self.prepared_dirs.lock().contains(&dir) {
            return Ok(dir);
        }

        fs::ensure_dir_all_with_op("creating channel directory", &dir).await?;
        debug!(dir = %dir.display(), "Channel directory ready");
        self.prepared_dirs.lock().insert(dir.clone());
        Ok(dir)
    }

    /// Build streamlink command arguments.
    pub fn build_args(&self, stream: &StreamReference, output: &Path) -> Vec<String> {
        let plugin = &self.config.plugin;
        let mut args = vec![
            "--stream-segment-threads".to_string(),
            self.config.segment_threads.to_string(),
            "--stream-segment-attempts".to_string(),
            self.config.segment_attempts.to_string(),
            // Keep following the broadcast through short server hiccups.
            "--hls-live-restart".to_string(),
            // The tool negotiates with the CDN itself and needs to log in too.
            format!("--{plugin}-username"),
            self.credentials.username().to_string(),
            format!("--{plugin}-password"),
            self.credentials.password().to_string(),
        ];

        // Stream URL must be the first positional argument followed by quality
        args.push(stream.playlist_url.clone());
        args.push(self.config.quality.clone());

        args.push("--stream-segment-losscheck".to_string());
        args.extend(self.config.extra_args.iter().cloned());
        args.extend(["-o".to_string(), output.to_string_lossy().into_owned()]);

        args
    }

    /// Parse streamlink output for status information.
    fn parse_streamlink_output(line: &str) -> Option<StreamlinkStatus> {
        if line.contains("[cli][info] Stream ended") {
            return Some(StreamlinkStatus::StreamEnded);
        }
        if line.contains("[cli][info] Opening stream") {
            return Some(StreamlinkStatus::StreamOpened);
        }
        if line.contains("[cli][error]") || line.contains("error: ") {
            return Some(StreamlinkStatus::Error(line.to_string()));
        }
        None
    }

    /// Forward one of the child's output streams to the log.
    fn spawn_output_monitor<R>(reader: R, channel: ChannelId) -> JoinHandle<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => match Self::parse_streamlink_output(&line) {
                        Some(StreamlinkStatus::StreamOpened) => {
                            info!("[{}] Streamlink opened the stream", channel);
                        }
                        Some(StreamlinkStatus::StreamEnded) => {
                            info!("[{}] Streamlink reports the stream ended", channel);
                        }
                        Some(StreamlinkStatus::Error(err)) => {
                            warn!("[{}] Streamlink error: {}", channel, err);
                        }
                        None => debug!(target: "afreeca_rec::streamlink", "{}", line),
                    },
                    Ok(None) => break,
                    Err(e) => {
                        error!("Error reading streamlink output: {}", e);
                        break;
                    }
                }
            }
        })
    }

    async fn supervise(&self, output: &Path, args: &[String], channel: &ChannelId) -> JobOutcome {
        let started = Instant::now();

        let mut command = tokio_command(&self.config.binary_path);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                return JobOutcome::Failed {
                    output: Some(output.to_path_buf()),
                    reason: format!("failed to spawn {}: {e}", self.config.binary_path),
                };
            }
        };

        let monitors: Vec<JoinHandle<()>> = [
            child
                .stdout
                .take()
                .map(|out| Self::spawn_output_monitor(out, channel.clone())),
            child
                .stderr
                .take()
                .map(|err| Self::spawn_output_monitor(err, channel.clone())),
        ]
        .into_iter()
        .flatten()
        .collect();

        let status = child.wait().await;
        for monitor in monitors {
            let _ = monitor.await;
        }

        // Any exit, including a signal, ends the recording normally.
        match status {
            Ok(status) => {
                if !status.success() {
                    warn!("[{}] Streamlink {}", channel, describe_exit(&status));
                }
                JobOutcome::Completed {
                    output: output.to_path_buf(),
                    exit_code: status.code(),
                    elapsed: started.elapsed(),
                }
            }
            Err(e) => JobOutcome::Failed {
                output: Some(output.to_path_buf()),
                reason: format!("error waiting for streamlink: {e}"),
            },
        }
    }
}

/// Status parsed from streamlink output.
#[derive(Debug, PartialEq, Eq)]
enum StreamlinkStatus {
    StreamOpened,
    StreamEnded,
    Error(String),
}

#[async_trait]
impl Recorder for StreamlinkRecorder {
    async fn run_job(&self, channel: &ChannelId, stream: &StreamReference) -> JobOutcome {
        if let Err(e) = self.prepare_channel_dir(channel).await {
            return JobOutcome::Failed {
                output: None,
                reason: e.to_string(),
            };
        }

        let output = unique_recording_path(
            &self.output_root,
            channel,
            &Local::now(),
            &self.config.extension,
        );
        let args = self.build_args(stream, &output);

        info!(
            "[{}] Recording to {}: {}",
            channel,
            output.display(),
            redact_args(
                &self.config.binary_path,
                &args,
                &[self.credentials.password()]
            )
        );

        self.supervise(&output, &args, channel).await
    }
}
