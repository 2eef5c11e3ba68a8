//! End-to-end watch scenario with scripted platform answers.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use parking_lot::Mutex;
use tempfile::TempDir;

use afreeca_rec::config::Credentials;
use afreeca_rec::recorder::{
    JobOutcome, Recorder, StreamlinkConfig, StreamlinkRecorder, unique_recording_path,
};
use afreeca_rec::session::{Session, SessionManager, SessionStore};
use afreeca_rec::status::{LiveStatus, StatusResolver, StreamReference, classify};
use afreeca_rec::supervisor::{LoopState, Sleeper, Supervisor};
use afreeca_rec::{ChannelId, Error, Result};

const PLAYLIST: &str = "https://cdn.example.com/auth_playlist.m3u8";

/// Answers with a fixed sequence of platform result codes.
struct CodeScript {
    codes: Mutex<VecDeque<i64>>,
}

#[async_trait]
impl StatusResolver for CodeScript {
    async fn resolve_status(
        &self,
        channel: &ChannelId,
        _session: &SessionStore,
    ) -> Result<LiveStatus> {
        let code = self
            .codes
            .lock()
            .pop_front()
            .ok_or_else(|| Error::malformed("script exhausted"))?;
        classify(channel, code, Some("aid-token"), PLAYLIST)
    }
}

struct NoLogin;

#[async_trait]
impl SessionManager for NoLogin {
    async fn acquire_session(&self, _credentials: &Credentials) -> Result<Session> {
        Err(Error::auth("not expected in this scenario"))
    }
}

/// Writes an empty recording where the capture tool would.
struct FileRecorder {
    root: PathBuf,
}

#[async_trait]
impl Recorder for FileRecorder {
    async fn run_job(&self, channel: &ChannelId, stream: &StreamReference) -> JobOutcome {
        assert!(stream.playlist_url.contains("aid=aid-token"));
        let output = unique_recording_path(&self.root, channel, &Local::now(), "ts");
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&output, b"").unwrap();
        JobOutcome::Completed {
            output,
            exit_code: Some(0),
            elapsed: Duration::ZERO,
        }
    }
}

#[derive(Default)]
struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
    }
}

#[tokio::test]
async fn test_watch_alice_records_one_broadcast() {
    let temp = TempDir::new().unwrap();
    let interval = Duration::from_secs(5);
    let sleeper = Arc::new(RecordingSleeper::default());

    let mut supervisor = Supervisor::new(
        ChannelId::parse("alice").unwrap(),
        Credentials::new("alice", "pw"),
        interval,
        Arc::new(CodeScript {
            codes: Mutex::new(VecDeque::from([0, 0, 1, 0])),
        }),
        Arc::new(NoLogin),
        Arc::new(FileRecorder {
            root: temp.path().to_path_buf(),
        }),
    )
    .with_sleeper(sleeper.clone());

    let mut transitions = Vec::new();
    for _ in 0..3 {
        transitions.extend(supervisor.run_cycle().await.transitions);
    }
    assert_eq!(
        transitions,
        vec![
            LoopState::IdleWaiting,
            LoopState::IdleWaiting,
            LoopState::LiveDetected,
            LoopState::Recording,
            LoopState::IdleWaiting,
        ]
    );

    let last = supervisor.run_cycle().await;
    assert_eq!(last.status, Some(LiveStatus::NotLive));
    assert_eq!(supervisor.state(), LoopState::IdleWaiting);

    // Every cycle, including the recording one, ended with the full interval.
    assert_eq!(*sleeper.sleeps.lock(), vec![interval; 4]);

    let files: Vec<_> = std::fs::read_dir(temp.path().join("alice"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].extension().unwrap(), "ts");

    let stats = supervisor.stats();
    assert_eq!(stats.polls, 4);
    assert_eq!(stats.live_detections, 1);
    assert_eq!(stats.recordings_completed, 1);
    assert_eq!(stats.reauthentications, 0);
}

/// Stand-in for streamlink that creates the file named by its last argument.
#[cfg(unix)]
fn touch_last_arg_tool(dir: &std::path::Path) -> String {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("streamlink-stub.sh");
    std::fs::write(&path, "#!/bin/sh\nfor last; do :; done\ntouch \"$last\"\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

#[cfg(unix)]
#[tokio::test]
async fn test_watch_alice_with_streamlink_runner() {
    let tools = TempDir::new().unwrap();
    let output_root = TempDir::new().unwrap();
    let sleeper = Arc::new(RecordingSleeper::default());

    let recorder = StreamlinkRecorder::new(
        StreamlinkConfig {
            binary_path: touch_last_arg_tool(tools.path()),
            ..Default::default()
        },
        Credentials::new("alice", "pw"),
        output_root.path().to_path_buf(),
    );

    let mut supervisor = Supervisor::new(
        ChannelId::parse("alice").unwrap(),
        Credentials::new("alice", "pw"),
        Duration::from_secs(5),
        Arc::new(CodeScript {
            codes: Mutex::new(VecDeque::from([0, 0, 1, 0])),
        }),
        Arc::new(NoLogin),
        Arc::new(recorder),
    )
    .with_sleeper(sleeper.clone());

    let mut outcomes = Vec::new();
    for _ in 0..4 {
        if let Some(outcome) = supervisor.run_cycle().await.outcome {
            outcomes.push(outcome);
        }
    }

    assert_eq!(outcomes.len(), 1);
    let JobOutcome::Completed {
        output, exit_code, ..
    } = &outcomes[0]
    else {
        panic!("expected completion, got {:?}", outcomes[0]);
    };
    assert_eq!(*exit_code, Some(0));

    let files: Vec<_> = std::fs::read_dir(output_root.path().join("alice"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(files, vec![output.clone()]);
    assert_eq!(output.extension().unwrap(), "ts");
    assert_eq!(supervisor.state(), LoopState::IdleWaiting);
    assert_eq!(sleeper.sleeps.lock().len(), 4);
}
