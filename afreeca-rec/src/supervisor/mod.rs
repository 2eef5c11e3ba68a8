//! Supervisory loop.
//!
//! Drives status resolution, re-authentication and recording for one
//! channel, one phase at a time. Every failure is logged and turned into a
//! retry; the loop itself never returns.
//!
//! Cycle rules:
//! - not live: sleep the retry interval
//! - login required: re-authenticate once, resolve again in the same cycle
//! - live: record until the capture tool exits; sleep after a completed
//!   recording, re-poll immediately after a failed one
//! - any error: log, sleep the retry interval

mod state;

pub use state::LoopState;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::ChannelId;
use crate::Result;
use crate::config::Credentials;
use crate::recorder::{JobOutcome, Recorder};
use crate::session::{SessionManager, SessionStore};
use crate::status::{LiveStatus, StatusResolver};

/// Suspends the loop between polls.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Counters accumulated over the lifetime of the loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SupervisorStats {
    pub polls: u64,
    pub live_detections: u64,
    pub recordings_completed: u64,
    pub recordings_failed: u64,
    pub reauthentications: u64,
    pub errors: u64,
    pub waiting_announcements: u64,
}

/// What happened during one poll cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// States entered during the cycle, in order.
    pub transitions: Vec<LoopState>,
    /// Status the cycle acted on, when resolution succeeded.
    pub status: Option<LiveStatus>,
    pub outcome: Option<JobOutcome>,
    pub error: Option<String>,
    /// Back-off taken at the end of the cycle, if any.
    pub slept: Option<Duration>,
}

/// Single-channel live watcher.
pub struct Supervisor {
    channel: ChannelId,
    credentials: Credentials,
    retry_interval: Duration,
    resolver: Arc<dyn StatusResolver>,
    sessions: Arc<dyn SessionManager>,
    recorder: Arc<dyn Recorder>,
    sleeper: Arc<dyn Sleeper>,
    session_store: SessionStore,
    state: LoopState,
    /// Gates the "waiting" line so it is logged once per idle stretch.
    announce_waiting: bool,
    stats: SupervisorStats,
}

impl Supervisor {
    pub fn new(
        channel: ChannelId,
        credentials: Credentials,
        retry_interval: Duration,
        resolver: Arc<dyn StatusResolver>,
        sessions: Arc<dyn SessionManager>,
        recorder: Arc<dyn Recorder>,
    ) -> Self {
        Self {
            channel,
            credentials,
            retry_interval,
            resolver,
            sessions,
            recorder,
            sleeper: Arc::new(TokioSleeper),
            session_store: SessionStore::new(),
            state: LoopState::IdleWaiting,
            announce_waiting: true,
            stats: SupervisorStats::default(),
        }
    }

    /// Replace the sleeper used between polls.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stats(&self) -> &SupervisorStats {
        &self.stats
    }

    pub fn session_store(&self) -> &SessionStore {
        &self.session_store
    }

    /// Poll forever.
    pub async fn run(&mut self) {
        info!(
            channel = %self.channel,
            retry_interval_secs = self.retry_interval.as_secs(),
            "Watching channel"
        );

        loop {
            let report = self.run_cycle().await;
            debug!(
                channel = %self.channel,
                transitions = ?report.transitions,
                stats = ?self.stats,
                "Cycle finished"
            );
        }
    }

    /// Run one poll cycle, including its trailing sleep.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        if self.announce_waiting {
            info!("[{}] Waiting to start streaming", self.channel);
            self.announce_waiting = false;
            self.stats.waiting_announcements += 1;
        }

        self.stats.polls += 1;
        match self.poll().await {
            Ok(LiveStatus::Live(stream)) => {
                report.status = Some(LiveStatus::Live(stream.clone()));
                self.stats.live_detections += 1;
                self.transition(LoopState::LiveDetected, &mut report);
                info!("[{}] Stream started", self.channel);

                self.transition(LoopState::Recording, &mut report);
                let outcome = self.recorder.run_job(&self.channel, &stream).await;
                self.announce_waiting = true;
                self.transition(LoopState::IdleWaiting, &mut report);

                match &outcome {
                    JobOutcome::Completed { elapsed, .. } => {
                        self.stats.recordings_completed += 1;
                        info!(
                            elapsed_secs = elapsed.as_secs(),
                            "[{}] Stream ended", self.channel
                        );
                    }
                    JobOutcome::Failed { reason, .. } => {
                        self.stats.recordings_failed += 1;
                        error!("[{}] Error: {}", self.channel, reason);
                    }
                }

                // Failed attempts re-poll without sleeping.
                let completed = outcome.is_completed();
                report.outcome = Some(outcome);
                if completed {
                    self.pause(&mut report).await;
                }
            }
            Ok(status) => {
                report.status = Some(status);
                self.transition(LoopState::IdleWaiting, &mut report);
                self.pause(&mut report).await;
            }
            Err(e) => {
                self.stats.errors += 1;
                self.transition(LoopState::ErrorLogged, &mut report);
                error!(transient = e.is_transient(), "[{}] Error: {}", self.channel, e);
                report.error = Some(e.to_string());
                self.pause(&mut report).await;
                self.transition(LoopState::IdleWaiting, &mut report);
            }
        }

        report
    }

    /// Resolve the channel status, re-authenticating at most once.
    async fn poll(&mut self) -> Result<LiveStatus> {
        let status = self
            .resolver
            .resolve_status(&self.channel, &self.session_store)
            .await?;
        if status != LiveStatus::AuthRequired {
            return Ok(status);
        }

        info!("[{}] Login required, re-authenticating", self.channel);
        let session = self.sessions.acquire_session(&self.credentials).await?;
        debug!(
            channel = %self.channel,
            acquired_at = %session.acquired_at(),
            generation = self.session_store.generation() + 1,
            "Installing new session"
        );
        self.session_store.replace(session);
        self.stats.reauthentications += 1;

        let retried = self
            .resolver
            .resolve_status(&self.channel, &self.session_store)
            .await?;
        if retried == LiveStatus::AuthRequired {
            warn!(
                "[{}] Still asked to log in after re-authenticating, retrying next cycle",
                self.channel
            );
        }
        Ok(retried)
    }

    fn transition(&mut self, to: LoopState, report: &mut CycleReport) {
        debug_assert!(
            self.state.can_transition_to(to),
            "invalid transition {} -> {}",
            self.state,
            to
        );
        if self.state != to {
            debug!(channel = %self.channel, from = %self.state, to = %to, "State change");
        }
        self.state = to;
        report.transitions.push(to);
    }

    async fn pause(&self, report: &mut CycleReport) {
        self.sleeper.sleep(self.retry_interval).await;
        report.slept = Some(self.retry_interval);
    }
}
