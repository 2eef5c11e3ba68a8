//! Supervisory loop states.

use serde::Serialize;

/// Where the loop is within a poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoopState {
    /// Polling the channel (or sleeping between polls).
    #[default]
    IdleWaiting,
    /// A live broadcast was confirmed.
    LiveDetected,
    /// The capture tool is running.
    Recording,
    /// A cycle failed; the error was logged and the loop will back off.
    ErrorLogged,
}

impl LoopState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IdleWaiting => "IDLE_WAITING",
            Self::LiveDetected => "LIVE_DETECTED",
            Self::Recording => "RECORDING",
            Self::ErrorLogged => "ERROR_LOGGED",
        }
    }

    /// Validate a state transition.
    pub fn can_transition_to(&self, target: LoopState) -> bool {
        use LoopState::*;

        match (self, target) {
            // Any state may fail.
            (_, ErrorLogged) => true,
            (IdleWaiting, IdleWaiting | LiveDetected) => true,
            (LiveDetected, Recording) => true,
            (Recording, IdleWaiting) => true,
            (ErrorLogged, IdleWaiting) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
