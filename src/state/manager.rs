//! Thread-safe holder of the coordinator's current attempt and phase.

use std::sync::Mutex;
use super::UploadPhase;

/// Snapshot of the coordinator state
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UploadState {
    /// Number of attempts started so far; 0 before the first selection
    pub attempt: u64,
    pub phase: UploadPhase,
}

/// Owns the upload state. The lock is never held across an await point.
pub struct UploadStateManager {
    state: Mutex<UploadState>,
}

impl UploadStateManager {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(UploadState {
                attempt: 0,
                phase: UploadPhase::Idle,
            }),
        }
    }

    pub fn snapshot(&self) -> UploadState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Start a new attempt in `Validating` and return its number.
    ///
    /// An attempt whose future was dropped mid-flight is abandoned here.
    pub fn begin_attempt(&self) -> u64 {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.attempt += 1;
        state.phase = UploadPhase::Validating;
        state.attempt
    }

    /// Move the current attempt to `next`.
    ///
    /// Illegal transitions are refused and reported as `Err` with the phase
    /// that was kept.
    pub fn transition(&self, next: UploadPhase) -> Result<(), UploadPhase> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.phase.can_transition_to(&next) {
            return Err(state.phase.clone());
        }
        state.phase = next;
        Ok(())
    }
}

impl Default for UploadStateManager {
    fn default() -> Self {
        Self::new()
    }
}
