//! Upload state management.
//!
//! This module contains the phase type and the manager tracking the
//! coordinator's current attempt.

mod manager;
mod phase;

pub use manager::{UploadState, UploadStateManager};
pub use phase::UploadPhase;
