//! Service modules
//!
//! The coordinator ties validation, the signing service and the storage
//! upload together into one observable attempt.

pub mod upload_coordinator;

pub use upload_coordinator::UploadCoordinator;
