//! Direct-to-storage file upload through a signed POST policy.
//!
//! A selected file is checked against the size limit, a short-lived grant is
//! requested from the signing service, and the file is POSTed straight to the
//! storage provider. Each attempt ends in exactly one [`UploadOutcome`],
//! broadcast to subscribers such as a [`FormBinding`].

pub mod api_contracts;
pub mod config;
pub mod config_utils;
pub mod debug_logger;
pub mod error;
pub mod form_binding;
pub mod logging;
pub mod services;
pub mod signing_client;
pub mod state;
pub mod storage_uploader;
pub mod types;

#[cfg(test)]
mod test_harness;

pub use config::UploaderConfig;
pub use error::UploadError;
pub use form_binding::{FormBinding, FormView};
pub use services::UploadCoordinator;
pub use signing_client::{HttpSigningService, SigningService};
pub use state::{UploadPhase, UploadState};
pub use storage_uploader::StorageUploader;
pub use types::{Locale, SelectedFile, SignedUploadGrant, UploadEvent, UploadOutcome, UploadRequest};
