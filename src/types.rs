//! Core types for a single-file upload.
//!
//! This module contains the file handle handed to the coordinator, the
//! validated request, the grant returned by the signing service and the
//! terminal outcome reported to observers.

use crate::error::UploadError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Language used for user-facing messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    English,
    Spanish,
}

/// Where the bytes of a selected file live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    Memory(Vec<u8>),
    Path(PathBuf),
}

/// A file chosen by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub source: FileSource,
}

impl SelectedFile {
    /// File held in memory
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size_bytes: bytes.len() as u64,
            source: FileSource::Memory(bytes),
        }
    }

    /// File on disk. Only metadata is read here; the content is loaded at upload time.
    ///
    /// The MIME type is guessed from the extension unless `mime_type` is given.
    pub async fn from_path(path: &Path, mime_type: Option<&str>) -> Result<Self, String> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| format!("Failed to read file metadata: {}", e))?;

        if !metadata.is_file() {
            return Err(format!("Not a file: {}", path.display()));
        }

        let name = path.file_name()
            .and_then(|n| n.to_str())
            .ok_or("Invalid filename")?
            .to_string();

        let mime_type = match mime_type {
            Some(m) => m.to_string(),
            None => mime_guess::from_path(path)
                .first_raw()
                .unwrap_or(FALLBACK_MIME_TYPE)
                .to_string(),
        };

        Ok(Self {
            name,
            mime_type,
            size_bytes: metadata.len(),
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    /// Load the file content
    pub async fn read_content(&self) -> Result<Vec<u8>, String> {
        match &self.source {
            FileSource::Memory(bytes) => Ok(bytes.clone()),
            FileSource::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|e| format!("Failed to read file: {}", e)),
        }
    }
}

/// A selection that passed local validation
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UploadRequest {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

impl UploadRequest {
    /// Validate a selection against the size limit. Sizes equal to the limit are rejected.
    pub fn validate(file: &SelectedFile, max_file_size_bytes: u64) -> Result<Self, UploadError> {
        if file.size_bytes >= max_file_size_bytes {
            return Err(UploadError::FileTooLarge {
                size_bytes: file.size_bytes,
                max_bytes: max_file_size_bytes,
            });
        }

        Ok(Self {
            file_name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            size_bytes: file.size_bytes,
        })
    }
}

/// Short-lived authorization to POST one object to storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUploadGrant {
    pub post_url: String,
    pub form_fields: BTreeMap<String, String>,
    pub public_url: String,
}

/// Terminal result of one upload attempt
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UploadOutcome {
    Success { public_url: String },
    Rejected { reason: String },
    Failed { reason: String },
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success { .. })
    }

    pub fn public_url(&self) -> Option<&str> {
        match self {
            UploadOutcome::Success { public_url } => Some(public_url),
            _ => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            UploadOutcome::Success { .. } => None,
            UploadOutcome::Rejected { reason } | UploadOutcome::Failed { reason } => Some(reason),
        }
    }
}

impl From<&UploadError> for UploadOutcome {
    fn from(error: &UploadError) -> Self {
        let reason = error.to_string();
        if error.is_rejection() {
            UploadOutcome::Rejected { reason }
        } else {
            UploadOutcome::Failed { reason }
        }
    }
}

/// Notification broadcast by the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    /// A new attempt began; observers should drop whatever they showed for older attempts
    Started { attempt: u64, file_name: Option<String> },
    /// An attempt reached its terminal outcome
    Finished {
        attempt: u64,
        outcome: UploadOutcome,
        /// Localized text for non-success outcomes
        message: Option<String>,
    },
}

impl UploadEvent {
    pub fn attempt(&self) -> u64 {
        match self {
            UploadEvent::Started { attempt, .. } | UploadEvent::Finished { attempt, .. } => *attempt,
        }
    }
}
