//! Error taxonomy for a single upload attempt.
//!
//! Every error is terminal. Transport failures and permanent rejections are
//! deliberately folded into the same kinds; the `detail` strings only go to
//! the logs.

use crate::types::Locale;
use thiserror::Error;

/// Why an upload attempt did not produce a public URL
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("no file selected")]
    NoFileSelected,

    #[error("file too large")]
    FileTooLarge { size_bytes: u64, max_bytes: u64 },

    #[error("unexpected response; file likely rejected by type policy")]
    GrantRequestRejected { detail: String },

    #[error("upload rejected by storage endpoint")]
    UploadRejected { detail: String },
}

impl UploadError {
    /// Rejections happen before any bytes are sent to storage
    pub fn is_rejection(&self) -> bool {
        !matches!(self, UploadError::UploadRejected { .. })
    }

    /// Diagnostic detail for logs, if the variant carries any
    pub fn detail(&self) -> Option<String> {
        match self {
            UploadError::NoFileSelected => None,
            UploadError::FileTooLarge { size_bytes, max_bytes } => {
                Some(format!("{} bytes (limit {})", size_bytes, max_bytes))
            }
            UploadError::GrantRequestRejected { detail }
            | UploadError::UploadRejected { detail } => Some(detail.clone()),
        }
    }

    /// Message shown to the end user
    pub fn user_message(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (UploadError::NoFileSelected, Locale::English) => "No file selected.",
            (UploadError::NoFileSelected, Locale::Spanish) => "No se seleccionó ningún archivo.",
            (UploadError::FileTooLarge { .. }, Locale::English) => {
                "The file is too large. Please choose a smaller file."
            }
            (UploadError::FileTooLarge { .. }, Locale::Spanish) => {
                "El archivo es demasiado grande. Elige un archivo más pequeño."
            }
            (UploadError::GrantRequestRejected { .. }, Locale::English) => {
                "Unexpected response. The file type is probably not allowed."
            }
            (UploadError::GrantRequestRejected { .. }, Locale::Spanish) => {
                "Respuesta inesperada. Probablemente el tipo de archivo no está permitido."
            }
            (UploadError::UploadRejected { .. }, Locale::English) => {
                "The storage service rejected the upload."
            }
            (UploadError::UploadRejected { .. }, Locale::Spanish) => {
                "El servicio de almacenamiento rechazó la subida."
            }
        }
    }
}
