//! POST of the file itself to the storage provider.

use crate::error::UploadError;
use crate::types::{SelectedFile, SignedUploadGrant};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;

/// Statuses the storage provider uses to acknowledge a policy upload
pub fn is_accepted_status(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::NO_CONTENT
}

/// Builds the multipart body and sends it to the grant's POST URL
#[derive(Clone)]
pub struct StorageUploader {
    client: reqwest::Client,
}

impl StorageUploader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Every policy field goes first, the `file` part last. Providers
    /// ignore fields that follow the file.
    ///
    /// An unparsable MIME type leaves the part without a content type.
    pub fn build_form(
        grant: &SignedUploadGrant,
        file: &SelectedFile,
        content: Vec<u8>,
    ) -> Result<Form, UploadError> {
        let mut form = Form::new();
        for (name, value) in &grant.form_fields {
            form = form.text(name.clone(), value.clone());
        }

        let part = Part::bytes(content).file_name(file.name.clone());
        let part = if file.mime_type.parse::<mime_guess::Mime>().is_ok() {
            part.mime_str(&file.mime_type)
                .map_err(|e| UploadError::UploadRejected {
                    detail: format!("Invalid content type: {}", e),
                })?
        } else {
            part
        };

        Ok(form.part("file", part))
    }

    /// Upload the file and return the grant's public URL
    pub async fn upload(&self, file: &SelectedFile, grant: &SignedUploadGrant) -> Result<String, UploadError> {
        let content = file.read_content()
            .await
            .map_err(|detail| UploadError::UploadRejected { detail })?;

        let form = Self::build_form(grant, file, content)?;

        let response = self.client
            .post(&grant.post_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::UploadRejected {
                detail: format!("Network error: {}", e),
            })?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "Storage endpoint responded");

        if !is_accepted_status(status) {
            let error_text = response.text().await.unwrap_or_default();
            return Err(UploadError::UploadRejected {
                detail: format!("Storage returned {}: {}", status, error_text),
            });
        }

        Ok(grant.public_url.clone())
    }
}
