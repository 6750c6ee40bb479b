//! Client side of the signing endpoint that issues storage POST policies.

use crate::api_contracts::SigningResponse;
use crate::error::UploadError;
use crate::types::SignedUploadGrant;
use async_trait::async_trait;

/// Issues storage POST policies for a file name and MIME type
#[async_trait]
pub trait SigningService: Send + Sync {
    async fn request_grant(
        &self,
        file_name: &str,
        mime_type: &str,
    ) -> Result<SignedUploadGrant, UploadError>;
}

/// HTTP client for the signing endpoint
pub struct HttpSigningService {
    signing_url: String,
    client: reqwest::Client,
}

impl HttpSigningService {
    pub fn new(signing_url: String, client: reqwest::Client) -> Self {
        Self { signing_url, client }
    }

    /// Build `<signing_url>/<file_name>/<mime_type>`.
    ///
    /// Each value is pushed as a single path segment, so the `/` of a MIME
    /// type and any special characters in the file name are percent-encoded.
    fn grant_url(&self, file_name: &str, mime_type: &str) -> Result<reqwest::Url, String> {
        let mut url = reqwest::Url::parse(&self.signing_url)
            .map_err(|e| format!("Invalid signing URL: {}", e))?;

        url.path_segments_mut()
            .map_err(|_| "Signing URL cannot be a base".to_string())?
            .pop_if_empty()
            .push(file_name)
            .push(mime_type);

        Ok(url)
    }
}

#[async_trait]
impl SigningService for HttpSigningService {
    async fn request_grant(
        &self,
        file_name: &str,
        mime_type: &str,
    ) -> Result<SignedUploadGrant, UploadError> {
        let url = self.grant_url(file_name, mime_type)
            .map_err(|detail| UploadError::GrantRequestRejected { detail })?;

        tracing::debug!(%url, "Requesting signed upload grant");

        let response = self.client
            .get(url)
            .send()
            .await
            .map_err(|e| UploadError::GrantRequestRejected {
                detail: format!("Network error: {}", e),
            })?;

        // The contract is a plain 200; any other status means no grant
        if response.status() != reqwest::StatusCode::OK {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(UploadError::GrantRequestRejected {
                detail: format!("Signing service returned {}: {}", status, error_text),
            });
        }

        let data: SigningResponse = response
            .json()
            .await
            .map_err(|e| UploadError::GrantRequestRejected {
                detail: format!("Failed to parse response: {}", e),
            })?;

        Ok(data.into_grant())
    }
}
