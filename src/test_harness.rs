//! Integration test harness for mock signing and storage servers
//!
//! Both endpoints live on one mockito server: the signing service under
//! `/sign-upload` and the storage bucket under `/bucket`.

use crate::config::UploaderConfig;
use crate::debug_logger::DebugLogger;
use crate::services::UploadCoordinator;
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::json;
use std::sync::Arc;

pub const SIGNING_PATH: &str = "/sign-upload";
pub const BUCKET_PATH: &str = "/bucket";

/// A test harness that sets up mock API servers for integration testing
pub struct TestHarness {
    pub server: ServerGuard,
}

impl TestHarness {
    /// Create a new test harness with a mock server
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        Self { server }
    }

    /// Get the mock server URL
    pub fn url(&self) -> String {
        self.server.url()
    }

    pub fn signing_url(&self) -> String {
        format!("{}{}", self.url(), SIGNING_PATH)
    }

    pub fn bucket_url(&self) -> String {
        format!("{}{}", self.url(), BUCKET_PATH)
    }

    /// Coordinator wired to this server with default limits
    pub fn coordinator(&self) -> UploadCoordinator {
        self.coordinator_with(UploaderConfig::default())
    }

    pub fn coordinator_with(&self, config: UploaderConfig) -> UploadCoordinator {
        let config = UploaderConfig {
            signing_url: self.signing_url(),
            request_timeout_secs: 5,
            ..config
        };
        UploadCoordinator::from_config(&config, Arc::new(DebugLogger::new()))
    }

    /// Path matcher for `GET /sign-upload/<file_name>/<mime_type>`
    fn grant_path(file_name: &str, mime_type: &str) -> Matcher {
        let (kind, subtype) = mime_type.split_once('/').unwrap_or((mime_type, ""));
        Matcher::Regex(format!(
            r"^{}/{}/{}(%2F|/){}$",
            SIGNING_PATH,
            regex::escape(file_name),
            regex::escape(kind),
            regex::escape(subtype)
        ))
    }

    /// Mock the signing endpoint returning a grant for the bucket
    pub async fn mock_grant(
        &mut self,
        file_name: &str,
        mime_type: &str,
        fields: serde_json::Value,
        public_url: &str,
    ) -> Mock {
        self.mock_grant_with_status(200, file_name, mime_type, fields, public_url).await
    }

    /// Like `mock_grant`, but answering with `status`
    pub async fn mock_grant_with_status(
        &mut self,
        status: usize,
        file_name: &str,
        mime_type: &str,
        fields: serde_json::Value,
        public_url: &str,
    ) -> Mock {
        let bucket_url = self.bucket_url();
        self.server.mock("GET", Self::grant_path(file_name, mime_type))
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(json!({
                "data": {
                    "url": bucket_url,
                    "fields": fields
                },
                "url": public_url
            }).to_string())
            .create_async()
            .await
    }

    /// Mock the signing endpoint refusing the request
    pub async fn mock_grant_failure(&mut self, status: usize) -> Mock {
        self.server.mock("GET", Matcher::Regex(format!("^{}/", SIGNING_PATH)))
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(json!({ "error": "File type not allowed" }).to_string())
            .create_async()
            .await
    }

    /// Signing endpoint that must not be contacted
    pub async fn mock_grant_never_called(&mut self) -> Mock {
        self.server.mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await
    }

    /// Mock the bucket answering the multipart POST with `status`
    pub async fn mock_storage(&mut self, status: usize) -> Mock {
        self.server.mock("POST", BUCKET_PATH)
            .match_header("content-type", Matcher::Regex("^multipart/form-data; boundary=".to_string()))
            .with_status(status)
            .create_async()
            .await
    }

    /// Bucket that must not be contacted
    pub async fn mock_storage_never_called(&mut self) -> Mock {
        self.server.mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SelectedFile, UploadEvent, UploadOutcome};
    use crate::error::UploadError;
    use crate::state::UploadPhase;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_avatar_upload_succeeds() {
        let mut harness = TestHarness::new().await;
        let grant = harness.mock_grant(
            "avatar.png",
            "image/png",
            json!({"key": "avatar.png"}),
            "https://cdn/avatar.png",
        ).await;
        let storage = harness.mock_storage(204).await;

        let coordinator = harness.coordinator();
        let file = SelectedFile::from_bytes("avatar.png", "image/png", vec![0; 4_000_000]);
        let outcome = coordinator.select_file(Some(file)).await;

        assert_eq!(outcome, UploadOutcome::Success { public_url: "https://cdn/avatar.png".to_string() });
        assert_eq!(
            coordinator.state().phase,
            UploadPhase::Succeeded { public_url: "https://cdn/avatar.png".to_string() }
        );
        grant.assert_async().await;
        storage.assert_async().await;
    }

    #[tokio::test]
    async fn test_storage_200_is_success() {
        let mut harness = TestHarness::new().await;
        let _grant = harness.mock_grant("a.jpg", "image/jpeg", json!({}), "https://cdn/a.jpg").await;
        let _storage = harness.mock_storage(200).await;

        let file = SelectedFile::from_bytes("a.jpg", "image/jpeg", b"jpeg".to_vec());
        let outcome = harness.coordinator().select_file(Some(file)).await;

        assert_eq!(outcome.public_url(), Some("https://cdn/a.jpg"));
    }

    #[tokio::test]
    async fn test_multipart_body_fields_before_file() {
        let mut harness = TestHarness::new().await;
        let _grant = harness.mock_grant(
            "notes.txt",
            "text/plain",
            json!({"key": "media/notes.txt", "policy": "cG9saWN5", "x-amz-signature": "sig"}),
            "https://cdn/media/notes.txt",
        ).await;
        let storage = harness.server.mock("POST", BUCKET_PATH)
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"(?s)name="key"\r\n\r\nmedia/notes\.txt\r\n.*name="file"; filename="notes\.txt""#.to_string()),
                Matcher::Regex(r#"(?s)name="policy"\r\n\r\ncG9saWN5\r\n.*name="file""#.to_string()),
                Matcher::Regex(r#"(?s)name="x-amz-signature"\r\n\r\nsig\r\n.*name="file""#.to_string()),
                Matcher::Regex(r"(?s)Content-Type: text/plain\r\n\r\nhello storage".to_string()),
            ]))
            .with_status(204)
            .create_async()
            .await;

        let file = SelectedFile::from_bytes("notes.txt", "text/plain", b"hello storage".to_vec());
        let outcome = harness.coordinator().select_file(Some(file)).await;

        assert!(outcome.is_success(), "unexpected outcome: {:?}", outcome);
        storage.assert_async().await;
    }

    #[tokio::test]
    async fn test_path_backed_file_is_read_at_upload() {
        let mut harness = TestHarness::new().await;
        let _grant = harness.mock_grant("photo.png", "image/png", json!({"key": "photo.png"}), "https://cdn/photo.png").await;
        let storage = harness.server.mock("POST", BUCKET_PATH)
            .match_body(Matcher::Regex("from disk".to_string()))
            .with_status(204)
            .create_async()
            .await;

        let temp_dir = TempDir::new().unwrap();
        let path = create_test_file(temp_dir.path(), "photo.png", b"bytes from disk");
        let file = SelectedFile::from_path(&path, None).await.unwrap();

        let outcome = harness.coordinator().select_file(Some(file)).await;

        assert_eq!(outcome.public_url(), Some("https://cdn/photo.png"));
        storage.assert_async().await;
    }

    #[tokio::test]
    async fn test_file_too_large_makes_no_requests() {
        let mut harness = TestHarness::new().await;
        let signing = harness.mock_grant_never_called().await;
        let storage = harness.mock_storage_never_called().await;

        let file = SelectedFile::from_bytes("huge.png", "image/png", vec![0; 6_000_000]);
        let outcome = harness.coordinator().select_file(Some(file)).await;

        assert_eq!(outcome, UploadOutcome::Rejected { reason: "file too large".to_string() });
        signing.assert_async().await;
        storage.assert_async().await;
    }

    #[tokio::test]
    async fn test_configured_limit_is_enforced() {
        let mut harness = TestHarness::new().await;
        let signing = harness.mock_grant_never_called().await;

        let coordinator = harness.coordinator_with(UploaderConfig {
            max_file_size_bytes: 10,
            ..Default::default()
        });
        let file = SelectedFile::from_bytes("small.png", "image/png", vec![0; 10]);
        let outcome = coordinator.select_file(Some(file)).await;

        assert_eq!(outcome.reason(), Some("file too large"));
        signing.assert_async().await;
    }

    #[tokio::test]
    async fn test_grant_forbidden_is_rejected() {
        let mut harness = TestHarness::new().await;
        let signing = harness.mock_grant_failure(403).await;
        let storage = harness.mock_storage_never_called().await;

        let file = SelectedFile::from_bytes("doc.pdf", "application/pdf", vec![0; 1000]);
        let outcome = harness.coordinator().select_file(Some(file)).await;

        assert!(matches!(outcome, UploadOutcome::Rejected { .. }));
        assert!(outcome.reason().unwrap().starts_with("unexpected response"));
        signing.assert_async().await;
        storage.assert_async().await;
    }

    #[tokio::test]
    async fn test_grant_server_error_is_rejected() {
        let mut harness = TestHarness::new().await;
        let _signing = harness.mock_grant_failure(500).await;
        let storage = harness.mock_storage_never_called().await;

        let file = SelectedFile::from_bytes("a.png", "image/png", b"png".to_vec());
        let outcome = harness.coordinator().select_file(Some(file)).await;

        assert_eq!(
            outcome,
            UploadOutcome::Rejected { reason: "unexpected response; file likely rejected by type policy".to_string() }
        );
        storage.assert_async().await;
    }

    #[tokio::test]
    async fn test_grant_with_other_2xx_is_rejected() {
        for status in [201, 202, 204] {
            let mut harness = TestHarness::new().await;
            let signing = harness.mock_grant_with_status(
                status,
                "a.png",
                "image/png",
                json!({"key": "a.png"}),
                "https://cdn/a.png",
            ).await;
            let storage = harness.mock_storage_never_called().await;

            let file = SelectedFile::from_bytes("a.png", "image/png", b"png".to_vec());
            let outcome = harness.coordinator().select_file(Some(file)).await;

            assert_eq!(
                outcome,
                UploadOutcome::Rejected { reason: "unexpected response; file likely rejected by type policy".to_string() },
                "status {}",
                status
            );
            signing.assert_async().await;
            storage.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_grant_malformed_body_is_rejected() {
        let mut harness = TestHarness::new().await;
        let _signing = harness.server.mock("GET", Matcher::Regex(format!("^{}/", SIGNING_PATH)))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"unexpected": true}"#)
            .create_async()
            .await;
        let storage = harness.mock_storage_never_called().await;

        let file = SelectedFile::from_bytes("a.png", "image/png", b"png".to_vec());
        let outcome = harness.coordinator().select_file(Some(file)).await;

        assert!(matches!(outcome, UploadOutcome::Rejected { .. }));
        storage.assert_async().await;
    }

    #[tokio::test]
    async fn test_storage_rejection_is_failure() {
        for status in [201, 400, 403, 500] {
            let mut harness = TestHarness::new().await;
            let _grant = harness.mock_grant("a.png", "image/png", json!({"key": "a.png"}), "https://cdn/a.png").await;
            let _storage = harness.mock_storage(status).await;

            let file = SelectedFile::from_bytes("a.png", "image/png", b"png".to_vec());
            let coordinator = harness.coordinator();
            let outcome = coordinator.select_file(Some(file)).await;

            assert_eq!(
                outcome,
                UploadOutcome::Failed { reason: "upload rejected by storage endpoint".to_string() },
                "status {}",
                status
            );
            assert!(matches!(coordinator.state().phase, UploadPhase::Failed { .. }));
        }
    }

    #[tokio::test]
    async fn test_no_file_after_success_makes_no_requests() {
        let mut harness = TestHarness::new().await;
        let grant = harness.mock_grant("a.png", "image/png", json!({}), "https://cdn/a.png").await;
        let storage = harness.mock_storage(204).await;

        let coordinator = harness.coordinator();
        let file = SelectedFile::from_bytes("a.png", "image/png", b"png".to_vec());
        assert!(coordinator.select_file(Some(file)).await.is_success());

        let outcome = coordinator.select_file(None).await;
        assert_eq!(outcome.reason(), Some("no file selected"));

        grant.assert_async().await;
        storage.assert_async().await;
    }

    #[tokio::test]
    async fn test_request_signed_grant_directly() {
        let mut harness = TestHarness::new().await;
        let _grant = harness.mock_grant(
            "avatar.png",
            "image/png",
            json!({"key": "avatar.png", "acl": "public-read"}),
            "https://cdn/avatar.png",
        ).await;

        let grant = harness.coordinator()
            .request_signed_grant("avatar.png", "image/png")
            .await
            .unwrap();

        assert_eq!(grant.post_url, harness.bucket_url());
        assert_eq!(grant.public_url, "https://cdn/avatar.png");
        assert_eq!(grant.form_fields.len(), 2);
    }

    #[tokio::test]
    async fn test_upload_binary_unreachable_storage() {
        let harness = TestHarness::new().await;
        let grant = crate::types::SignedUploadGrant {
            post_url: "http://127.0.0.1:9/bucket".to_string(),
            form_fields: Default::default(),
            public_url: "https://cdn/a.png".to_string(),
        };
        let file = SelectedFile::from_bytes("a.png", "image/png", b"png".to_vec());

        let result = harness.coordinator().upload_binary(&file, &grant).await;
        assert!(matches!(result, Err(UploadError::UploadRejected { .. })));
    }

    #[tokio::test]
    async fn test_success_event_carries_public_url() {
        let mut harness = TestHarness::new().await;
        let _grant = harness.mock_grant("a.png", "image/png", json!({}), "https://cdn/a.png").await;
        let _storage = harness.mock_storage(204).await;

        let coordinator = harness.coordinator();
        let mut events = coordinator.subscribe();

        let file = SelectedFile::from_bytes("a.png", "image/png", b"png".to_vec());
        coordinator.select_file(Some(file)).await;

        assert_eq!(
            events.recv().await.unwrap(),
            UploadEvent::Started { attempt: 1, file_name: Some("a.png".to_string()) }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            UploadEvent::Finished {
                attempt: 1,
                outcome: UploadOutcome::Success { public_url: "https://cdn/a.png".to_string() },
                message: None,
            }
        );
    }
}
