//! Upload coordination service
//!
//! Drives one selected file through validation, grant acquisition and the
//! storage POST, and reports exactly one terminal outcome per attempt to the
//! subscribers.

use crate::config::UploaderConfig;
use crate::debug_logger::DebugLogger;
use crate::error::UploadError;
use crate::signing_client::{HttpSigningService, SigningService};
use crate::state::{UploadPhase, UploadState, UploadStateManager};
use crate::storage_uploader::StorageUploader;
use crate::types::{Locale, SelectedFile, SignedUploadGrant, UploadEvent, UploadOutcome, UploadRequest};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Owns the single-file upload lifecycle
pub struct UploadCoordinator {
    signing: Arc<dyn SigningService>,
    storage: StorageUploader,
    max_file_size_bytes: u64,
    locale: Locale,
    state: UploadStateManager,
    events: broadcast::Sender<UploadEvent>,
    // Held for the whole attempt so only one runs at a time
    active: Mutex<()>,
    logger: Arc<DebugLogger>,
}

impl UploadCoordinator {
    pub fn new(
        signing: Arc<dyn SigningService>,
        storage: StorageUploader,
        config: &UploaderConfig,
        logger: Arc<DebugLogger>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            signing,
            storage,
            max_file_size_bytes: config.max_file_size_bytes,
            locale: config.locale,
            state: UploadStateManager::new(),
            events,
            active: Mutex::new(()),
            logger,
        }
    }

    /// Coordinator talking HTTP to the configured signing endpoint
    pub fn from_config(config: &UploaderConfig, logger: Arc<DebugLogger>) -> Self {
        let client = config.build_http_client();
        let signing = HttpSigningService::new(config.signing_url.clone(), client.clone());

        Self::new(Arc::new(signing), StorageUploader::new(client), config, logger)
    }

    /// Receive every event from now on. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<UploadEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> UploadState {
        self.state.snapshot()
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Run one full attempt for the selected file.
    ///
    /// `None` means the user cleared the selection; it is rejected without
    /// touching the network.
    pub async fn select_file(&self, file: Option<SelectedFile>) -> UploadOutcome {
        let _active = self.active.lock().await;

        let attempt = self.state.begin_attempt();
        let file_name = file.as_ref().map(|f| f.name.clone());

        self.logger.info(format!(
            "[attempt {}] File selected: {}",
            attempt,
            file_name.as_deref().unwrap_or("<none>")
        ));
        let _ = self.events.send(UploadEvent::Started { attempt, file_name });

        let result = self.run_attempt(file).await;
        self.finish(attempt, result)
    }

    async fn run_attempt(&self, file: Option<SelectedFile>) -> Result<String, UploadError> {
        let file = file.ok_or(UploadError::NoFileSelected)?;
        let request = self.validate(&file)?;

        self.enter(UploadPhase::AwaitingGrant { file_name: request.file_name.clone() });
        let grant = self.request_signed_grant(&request.file_name, &request.mime_type).await?;

        self.enter(UploadPhase::Uploading { file_name: request.file_name.clone() });
        self.upload_binary(&file, &grant).await
    }

    /// Check the selection against the size limit
    pub fn validate(&self, file: &SelectedFile) -> Result<UploadRequest, UploadError> {
        let request = UploadRequest::validate(file, self.max_file_size_bytes)?;
        self.logger.debug(format!(
            "Validated {} ({}, {} bytes)",
            request.file_name, request.mime_type, request.size_bytes
        ));
        Ok(request)
    }

    /// Ask the signing service for a POST policy
    pub async fn request_signed_grant(
        &self,
        file_name: &str,
        mime_type: &str,
    ) -> Result<SignedUploadGrant, UploadError> {
        let grant = self.signing.request_grant(file_name, mime_type).await?;
        self.logger.debug(format!(
            "Grant received: POST {} with {} field(s)",
            grant.post_url,
            grant.form_fields.len()
        ));
        Ok(grant)
    }

    /// POST the file to storage and return the public URL
    pub async fn upload_binary(
        &self,
        file: &SelectedFile,
        grant: &SignedUploadGrant,
    ) -> Result<String, UploadError> {
        self.logger.info(format!("Uploading {} to {}", file.name, grant.post_url));
        self.storage.upload(file, grant).await
    }

    /// Record the terminal phase, log it and notify subscribers
    fn finish(&self, attempt: u64, result: Result<String, UploadError>) -> UploadOutcome {
        let (outcome, message) = match result {
            Ok(public_url) => (UploadOutcome::Success { public_url }, None),
            Err(error) => {
                if let Some(detail) = error.detail() {
                    self.logger.debug(format!("[attempt {}] {}: {}", attempt, error, detail));
                }
                (
                    UploadOutcome::from(&error),
                    Some(error.user_message(self.locale).to_string()),
                )
            }
        };

        let phase = match &outcome {
            UploadOutcome::Success { public_url } => UploadPhase::Succeeded { public_url: public_url.clone() },
            UploadOutcome::Rejected { reason } => UploadPhase::Rejected { reason: reason.clone() },
            UploadOutcome::Failed { reason } => UploadPhase::Failed { reason: reason.clone() },
        };
        self.enter(phase);

        self.logger.record_outcome(&outcome);
        let _ = self.events.send(UploadEvent::Finished {
            attempt,
            outcome: outcome.clone(),
            message,
        });

        outcome
    }

    fn enter(&self, next: UploadPhase) {
        if let Err(kept) = self.state.transition(next.clone()) {
            self.logger.error(format!("Refused phase change {:?} -> {:?}", kept, next));
        }
    }
}
