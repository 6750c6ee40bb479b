//! Upload phase enum representing the steps of a single attempt.

/// Where the current attempt stands
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum UploadPhase {
    /// Nothing selected yet
    #[default]
    Idle,
    /// Checking the selection locally
    Validating,
    /// Waiting for the signing service
    AwaitingGrant { file_name: String },
    /// Sending the file to storage
    Uploading { file_name: String },
    /// Stored; `public_url` is where the object can be fetched
    Succeeded { public_url: String },
    /// Refused before any bytes reached storage
    Rejected { reason: String },
    /// Storage refused the file
    Failed { reason: String },
}

impl UploadPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadPhase::Succeeded { .. } | UploadPhase::Rejected { .. } | UploadPhase::Failed { .. }
        )
    }

    /// Whether an attempt may move from `self` to `next`.
    ///
    /// A new attempt can only start from `Idle` or a terminal phase; there is
    /// no edge back into an earlier step of the same attempt.
    pub fn can_transition_to(&self, next: &UploadPhase) -> bool {
        use UploadPhase::*;

        match (self, next) {
            (Idle, Validating) => true,
            (from, Validating) if from.is_terminal() => true,
            (Validating, AwaitingGrant { .. }) | (Validating, Rejected { .. }) => true,
            (AwaitingGrant { .. }, Uploading { .. }) | (AwaitingGrant { .. }, Rejected { .. }) => true,
            (Uploading { .. }, Succeeded { .. }) | (Uploading { .. }, Failed { .. }) => true,
            _ => false,
        }
    }
}
