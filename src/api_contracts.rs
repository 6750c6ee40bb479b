/**
 * API Contract Types for the signing service
 *
 * These types define the exact JSON returned by the backend endpoint that
 * issues storage POST policies. The backend is not part of this crate; if
 * its response shape changes, these structs are the only place to update.
 *
 * Principles:
 * - Keep the wire names (`data`, `fields`, `url`) as-is
 * - Convert into `SignedUploadGrant` immediately after parsing
 */

use crate::types::SignedUploadGrant;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Signing Endpoint
// =============================================================================

/// Storage POST policy issued by the provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostPolicy {
    pub url: String,                        // Storage endpoint to POST to
    #[serde(default)]
    pub fields: BTreeMap<String, String>,   // Provider-defined form fields, opaque
}

/// Response from `GET <signing_url>/<file_name>/<mime_type>`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SigningResponse {
    pub data: PostPolicy,
    pub url: String,                        // Public URL of the object once stored
}

impl SigningResponse {
    pub fn into_grant(self) -> SignedUploadGrant {
        SignedUploadGrant {
            post_url: self.data.url,
            form_fields: self.data.fields,
            public_url: self.url,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
