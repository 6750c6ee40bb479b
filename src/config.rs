//! Uploader configuration.
//!
//! Priority for the signing endpoint: runtime env var > compile-time env var >
//! `config.json` > built-in default. Everything else comes from the file or
//! the defaults.

use crate::config_utils;
use crate::types::Locale;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const SIGNING_URL_ENV: &str = "DIRECT_UPLOAD_SIGNING_URL";

pub const DEFAULT_SIGNING_URL: &str = "http://localhost:8000/sign-upload";
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 5_000_000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_URL_INPUT_NAME: &str = "picture";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploaderConfig {
    /// Base URL of the signing endpoint; file name and MIME type are appended as path segments
    pub signing_url: String,
    /// Files of this size or larger are rejected before any request
    pub max_file_size_bytes: u64,
    /// Cap on a whole request, body transfer included. A large upload on a
    /// slow link needs a higher value.
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Name of the hidden form input that receives the public URL
    pub url_input_name: String,
    pub locale: Locale,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            signing_url: DEFAULT_SIGNING_URL.to_string(),
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            url_input_name: DEFAULT_URL_INPUT_NAME.to_string(),
            locale: Locale::default(),
        }
    }
}

impl UploaderConfig {
    /// Load from the platform config dir, then apply env overrides
    pub fn load() -> Result<Self, String> {
        let config = config_utils::load_config_file::<Self>(CONFIG_FILE_NAME)?
            .unwrap_or_default();
        Ok(config.with_env_overrides())
    }

    /// Load from an explicit path, then apply env overrides
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let config = config_utils::load_json_file::<Self>(path)?
            .unwrap_or_default();
        Ok(config.with_env_overrides())
    }

    /// Write to the platform config dir
    pub fn save(&self) -> Result<std::path::PathBuf, String> {
        config_utils::save_config_file(CONFIG_FILE_NAME, self)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        config_utils::save_json_file(path, self)
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(url) = env::var(SIGNING_URL_ENV)
            .ok()
            .or_else(|| option_env!("DIRECT_UPLOAD_SIGNING_URL").map(String::from))
            .filter(|s| !s.trim().is_empty())
        {
            self.signing_url = url;
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Build the HTTP client shared by the signing and storage calls.
    ///
    /// Includes the crate version in the User-Agent header.
    pub fn build_http_client(&self) -> reqwest::Client {
        let user_agent = format!("DirectUpload/{}", env!("CARGO_PKG_VERSION"));

        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout())
            .timeout(self.request_timeout())
            .user_agent(user_agent)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    }
}
