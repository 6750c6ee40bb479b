use crate::config_utils;
use crate::types::UploadOutcome;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const MAX_ENTRIES: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugLogEntry {
    pub timestamp: String,
    pub level: String,
    pub message: String,
    pub context: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugReport {
    pub generated_at: String,
    pub app_version: String,
    pub signing_url: Option<String>,
    pub last_outcome: Option<UploadOutcome>,
    pub error_count: usize,
    pub log_entries: Vec<DebugLogEntry>,
}

/// Keeps the most recent log lines in memory so they can be dumped into a
/// report, and forwards every line to `tracing`.
pub struct DebugLogger {
    logs: Arc<Mutex<Vec<DebugLogEntry>>>,
    error_count: Arc<Mutex<usize>>,
    last_outcome: Arc<Mutex<Option<UploadOutcome>>>,
}

impl DebugLogger {
    pub fn new() -> Self {
        Self {
            logs: Arc::new(Mutex::new(Vec::new())),
            error_count: Arc::new(Mutex::new(0)),
            last_outcome: Arc::new(Mutex::new(None)),
        }
    }

    pub fn log(&self, level: &str, message: String, context: Option<serde_json::Value>) {
        match level {
            "ERROR" => tracing::error!(context = ?context, "{}", message),
            "WARN" => tracing::warn!(context = ?context, "{}", message),
            "DEBUG" => tracing::debug!(context = ?context, "{}", message),
            _ => tracing::info!(context = ?context, "{}", message),
        }

        let entry = DebugLogEntry {
            timestamp: Utc::now().to_rfc3339(),
            level: level.to_string(),
            message,
            context,
        };

        if level == "ERROR" {
            if let Ok(mut count) = self.error_count.lock() {
                *count += 1;
            }
        }

        if let Ok(mut logs) = self.logs.lock() {
            if logs.len() >= MAX_ENTRIES {
                logs.remove(0);
            }
            logs.push(entry);
        }
    }

    pub fn info(&self, message: String) {
        self.log("INFO", message, None);
    }

    pub fn warn(&self, message: String) {
        self.log("WARN", message, None);
    }

    pub fn error(&self, message: String) {
        self.log("ERROR", message, None);
    }

    pub fn debug(&self, message: String) {
        self.log("DEBUG", message, None);
    }

    /// Remember the outcome of the latest attempt for the next report
    pub fn record_outcome(&self, outcome: &UploadOutcome) {
        let context = serde_json::to_value(outcome).ok();
        match outcome {
            UploadOutcome::Success { public_url } => {
                self.log("INFO", format!("Upload succeeded: {}", public_url), context);
            }
            UploadOutcome::Rejected { reason } => {
                self.log("WARN", format!("Upload rejected: {}", reason), context);
            }
            UploadOutcome::Failed { reason } => {
                self.log("ERROR", format!("Upload failed: {}", reason), context);
            }
        }

        if let Ok(mut last) = self.last_outcome.lock() {
            *last = Some(outcome.clone());
        }
    }

    pub fn get_error_count(&self) -> usize {
        *self.error_count.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn entry_count(&self) -> usize {
        self.logs.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn generate_report(&self, signing_url: Option<String>) -> DebugReport {
        let logs = self.logs.lock().unwrap_or_else(|e| e.into_inner()).clone();
        let last_outcome = self.last_outcome.lock().unwrap_or_else(|e| e.into_inner()).clone();

        DebugReport {
            generated_at: Utc::now().to_rfc3339(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            signing_url,
            last_outcome,
            error_count: self.get_error_count(),
            log_entries: logs,
        }
    }

    /// Write a report into the default logs directory
    pub fn save_report_to_file(&self, signing_url: Option<String>) -> Result<PathBuf, String> {
        let logs_dir = config_utils::get_logs_dir()?;
        self.save_report_in(&logs_dir, signing_url)
    }

    pub fn save_report_in(&self, logs_dir: &Path, signing_url: Option<String>) -> Result<PathBuf, String> {
        let report = self.generate_report(signing_url);

        fs::create_dir_all(logs_dir)
            .map_err(|e| format!("Failed to create logs directory: {}", e))?;

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let log_path = logs_dir.join(format!("debug_log_{}.json", timestamp));

        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Failed to serialize report: {}", e))?;

        let mut file = File::create(&log_path)
            .map_err(|e| format!("Failed to create log file: {}", e))?;

        file.write_all(json.as_bytes())
            .map_err(|e| format!("Failed to write to log file: {}", e))?;

        Ok(log_path)
    }
}

impl Default for DebugLogger {
    fn default() -> Self {
        Self::new()
    }
}
