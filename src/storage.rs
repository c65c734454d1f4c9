//! Flat-file storage for analytics requests.
//!
//! Each request is written once, as pretty-printed JSON, to
//! `analytics_request_<YYYYMMDD_HHMMSS>.json`. Two saves within the same
//! second share a file name and the later one wins.

use crate::agent::TextGenerator;
use crate::clock::{Clock, SystemClock};
use crate::request::{AnalyticsRequest, RequestMetadata, RequestStatus};
use crate::summary::summarize_request;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const FILE_PREFIX: &str = "analytics_request_";
const FILE_FORMAT: &str = "analytics_request_%Y%m%d_%H%M%S.json";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result handed back to the conversational driver after a save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PersistOutcome {
    Success {
        message: String,
        file_path: PathBuf,
        summary: String,
    },
    Error {
        message: String,
    },
}

impl PersistOutcome {
    /// Error outcome for a request that could not be saved
    pub fn save_failed(cause: impl std::fmt::Display) -> Self {
        Self::Error {
            message: format!("Failed to save request: {}", cause),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success { message, .. } | Self::Error { message } => message,
        }
    }

    pub fn file_path(&self) -> Option<&Path> {
        match self {
            Self::Success { file_path, .. } => Some(file_path),
            Self::Error { .. } => None,
        }
    }
}

/// A request read back from disk
#[derive(Debug, Clone)]
pub struct StoredRequest {
    pub path: PathBuf,
    pub request: AnalyticsRequest,
}

/// Writes analytics requests into a directory.
pub struct RequestStore<C = SystemClock> {
    dir: PathBuf,
    clock: C,
}

impl RequestStore<SystemClock> {
    pub fn open<P: AsRef<Path>>(dir: P) -> Self {
        Self::with_clock(dir, SystemClock)
    }
}

impl<C: Clock> RequestStore<C> {
    pub fn with_clock<P: AsRef<Path>>(dir: P, clock: C) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            clock,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path a save started at `at` would write to
    pub fn path_for(&self, at: DateTime<Local>) -> PathBuf {
        self.dir.join(at.format(FILE_FORMAT).to_string())
    }

    /// Summarize, stamp and write `request`.
    ///
    /// Never fails: problems are reported through [`PersistOutcome::Error`].
    pub async fn persist(
        &self,
        generator: &dyn TextGenerator,
        mut request: AnalyticsRequest,
    ) -> PersistOutcome {
        tracing::info!(tool = "save_analytics_request", "saving analytics request");
        let path = self.path_for(self.clock.now());

        let summary = summarize_request(generator, &request).await;
        request.request_summary = Some(summary);
        request.metadata = Some(RequestMetadata {
            created_at: self.clock.now(),
            session_id: None,
            status: RequestStatus::PendingReview,
        });

        match write_request(&path, &request) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "analytics request saved");
                PersistOutcome::Success {
                    message: format!(
                        "Analytics request saved successfully to {}",
                        path.display()
                    ),
                    file_path: path,
                    summary: request.short_summary(),
                }
            }
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "failed to save analytics request"
                );
                PersistOutcome::save_failed(e)
            }
        }
    }

    /// Write `request` as-is under an explicit file name
    pub fn write_named(
        &self,
        file_name: &str,
        request: &AnalyticsRequest,
    ) -> Result<PathBuf, StorageError> {
        let path = self.dir.join(file_name);
        write_request(&path, request)?;
        Ok(path)
    }

    /// Read a single stored request
    pub fn load(&self, path: &Path) -> Result<AnalyticsRequest, StorageError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// List all stored requests, newest first.
    ///
    /// Files that do not parse as requests are skipped with a warning.
    pub fn list_all(&self) -> Result<Vec<StoredRequest>, StorageError> {
        let mut results = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_request = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(FILE_PREFIX) && name.ends_with(".json"));
            if !is_request {
                continue;
            }
            match self.load(&path) {
                Ok(request) => results.push(StoredRequest { path, request }),
                Err(e) => tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "skipping unreadable request"
                ),
            }
        }
        // Newest first; the file name carries the save time
        results.sort_by(|a, b| b.path.cmp(&a.path));
        Ok(results)
    }
}

/// Serialize with two-space indentation and write in one call
fn write_request(path: &Path, request: &AnalyticsRequest) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(request)?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, json)?;
    Ok(())
}
