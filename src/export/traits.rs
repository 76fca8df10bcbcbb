//! Export sink trait and error types
//!
//! A sink receives the assembled multi-page document as an append-only byte
//! stream under a per-run file name and hands back an address the caller can
//! download it from.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Errors that can occur during export operations
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid export file name: {0}")]
    InvalidName(String),

    #[error("Export file not created: {0}")]
    NotCreated(String),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Destination for assembled documents
///
/// Implementations must be safe to share between concurrent runs; each run
/// writes to its own file name.
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// Creates (or truncates) the artifact `name`
    async fn create(&self, name: &str) -> ExportResult<()>;

    /// Appends `bytes` to an artifact previously created
    async fn append(&self, name: &str, bytes: &[u8]) -> ExportResult<()>;

    /// Completes the artifact and returns its retrievable address
    async fn finish(&self, name: &str) -> ExportResult<String>;
}

static EXPORT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generates a unique artifact name: `llms-full-{millis}-{seq}.txt`
///
/// The sequence number is process-wide, so two runs started in the same
/// millisecond still get different names.
pub fn export_file_name() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let seq = EXPORT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("llms-full-{}-{}.txt", millis, seq)
}

/// Rejects names that could escape the export directory
pub(crate) fn check_name(name: &str) -> ExportResult<()> {
    let valid = !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.starts_with('.');

    if valid {
        Ok(())
    } else {
        Err(ExportError::InvalidName(name.to_string()))
    }
}
