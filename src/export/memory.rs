use crate::export::traits::{check_name, ExportError, ExportResult, ExportSink};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory sink, for tests and for embedding without a filesystem
#[derive(Debug, Default)]
pub struct MemoryExportSink {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryExportSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the artifact contents as UTF-8 (lossy), if it exists
    pub fn contents(&self, name: &str) -> Option<String> {
        let files = self.files.lock().ok()?;
        files
            .get(name)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Names of all artifacts created so far
    pub fn names(&self) -> Vec<String> {
        match self.files.lock() {
            Ok(files) => {
                let mut names: Vec<String> = files.keys().cloned().collect();
                names.sort();
                names
            }
            Err(_) => Vec::new(),
        }
    }

    fn with_files<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, Vec<u8>>) -> ExportResult<T>,
    ) -> ExportResult<T> {
        let mut files = self.files.lock().map_err(|_| {
            ExportError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "export store lock poisoned",
            ))
        })?;
        f(&mut files)
    }
}

#[async_trait]
impl ExportSink for MemoryExportSink {
    async fn create(&self, name: &str) -> ExportResult<()> {
        check_name(name)?;
        self.with_files(|files| {
            files.insert(name.to_string(), Vec::new());
            Ok(())
        })
    }

    async fn append(&self, name: &str, bytes: &[u8]) -> ExportResult<()> {
        self.with_files(|files| match files.get_mut(name) {
            Some(buffer) => {
                buffer.extend_from_slice(bytes);
                Ok(())
            }
            None => Err(ExportError::NotCreated(name.to_string())),
        })
    }

    async fn finish(&self, name: &str) -> ExportResult<String> {
        self.with_files(|files| {
            if files.contains_key(name) {
                Ok(format!("memory://{}", name))
            } else {
                Err(ExportError::NotCreated(name.to_string()))
            }
        })
    }
}
