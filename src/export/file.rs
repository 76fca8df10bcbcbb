use crate::export::traits::{check_name, ExportError, ExportResult, ExportSink};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Writes artifacts under a directory and serves them from a URL prefix
#[derive(Debug, Clone)]
pub struct FileExportSink {
    directory: PathBuf,
    url_prefix: String,
}

impl FileExportSink {
    /// Creates a sink writing to `directory`; addresses are `{url_prefix}/{name}`
    ///
    /// The directory is created on first use.
    pub fn new(directory: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, name: &str) -> ExportResult<PathBuf> {
        check_name(name)?;
        Ok(self.directory.join(name))
    }
}

#[async_trait]
impl ExportSink for FileExportSink {
    async fn create(&self, name: &str) -> ExportResult<()> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.directory).await?;
        fs::File::create(&path).await?;
        tracing::debug!("Created export file {}", path.display());
        Ok(())
    }

    async fn append(&self, name: &str, bytes: &[u8]) -> ExportResult<()> {
        let path = self.path_for(name)?;
        let mut file = OpenOptions::new()
            .append(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ExportError::NotCreated(name.to_string()),
                _ => ExportError::Io(e),
            })?;
        file.write_all(bytes).await?;
        file.flush().await?;
        Ok(())
    }

    async fn finish(&self, name: &str) -> ExportResult<String> {
        let path = self.path_for(name)?;
        if fs::metadata(&path).await.is_err() {
            return Err(ExportError::NotCreated(name.to_string()));
        }
        Ok(format!("{}/{}", self.url_prefix, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_append_finish() {
        let dir = TempDir::new().unwrap();
        let sink = FileExportSink::new(dir.path().join("export"), "/export/");

        sink.create("doc.txt").await.unwrap();
        sink.append("doc.txt", b"# Title\n").await.unwrap();
        sink.append("doc.txt", b"body\n").await.unwrap();
        let address = sink.finish("doc.txt").await.unwrap();

        assert_eq!(address, "/export/doc.txt");
        let written = std::fs::read_to_string(dir.path().join("export/doc.txt")).unwrap();
        assert_eq!(written, "# Title\nbody\n");
    }

    #[tokio::test]
    async fn test_append_without_create_fails() {
        let dir = TempDir::new().unwrap();
        let sink = FileExportSink::new(dir.path(), "/export");

        let result = sink.append("missing.txt", b"x").await;
        assert!(matches!(result, Err(ExportError::NotCreated(_))));
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let sink = FileExportSink::new(dir.path(), "/export");

        let result = sink.create("../escape.txt").await;
        assert!(matches!(result, Err(ExportError::InvalidName(_))));
    }
}
