use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::StorageError;

/// Reads previously stored files back for processing.
#[async_trait]
pub trait StorageReader: Send + Sync {
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, StorageError>;
}

/// Local directory holding uploaded PDFs and rendered exports.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `content` to `{root}/{relative_directory}/{filename}`, refusing
    /// to overwrite an existing file.
    pub async fn store(
        &self,
        relative_directory: &str,
        filename: &str,
        content: &[u8],
    ) -> Result<PathBuf, StorageError> {
        let dir_path = self.root.join(relative_directory);
        ensure_directory(&dir_path).await?;

        let file_path = dir_path.join(filename);
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file_path)
            .await
            .map_err(|e| StorageError::WriteFile {
                path: file_path.clone(),
                source: e,
            })?;

        file.write_all(content)
            .await
            .map_err(|e| StorageError::WriteFile {
                path: file_path.clone(),
                source: e,
            })?;
        file.flush().await.map_err(|e| StorageError::WriteFile {
            path: file_path.clone(),
            source: e,
        })?;

        Ok(file_path)
    }
}

#[async_trait]
impl StorageReader for FileStorage {
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        tokio::fs::read(path)
            .await
            .map_err(|e| StorageError::ReadFile {
                path: path.to_path_buf(),
                source: e,
            })
    }
}

async fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })
}
