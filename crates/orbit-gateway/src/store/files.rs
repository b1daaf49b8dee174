//! Uploaded file storage.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use super::{FileStore, StoreError, StoreResult};

const UPLOAD_PREFIX: &str = "documents";
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// `report.pdf`, attempt 2 -> `report_2.pdf`.
fn candidate_name(file_name: &str, attempt: u32) -> String {
    if attempt == 0 {
        return file_name.to_string();
    }
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}_{attempt}.{ext}"),
        _ => format!("{file_name}_{attempt}"),
    }
}

#[derive(Default)]
pub struct InMemoryFileStore {
    files: RwLock<HashMap<String, Bytes>>,
}

impl InMemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    async fn put(&self, file_name: &str, body: Bytes) -> StoreResult<String> {
        let mut files = self.files.write().await;
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = format!("{UPLOAD_PREFIX}/{}", candidate_name(file_name, attempt));
            if !files.contains_key(&path) {
                files.insert(path.clone(), body);
                return Ok(path);
            }
        }
        Err(StoreError::Unexpected(format!("no free name for {file_name}")))
    }

    async fn get(&self, path: &str) -> StoreResult<Bytes> {
        self.files
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("File not found".into()))
    }
}

/// Files under `<root>/documents/`.
pub struct LocalDirFileStore {
    root: PathBuf,
}

impl LocalDirFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> StoreResult<PathBuf> {
        let rel = Path::new(path);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, std::path::Component::Normal(_)));
        if escapes {
            return Err(StoreError::NotFound("File not found".into()));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl FileStore for LocalDirFileStore {
    async fn put(&self, file_name: &str, body: Bytes) -> StoreResult<String> {
        let dir = self.root.join(UPLOAD_PREFIX);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::Unexpected(format!("create {}: {e}", dir.display())))?;

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = candidate_name(file_name, attempt);
            let full = dir.join(&name);
            // create_new makes the existence check and the create one step
            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&full)
                .await
            {
                Ok(f) => f,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(StoreError::Unexpected(format!("open {}: {e}", full.display())));
                }
            };

            file.write_all(&body)
                .await
                .map_err(|e| StoreError::Unexpected(format!("write {}: {e}", full.display())))?;
            file.flush()
                .await
                .map_err(|e| StoreError::Unexpected(format!("flush {}: {e}", full.display())))?;
            return Ok(format!("{UPLOAD_PREFIX}/{name}"));
        }
        Err(StoreError::Unexpected(format!("no free name for {file_name}")))
    }

    async fn get(&self, path: &str) -> StoreResult<Bytes> {
        let full = self.resolve(path)?;
        match tokio::fs::read(&full).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::NotFound("File not found".into()))
            }
            Err(e) => Err(StoreError::Unexpected(format!("read {}: {e}", full.display()))),
        }
    }
}
