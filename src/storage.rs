//! Blob storage for file attachments.
//!
//! Every attachment lives in exactly one backend. New uploads go to the
//! active backend (S3 when configured, the local upload folder otherwise);
//! reads and deletes go to whichever backend the attachment row names.

pub mod local;
pub mod s3_store;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use local::LocalStorage;
use s3_store::S3Storage;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("blob {0} not found")]
    NotFound(String),
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
    #[error("storage backend {0} is not configured")]
    Unavailable(StorageType),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("s3: {0}")]
    S3(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum StorageType {
    Local,
    S3,
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageType::Local => write!(f, "local"),
            StorageType::S3 => write!(f, "s3"),
        }
    }
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    fn storage_type(&self) -> StorageType;

    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StorageError>;

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// The set of backends the running process can reach.
#[derive(Clone)]
pub struct Storage {
    local: Arc<LocalStorage>,
    s3: Option<Arc<S3Storage>>,
}

impl Storage {
    pub async fn from_config(config: &Config) -> Result<Self, StorageError> {
        let local = LocalStorage::new(&config.upload_folder).await?;
        let s3 = match &config.s3 {
            Some(s3_config) => Some(Arc::new(S3Storage::new(s3_config)?)),
            None => None,
        };
        Ok(Storage {
            local: Arc::new(local),
            s3,
        })
    }

    pub fn local_only(local: LocalStorage) -> Self {
        Storage {
            local: Arc::new(local),
            s3: None,
        }
    }

    /// Backend that receives new uploads.
    pub fn active(&self) -> &dyn BlobStore {
        match &self.s3 {
            Some(s3) => s3.as_ref(),
            None => self.local.as_ref(),
        }
    }

    pub fn backend(&self, storage_type: StorageType) -> Result<&dyn BlobStore, StorageError> {
        match storage_type {
            StorageType::Local => Ok(self.local.as_ref()),
            StorageType::S3 => self
                .s3
                .as_deref()
                .map(|s3| s3 as &dyn BlobStore)
                .ok_or(StorageError::Unavailable(StorageType::S3)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn local_backend_is_active_without_s3() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::local_only(LocalStorage::new(dir.path()).await.unwrap());

        assert_eq!(storage.active().storage_type(), StorageType::Local);
        assert!(storage.backend(StorageType::Local).is_ok());
        assert!(matches!(
            storage.backend(StorageType::S3),
            Err(StorageError::Unavailable(StorageType::S3))
        ));
    }
}
