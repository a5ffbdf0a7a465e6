use ::s3::bucket::Bucket;
use ::s3::creds::Credentials;
use ::s3::error::S3Error;
use ::s3::region::Region;
use async_trait::async_trait;
use log::info;

use super::{BlobStore, StorageError, StorageType};
use crate::config::S3Config;

const KEY_PREFIX: &str = "attachments";

/// Blobs as objects in an S3-compatible bucket.
pub struct S3Storage {
    bucket: Box<Bucket>,
}

impl S3Storage {
    pub fn new(config: &S3Config) -> Result<Self, StorageError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::S3(e.to_string()))?;

        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse::<Region>()
                .map_err(|e| StorageError::S3(e.to_string()))?,
        };

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| StorageError::S3(e.to_string()))?;
        // MinIO and friends only speak path-style URLs.
        if config.endpoint.is_some() {
            bucket = bucket.with_path_style();
        }

        info!("S3 attachment storage in bucket {}", config.bucket);
        Ok(S3Storage {
            bucket: Box::new(bucket),
        })
    }
}

fn object_path(key: &str) -> String {
    format!("/{}/{}", KEY_PREFIX, key)
}

fn map_s3_error(key: &str, err: S3Error) -> StorageError {
    match err {
        S3Error::HttpFailWithBody(404, _) => StorageError::NotFound(key.to_string()),
        other => StorageError::S3(other.to_string()),
    }
}

#[async_trait]
impl BlobStore for S3Storage {
    fn storage_type(&self) -> StorageType {
        StorageType::S3
    }

    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StorageError> {
        self.bucket
            .put_object_with_content_type(object_path(key), bytes, content_type)
            .await
            .map_err(|e| map_s3_error(key, e))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let response = self
            .bucket
            .get_object(object_path(key))
            .await
            .map_err(|e| map_s3_error(key, e))?;
        Ok(response.bytes().to_vec())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        match self.bucket.delete_object(object_path(key)).await {
            Ok(_) => Ok(()),
            Err(e) => match map_s3_error(key, e) {
                StorageError::NotFound(_) => Ok(()),
                other => Err(other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: Option<&str>) -> S3Config {
        S3Config {
            bucket: "attachments".into(),
            access_key: "AKIAEXAMPLE".into(),
            secret_key: "secret".into(),
            endpoint: endpoint.map(str::to_string),
            region: "us-east-1".into(),
        }
    }

    #[test]
    fn object_paths_are_prefixed() {
        assert_eq!(object_path("abc.pdf"), "/attachments/abc.pdf");
    }

    #[test]
    fn builds_client_for_custom_endpoint() {
        let storage = S3Storage::new(&config(Some("http://localhost:9000"))).unwrap();
        assert_eq!(storage.storage_type(), StorageType::S3);
        assert_eq!(storage.bucket.name(), "attachments");
    }
}
