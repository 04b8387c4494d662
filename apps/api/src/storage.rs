//! Object storage for uploaded files (resumes, application snapshots, company logos).
//!
//! Keys are laid out as:
//! - `resumes/{candidate_id}/{resume_id}.pdf`
//! - `resumes/{candidate_id}/profile.{pdf,docx}`
//! - `applications/{application_id}.pdf`
//! - `logos/{company_id}`

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload of '{key}' failed: {message}")]
    Put { key: String, message: String },

    #[error("download of '{key}' failed: {message}")]
    Get { key: String, message: String },

    #[error("copy of '{from}' to '{to}' failed: {message}")]
    Copy {
        from: String,
        to: String,
        message: String,
    },

    #[error("delete of '{key}' failed: {message}")]
    Delete { key: String, message: String },
}

/// Thin wrapper around the S3 client bound to a single bucket.
#[derive(Clone)]
pub struct ObjectStore {
    s3: S3Client,
    bucket: String,
}

impl ObjectStore {
    pub fn new(s3: S3Client, bucket: String) -> Self {
        Self { s3, bucket }
    }

    pub async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StorageError> {
        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Put {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        info!("Uploaded s3://{}/{}", self.bucket, key);
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        let output = self
            .s3
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Get {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        let data = output.body.collect().await.map_err(|e| StorageError::Get {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(data.into_bytes())
    }

    /// Server-side copy within the bucket.
    pub async fn copy(&self, from: &str, to: &str) -> Result<(), StorageError> {
        self.s3
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(format!("{}/{}", self.bucket, from))
            .key(to)
            .send()
            .await
            .map_err(|e| StorageError::Copy {
                from: from.to_string(),
                to: to.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.s3
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Delete {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        info!("Deleted s3://{}/{}", self.bucket, key);
        Ok(())
    }

    /// Removes `key` when `result` is an error, so a failed database write does
    /// not leave the object behind. The original error is returned either way.
    pub async fn discard_on_error<T, E>(&self, key: &str, result: Result<T, E>) -> Result<T, E> {
        if result.is_err() {
            if let Err(cleanup) = self.delete(key).await {
                warn!("Could not remove orphaned object {key}: {cleanup}");
            }
        }
        result
    }
}

pub fn resume_key(candidate_id: Uuid, resume_id: Uuid) -> String {
    format!("resumes/{candidate_id}/{resume_id}.pdf")
}

/// The file attached directly to a profile by resume parsing.
pub fn profile_resume_key(candidate_id: Uuid, extension: &str) -> String {
    format!("resumes/{candidate_id}/profile.{extension}")
}

pub fn application_resume_key(application_id: Uuid) -> String {
    format!("applications/{application_id}.pdf")
}

pub fn logo_key(company_id: Uuid) -> String {
    format!("logos/{company_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::{retry::RetryConfig, BehaviorVersion, Credentials, Region};

    fn unreachable_store() -> ObjectStore {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .endpoint_url("http://127.0.0.1:1")
            .force_path_style(true)
            .credentials_provider(Credentials::new("test", "test", None, None, "test"))
            .retry_config(RetryConfig::disabled())
            .build();
        ObjectStore::new(S3Client::from_conf(config), "hireboard-test".into())
    }

    #[tokio::test]
    async fn test_discard_on_error_keeps_original_error() {
        let store = unreachable_store();
        let failed: Result<(), &str> = Err("insert failed");
        assert_eq!(
            store.discard_on_error("resumes/a/b.pdf", failed).await,
            Err("insert failed")
        );
    }

    #[tokio::test]
    async fn test_discard_on_error_passes_success_through() {
        let store = unreachable_store();
        let stored: Result<u32, &str> = Ok(7);
        assert_eq!(store.discard_on_error("resumes/a/b.pdf", stored).await, Ok(7));
    }

    #[test]
    fn test_key_layout() {
        let candidate = Uuid::nil();
        let resume = Uuid::from_u128(1);
        assert_eq!(
            resume_key(candidate, resume),
            format!("resumes/{candidate}/{resume}.pdf")
        );
        assert!(application_resume_key(resume).starts_with("applications/"));
        assert!(logo_key(candidate).starts_with("logos/"));
        assert!(profile_resume_key(candidate, "docx").ends_with("/profile.docx"));
    }
}
