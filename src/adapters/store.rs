use crate::domain::ports::ModelStore;
use crate::utils::error::{ApiError, Result};
use async_trait::async_trait;
use std::path::PathBuf;

#[cfg(feature = "s3")]
use aws_sdk_s3::error::DisplayErrorContext;
#[cfg(feature = "s3")]
use aws_sdk_s3::Client as S3Client;

/// 本機模型目錄，容器以 volume 掛載時使用
#[derive(Debug, Clone)]
pub struct LocalModelStore {
    root: PathBuf,
}

impl LocalModelStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ModelStore for LocalModelStore {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    async fn check_ready(&self) -> Result<()> {
        let metadata = tokio::fs::metadata(&self.root)
            .await
            .map_err(|e| ApiError::ModelStoreError {
                message: format!("Model directory {} is not accessible: {}", self.describe(), e),
            })?;

        if !metadata.is_dir() {
            return Err(ApiError::ModelStoreError {
                message: format!("Model path {} is not a directory", self.describe()),
            });
        }

        tracing::debug!("📁 Model directory {} is ready", self.describe());
        Ok(())
    }
}

#[cfg(feature = "s3")]
#[derive(Debug, Clone)]
pub struct S3ModelStore {
    client: S3Client,
    bucket: String,
}

#[cfg(feature = "s3")]
impl S3ModelStore {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// 以預設認證鏈建立 client (task role / 環境變數 / profile)
    pub async fn from_region(bucket: String, region: String) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region))
            .load()
            .await;
        Self::new(S3Client::new(&config), bucket)
    }
}

#[cfg(feature = "s3")]
#[async_trait]
impl ModelStore for S3ModelStore {
    fn describe(&self) -> String {
        format!("s3://{}", self.bucket)
    }

    async fn check_ready(&self) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| ApiError::ModelStoreError {
                message: format!(
                    "Failed to reach bucket {}: {}",
                    self.bucket,
                    DisplayErrorContext(&e)
                ),
            })?;

        tracing::debug!("🪣 Bucket {} is reachable", self.bucket);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_local_store_ready() {
        let dir = TempDir::new().unwrap();
        let store = LocalModelStore::new(dir.path());
        assert!(tokio_test::block_on(store.check_ready()).is_ok());
        assert_eq!(store.describe(), dir.path().display().to_string());
    }

    #[test]
    fn test_local_store_missing_directory() {
        let dir = TempDir::new().unwrap();
        let store = LocalModelStore::new(dir.path().join("missing"));
        let err = tokio_test::block_on(store.check_ready()).unwrap_err();
        assert!(matches!(err, ApiError::ModelStoreError { .. }));
    }

    #[test]
    fn test_local_store_rejects_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("model.bin");
        std::fs::write(&file, b"weights").unwrap();

        let store = LocalModelStore::new(&file);
        let err = tokio_test::block_on(store.check_ready()).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }
}
