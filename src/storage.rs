//! # Storage Backends
//!
//! Destination of the serialized output units. Paths starting with `s3://` go to
//! Amazon S3, everything else to the local filesystem.
//!
//! Local writes are atomic: the bytes land in a temporary file inside the target
//! directory, which is then renamed over the final name. A failed run therefore never
//! leaves a partially written output behind.
//!
//! ```rust,no_run
//! use gridslice::storage::{StorageBackend, StorageFactory};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let storage = StorageFactory::from_path("s3://my-bucket/sst/").await?;
//!     storage.write("s3://my-bucket/sst/20220101.nc", b"...").await?;
//!     Ok(())
//! }
//! ```

use aws_config::BehaviorVersion;
use aws_sdk_s3::Client as S3Client;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while persisting output
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("AWS S3 PutObject error: {0}")]
    S3PutObject(#[from] aws_sdk_s3::error::SdkError<aws_sdk_s3::operation::put_object::PutObjectError>),

    #[error("AWS S3 HeadObject error: {0}")]
    S3HeadObject(#[from] aws_sdk_s3::error::SdkError<aws_sdk_s3::operation::head_object::HeadObjectError>),

    #[error("Invalid S3 path format: {0}")]
    InvalidS3Path(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Unified interface of the output destinations
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Writes `data` to `path` as a whole, replacing any previous content.
    async fn write(&self, path: &str, data: &[u8]) -> StorageResult<()>;

    async fn exists(&self, path: &str) -> StorageResult<bool>;
}

/// Local filesystem backend
#[derive(Debug, Clone)]
pub struct LocalStorage;

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn write(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        let target = Path::new(path);
        let parent = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::env::current_dir()?,
        };
        tokio::fs::create_dir_all(&parent).await?;

        let mut temp = tempfile::NamedTempFile::new_in(&parent).map_err(|e| permission_aware(e, path))?;
        temp.write_all(data)?;
        temp.as_file().sync_all()?;
        temp.persist(target).map_err(|e| permission_aware(e.error, path))?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        match tokio::fs::metadata(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

fn permission_aware(error: std::io::Error, path: &str) -> StorageError {
    if error.kind() == std::io::ErrorKind::PermissionDenied {
        StorageError::PermissionDenied(path.to_string())
    } else {
        StorageError::Io(error)
    }
}

/// Amazon S3 backend
///
/// Credentials come from the usual AWS sources (environment, credentials file, IAM role).
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
}

impl S3Storage {
    pub async fn new() -> StorageResult<Self> {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Ok(S3Storage {
            client: S3Client::new(&config),
        })
    }

    /// Splits `s3://bucket/key` into bucket and key.
    fn parse_s3_path(s3_path: &str) -> StorageResult<(String, String)> {
        let Some(rest) = s3_path.strip_prefix("s3://") else {
            return Err(StorageError::InvalidS3Path(format!(
                "S3 path must start with 's3://': {s3_path}"
            )));
        };
        match rest.split_once('/') {
            Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => {
                Ok((bucket.to_string(), key.to_string()))
            }
            _ => Err(StorageError::InvalidS3Path(format!(
                "Expected 's3://bucket/key': {s3_path}"
            ))),
        }
    }
}

#[async_trait::async_trait]
impl StorageBackend for S3Storage {
    async fn write(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        let (bucket, key) = Self::parse_s3_path(path)?;
        // a single PutObject is atomic: the object appears complete or not at all
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(aws_sdk_s3::primitives::ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(StorageError::S3PutObject)?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let (bucket, key) = Self::parse_s3_path(path)?;
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(aws_sdk_s3::error::SdkError::ServiceError(service_err)) if service_err.err().is_not_found() => {
                Ok(false)
            }
            Err(e) => Err(StorageError::S3HeadObject(e)),
        }
    }
}

#[derive(Debug)]
pub enum Storage {
    Local(LocalStorage),
    S3(S3Storage),
}

#[async_trait::async_trait]
impl StorageBackend for Storage {
    async fn write(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        match self {
            Storage::Local(storage) => storage.write(path, data).await,
            Storage::S3(storage) => storage.write(path, data).await,
        }
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        match self {
            Storage::Local(storage) => storage.exists(path).await,
            Storage::S3(storage) => storage.exists(path).await,
        }
    }
}

/// Picks the storage backend from the shape of a path
pub struct StorageFactory;

impl StorageFactory {
    pub async fn from_path(path: &str) -> StorageResult<Storage> {
        if Self::is_s3_path(path) {
            Ok(Storage::S3(S3Storage::new().await?))
        } else {
            Ok(Storage::Local(LocalStorage))
        }
    }

    pub fn is_s3_path(path: &str) -> bool {
        path.starts_with("s3://")
    }

    /// Joins an output directory and a file name for either backend.
    pub fn join(dir: &str, name: &str) -> String {
        if Self::is_s3_path(dir) {
            format!("{}/{}", dir.trim_end_matches('/'), name)
        } else {
            Path::new(dir).join(name).to_string_lossy().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_storage_write_creates_directories() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let file_path = temp_dir.path().join("nested/out/unit.csv");
        let file_path_str = file_path.to_str().unwrap();

        LocalStorage.write(file_path_str, b"date,lat,lon\n").await?;

        assert_eq!(std::fs::read(&file_path)?, b"date,lat,lon\n");
        assert!(LocalStorage.exists(file_path_str).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_local_storage_overwrite_leaves_no_temp_files() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let file_path = temp_dir.path().join("unit.nc");
        let file_path_str = file_path.to_str().unwrap();

        LocalStorage.write(file_path_str, b"first").await?;
        LocalStorage.write(file_path_str, b"second").await?;

        assert_eq!(std::fs::read(&file_path)?, b"second");
        let entries = std::fs::read_dir(temp_dir.path())?.count();
        assert_eq!(entries, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_local_storage_missing_file() -> Result<(), Box<dyn std::error::Error>> {
        assert!(!LocalStorage.exists("/nonexistent/path/unit.nc").await?);
        Ok(())
    }

    #[test]
    fn test_s3_path_parsing() {
        let (bucket, key) = S3Storage::parse_s3_path("s3://my-bucket/sst/2022/unit.nc").unwrap();
        assert_eq!(bucket, "my-bucket");
        assert_eq!(key, "sst/2022/unit.nc");

        assert!(S3Storage::parse_s3_path("http://bucket/unit.nc").is_err());
        assert!(S3Storage::parse_s3_path("s3://").is_err());
        assert!(S3Storage::parse_s3_path("s3://bucket").is_err());
        assert!(S3Storage::parse_s3_path("s3:///unit.nc").is_err());
    }

    #[tokio::test]
    async fn test_storage_factory() -> Result<(), Box<dyn std::error::Error>> {
        assert!(StorageFactory::is_s3_path("s3://my-bucket/out"));
        assert!(!StorageFactory::is_s3_path("/local/out"));

        let storage = StorageFactory::from_path("/local/out").await?;
        assert!(matches!(storage, Storage::Local(_)));

        assert_eq!(StorageFactory::join("s3://bucket/out/", "a.nc"), "s3://bucket/out/a.nc");
        assert_eq!(StorageFactory::join("/tmp/out", "a.nc"), "/tmp/out/a.nc");
        Ok(())
    }

    #[tokio::test]
    #[ignore] // requires AWS credentials and TEST_S3_BUCKET
    async fn test_s3_storage_real_aws() -> Result<(), Box<dyn std::error::Error>> {
        let Ok(test_bucket) = std::env::var("TEST_S3_BUCKET") else {
            println!("Skipping S3 integration test - set TEST_S3_BUCKET environment variable");
            return Ok(());
        };

        let storage = S3Storage::new().await?;
        let s3_path = format!("s3://{test_bucket}/gridslice-test/unit.csv");
        storage.write(&s3_path, b"date,lat,lon\n").await?;
        assert!(storage.exists(&s3_path).await?);
        Ok(())
    }
}
