//! The backend adapter contract.

use storagebus_error::{StorageBusResult, StorageError};
use storagebus_file::{Content, File, FileMetadata};

/// Identifies a backend in logs and configuration.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// Process-local map
    Memory,
    /// Local filesystem
    Local,
    /// S3-compatible object store
    S3,
    /// Google Cloud Storage
    Gcs,
}

/// Trait for pluggable storage backends.
///
/// A driver moves bytes between a [`File`] and its backend. Key
/// canonicalization, payload shaping and fallback policies live in
/// [`Storage`](crate::Storage), so drivers receive keys verbatim.
///
/// Absence is never an error at this layer except where content is actually
/// read: `metadata` reports it as [`FileMetadata::missing`], `delete` and
/// `has` treat it as success and `false`.
#[async_trait::async_trait]
pub trait Driver: Send + Sync + std::fmt::Debug {
    /// Which backend this is.
    fn kind(&self) -> DriverKind;

    /// Persist the file's bytes and metadata under its name.
    ///
    /// Consumes exactly one stream of `file`. Returns the stored key, which
    /// may be normalized by the backend.
    async fn set(&self, file: &mut File) -> StorageBusResult<String>;

    /// Content source for `key`.
    ///
    /// Bundled drivers always return `Some` with a producer that fails with
    /// `NotFound` when invoked on an absent key; `None` is reserved for
    /// backends that can only answer absence eagerly.
    async fn get(&self, key: &str) -> StorageBusResult<Option<Content>>;

    /// Cheap metadata probe. Never fails.
    async fn metadata(&self, key: &str) -> FileMetadata;

    /// Remove `key`. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> StorageBusResult<()>;

    /// Whether `key` holds an object.
    async fn has(&self, key: &str) -> StorageBusResult<bool> {
        Ok(self.metadata(key).await.last_modified.is_some())
    }

    /// Duplicate `from` under `to`, streaming the content through this process.
    async fn copy(&self, from: &str, to: &str) -> StorageBusResult<()> {
        let Some(content) = self.get(from).await? else {
            return Err(StorageError::not_found(from).into());
        };
        let metadata = self.metadata(from).await;
        let mut file = File::builder(to, content).metadata(metadata).build()?;
        self.set(&mut file).await?;
        Ok(())
    }

    /// Move `from` to `to`.
    ///
    /// Backends with a native rename override this and report
    /// `CrossDevice` when it cannot be done in place.
    async fn rename(&self, from: &str, to: &str) -> StorageBusResult<()> {
        self.copy(from, to).await?;
        self.delete(from).await
    }
}
