//! Filesystem-backed driver.

use futures::StreamExt;
use std::io;
use std::path::{Component, Path, PathBuf};
use storagebus_error::{
    ArgumentError, StorageBusError, StorageBusResult, StorageError, StorageErrorKind,
};
use storagebus_file::{ByteStream, Content, ContentProducer, File, FileMetadata};
use storagebus_storage::{Driver, DriverKind};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

/// Filesystem storage backend.
///
/// Stores each object as a plain file at `{root}/{key}`:
///
/// ```text
/// /var/lib/storagebus/
/// ├── avatars/
/// │   └── 8b0c6a9e.png
/// └── reports/
///     └── q3-summary.pdf
/// ```
///
/// Content types are not persisted; they are inferred from the key when a
/// file is read back.
#[derive(Debug, Clone)]
pub struct LocalDriver {
    root: PathBuf,
}

impl LocalDriver {
    /// Create a driver rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or accessed.
    #[tracing::instrument(skip(root))]
    pub fn new(root: impl Into<PathBuf>) -> StorageBusResult<Self> {
        let root = root.into();

        std::fs::create_dir_all(&root).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                root.display(),
                e
            )))
        })?;

        tracing::info!(path = %root.display(), "Created local storage");
        Ok(Self { root })
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for `key`, refusing keys that would escape the root.
    fn path(&self, key: &str) -> StorageBusResult<PathBuf> {
        let relative = Path::new(key);
        let confined = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if key.is_empty() || !confined {
            return Err(ArgumentError::invalid(format!(
                "key {:?} does not name a path inside the storage root",
                key
            ))
            .into());
        }
        Ok(self.root.join(relative))
    }
}

/// Map an I/O error on `key` to a storage error, using `other` for
/// anything that is not absence or a permission problem.
fn io_error(
    key: &str,
    path: &Path,
    e: io::Error,
    other: fn(String) -> StorageErrorKind,
) -> StorageError {
    match e.kind() {
        io::ErrorKind::NotFound => StorageError::not_found(key),
        io::ErrorKind::PermissionDenied => StorageError::new(StorageErrorKind::PermissionDenied(
            format!("{}: {}", path.display(), e),
        )),
        _ => StorageError::new(other(format!("{}: {}", path.display(), e))),
    }
}

async fn create_parent(path: &Path) -> StorageBusResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                parent.display(),
                e
            )))
        })?;
    }
    Ok(())
}

/// Fresh chunked stream over the file at `path`.
async fn open(key: String, path: PathBuf) -> StorageBusResult<ByteStream> {
    let handle = fs::File::open(&path)
        .await
        .map_err(|e| io_error(&key, &path, e, StorageErrorKind::FileRead))?;
    tracing::debug!(path = %path.display(), "Opened file for reading");

    let stream = ReaderStream::new(handle).map(move |chunk| {
        chunk.map_err(|e| {
            StorageBusError::from(io_error(&key, &path, e, StorageErrorKind::FileRead))
        })
    });
    Ok(stream.boxed())
}

/// Hidden sibling of `path` that a write is staged in.
fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4().simple()))
}

/// Copy every chunk of `content` into `handle`. Returns the byte count.
async fn drain(
    key: &str,
    staging: &Path,
    mut handle: fs::File,
    mut content: ByteStream,
) -> StorageBusResult<u64> {
    let mut written = 0u64;
    while let Some(chunk) = content.next().await {
        let chunk = chunk?;
        handle
            .write_all(&chunk)
            .await
            .map_err(|e| io_error(key, staging, e, StorageErrorKind::FileWrite))?;
        written += chunk.len() as u64;
    }
    handle
        .sync_all()
        .await
        .map_err(|e| io_error(key, staging, e, StorageErrorKind::FileWrite))?;
    Ok(written)
}

async fn discard(staging: &Path) {
    if let Err(e) = fs::remove_file(staging).await {
        tracing::warn!(path = %staging.display(), error = %e, "Failed to remove staging file");
    }
}

#[async_trait::async_trait]
impl Driver for LocalDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Local
    }

    /// Streams into a sibling staging file and renames it over the target.
    /// The previous object stays untouched until the new content is fully
    /// written, and may itself be the source of that content.
    #[tracing::instrument(skip(self, file), fields(key = %file.name()))]
    async fn set(&self, file: &mut File) -> StorageBusResult<String> {
        let key = file.name().to_string();
        let path = self.path(&key)?;
        let staging = staging_path(&path);

        let content = file.stream().await?;

        let handle = match fs::File::create(&staging).await {
            Ok(handle) => handle,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Parent directory missing, creating it");
                create_parent(&path).await?;
                fs::File::create(&staging)
                    .await
                    .map_err(|e| io_error(&key, &path, e, StorageErrorKind::FileWrite))?
            }
            Err(e) => return Err(io_error(&key, &path, e, StorageErrorKind::FileWrite).into()),
        };

        let written = match drain(&key, &staging, handle, content).await {
            Ok(written) => written,
            Err(e) => {
                discard(&staging).await;
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&staging, &path).await {
            discard(&staging).await;
            return Err(io_error(&key, &path, e, StorageErrorKind::FileWrite).into());
        }

        tracing::info!(path = %path.display(), size = written, "Stored file");
        Ok(key)
    }

    async fn get(&self, key: &str) -> StorageBusResult<Option<Content>> {
        let path = self.path(key)?;
        let key = key.to_string();

        let producer = ContentProducer::new(move || open(key.clone(), path.clone()));
        Ok(Some(Content::Producer(producer)))
    }

    async fn metadata(&self, key: &str) -> FileMetadata {
        let Ok(path) = self.path(key) else {
            return FileMetadata::missing();
        };

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => FileMetadata {
                size: Some(meta.len()),
                last_modified: meta
                    .modified()
                    .ok()
                    .map(|time| chrono::DateTime::<chrono::Utc>::from(time).timestamp_millis()),
                content_type: None,
            },
            _ => FileMetadata::missing(),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, key: &str) -> StorageBusResult<()> {
        let path = self.path(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Deleted file");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Nothing to delete");
                Ok(())
            }
            Err(e) => Err(io_error(key, &path, e, StorageErrorKind::FileWrite).into()),
        }
    }

    async fn has(&self, key: &str) -> StorageBusResult<bool> {
        let path = self.path(key)?;

        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(key, &path, e, StorageErrorKind::FileRead).into()),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn copy(&self, from: &str, to: &str) -> StorageBusResult<()> {
        let source = self.path(from)?;
        let destination = self.path(to)?;

        create_parent(&destination).await?;
        let size = fs::copy(&source, &destination)
            .await
            .map_err(|e| io_error(from, &source, e, StorageErrorKind::FileWrite))?;

        tracing::info!(
            from = %source.display(),
            to = %destination.display(),
            size,
            "Copied file"
        );
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn rename(&self, from: &str, to: &str) -> StorageBusResult<()> {
        let source = self.path(from)?;
        let destination = self.path(to)?;

        create_parent(&destination).await?;
        fs::rename(&source, &destination).await.map_err(|e| {
            if e.kind() == io::ErrorKind::CrossesDevices {
                StorageError::new(StorageErrorKind::CrossDevice(format!(
                    "{} -> {}: {}",
                    source.display(),
                    destination.display(),
                    e
                )))
            } else {
                io_error(from, &source, e, StorageErrorKind::FileWrite)
            }
        })?;

        tracing::info!(from = %source.display(), to = %destination.display(), "Renamed file");
        Ok(())
    }
}
