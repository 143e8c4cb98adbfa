//! File metadata snapshots and the capability that refreshes them.

use futures::FutureExt;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Snapshot of an object's metadata.
///
/// `None` means "unknown". Drivers report an absent key as
/// [`FileMetadata::missing`] rather than failing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FileMetadata {
    /// Size in bytes
    pub size: Option<u64>,
    /// Last modification time, milliseconds since the Unix epoch
    pub last_modified: Option<i64>,
    /// MIME type recorded by the backend
    pub content_type: Option<String>,
}

impl FileMetadata {
    /// Metadata of an absent object: zero size, unknown timestamp and type.
    pub fn missing() -> Self {
        Self {
            size: Some(0),
            last_modified: None,
            content_type: None,
        }
    }

    /// Set the size.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Set the last modification time.
    pub fn with_last_modified(mut self, last_modified: i64) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

type FetchFn = dyn Fn() -> BoxFuture<'static, FileMetadata> + Send + Sync;

/// Injected capability that re-reads a file's metadata.
///
/// [`File::stream`](crate::File::stream) awaits it before producing content, so
/// size, type and timestamp always describe the content being streamed.
#[derive(Clone)]
pub struct MetadataProvider(Arc<FetchFn>);

impl MetadataProvider {
    /// Wrap an async metadata probe.
    pub fn new<F, Fut>(fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FileMetadata> + Send + 'static,
    {
        Self(Arc::new(move || fetch().boxed()))
    }

    /// Provider that always returns the same snapshot.
    pub fn fixed(metadata: FileMetadata) -> Self {
        Self::new(move || {
            let metadata = metadata.clone();
            async move { metadata }
        })
    }

    /// Run the probe.
    pub async fn fetch(&self) -> FileMetadata {
        (self.0)().await
    }
}

impl fmt::Debug for MetadataProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MetadataProvider(..)")
    }
}
