//! Driver over an `object_store` client.

use crate::{GcsOptions, S3Options};
use bytes::BytesMut;
use futures::stream::FuturesUnordered;
use futures::{StreamExt, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path;
use object_store::{
    Attribute, AttributeValue, Attributes, GetOptions, MultipartUpload, ObjectStore,
    PutMultipartOpts, PutOptions, PutPayload,
};
use std::fmt;
use std::sync::Arc;
use storagebus_error::{
    ArgumentError, BackendError, ConfigError, StorageBusError, StorageBusResult, StorageError,
};
use storagebus_file::{ByteStream, Content, ContentProducer, File, FileMetadata};
use storagebus_storage::{Driver, DriverKind};

/// Content at or above this size is uploaded in parts of this size.
pub const MULTIPART_THRESHOLD: usize = 5 * 1024 * 1024;

/// Parts uploaded concurrently during a multipart upload.
const UPLOAD_CONCURRENCY: usize = 8;

/// Driver for S3-compatible and GCS buckets.
///
/// The client is injected: [`ObjectStoreDriver::s3`] and
/// [`ObjectStoreDriver::gcs`] build real ones, tests pass
/// `object_store::memory::InMemory` to [`ObjectStoreDriver::new`].
///
/// Content types are stored as object attributes.
#[derive(Clone)]
pub struct ObjectStoreDriver {
    store: Arc<dyn ObjectStore>,
    kind: DriverKind,
}

// Client `Debug` output can include credentials; print its `Display` only.
impl fmt::Debug for ObjectStoreDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreDriver")
            .field("store", &format_args!("{}", self.store))
            .field("kind", &self.kind)
            .finish()
    }
}

impl ObjectStoreDriver {
    /// Wrap an existing client, reported in logs as `kind`.
    pub fn new(store: Arc<dyn ObjectStore>, kind: DriverKind) -> Self {
        Self { store, kind }
    }

    /// Client for an S3-compatible bucket.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the bucket is empty or the client
    /// rejects the settings. No request is made.
    #[tracing::instrument(skip(options), fields(bucket = %options.bucket()))]
    pub fn s3(options: &S3Options) -> StorageBusResult<Self> {
        if options.bucket().is_empty() {
            return Err(ConfigError::new("s3: bucket must not be empty").into());
        }

        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(options.bucket())
            .with_region(options.region().as_deref().unwrap_or("us-east-1"));

        if let Some(endpoint) = options.endpoint() {
            builder = builder
                .with_endpoint(endpoint)
                .with_virtual_hosted_style_request(false);
        }
        if *options.allow_http() {
            builder = builder.with_allow_http(true);
        }
        if let Some(access_key_id) = options.access_key_id() {
            builder = builder.with_access_key_id(access_key_id);
        }
        if let Some(secret_access_key) = options.secret_access_key() {
            builder = builder.with_secret_access_key(secret_access_key);
        }

        let store = builder
            .build()
            .map_err(|e| ConfigError::new(format!("s3: {}", e)))?;

        tracing::info!("Created S3 storage");
        Ok(Self::new(Arc::new(store), DriverKind::S3))
    }

    /// Client for a Google Cloud Storage bucket.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the bucket is empty or the client
    /// rejects the settings. No request is made.
    #[tracing::instrument(skip(options), fields(bucket = %options.bucket()))]
    pub fn gcs(options: &GcsOptions) -> StorageBusResult<Self> {
        if options.bucket().is_empty() {
            return Err(ConfigError::new("gcs: bucket must not be empty").into());
        }

        let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(options.bucket());

        if let Some(key) = options.service_account_key() {
            builder = builder.with_service_account_key(key);
        }
        if let Some(path) = options.service_account_path() {
            builder = builder.with_service_account_path(path);
        }

        let store = builder
            .build()
            .map_err(|e| ConfigError::new(format!("gcs: {}", e)))?;

        tracing::info!("Created GCS storage");
        Ok(Self::new(Arc::new(store), DriverKind::Gcs))
    }

    /// The underlying client.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    fn location(key: &str) -> StorageBusResult<Path> {
        Path::parse(key).map_err(|e| {
            ArgumentError::invalid(format!("key {:?} is not a valid object path: {}", key, e))
                .into()
        })
    }

    /// Fresh stream over the object at `location`.
    async fn open(self, key: String, location: Path) -> StorageBusResult<ByteStream> {
        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| self.error(&key, e))?;
        tracing::debug!(key = %key, size = result.meta.size as u64, "Opened object for reading");

        let stream = result
            .into_stream()
            .map_err(move |e| self.error(&key, e))
            .boxed();
        Ok(stream)
    }

    /// Send `head` and the rest of `content` as parts of `upload`, at most
    /// [`UPLOAD_CONCURRENCY`] in flight. Returns the byte count.
    ///
    /// Neither completes nor aborts the upload.
    async fn upload_parts(
        &self,
        key: &str,
        upload: &mut dyn MultipartUpload,
        mut buffer: BytesMut,
        mut content: ByteStream,
    ) -> StorageBusResult<usize> {
        let mut in_flight: FuturesUnordered<object_store::UploadPart> = FuturesUnordered::new();
        let mut size = 0;
        let mut drained = false;

        loop {
            while buffer.len() >= MULTIPART_THRESHOLD || (drained && !buffer.is_empty()) {
                let take = buffer.len().min(MULTIPART_THRESHOLD);
                let part = buffer.split_to(take).freeze();
                size += part.len();

                if in_flight.len() >= UPLOAD_CONCURRENCY {
                    if let Some(result) = in_flight.next().await {
                        result.map_err(|e| self.error(key, e))?;
                    }
                }
                in_flight.push(upload.put_part(PutPayload::from(part)));
            }
            if drained {
                break;
            }
            match content.next().await {
                Some(chunk) => buffer.extend_from_slice(&chunk?),
                None => drained = true,
            }
        }

        while let Some(result) = in_flight.next().await {
            result.map_err(|e| self.error(key, e))?;
        }
        Ok(size)
    }

    fn error(&self, key: &str, e: object_store::Error) -> StorageBusError {
        match e {
            object_store::Error::NotFound { .. } => StorageError::not_found(key).into(),
            other => BackendError::new(format!("{}: {}: {}", self.kind, key, other)).into(),
        }
    }
}

#[async_trait::async_trait]
impl Driver for ObjectStoreDriver {
    fn kind(&self) -> DriverKind {
        self.kind
    }

    /// Buffers up to [`MULTIPART_THRESHOLD`] bytes; smaller content is sent in a
    /// single request, larger content as a multipart upload.
    #[tracing::instrument(skip(self, file), fields(driver = %self.kind, key = %file.name()))]
    async fn set(&self, file: &mut File) -> StorageBusResult<String> {
        let key = file.name().to_string();
        let location = Self::location(&key)?;

        let mut content = file.stream().await?;

        let mut attributes = Attributes::new();
        if !file.content_type().is_empty() {
            attributes.insert(
                Attribute::ContentType,
                AttributeValue::from(file.content_type().to_string()),
            );
        }

        let mut head = BytesMut::new();
        while head.len() < MULTIPART_THRESHOLD {
            match content.next().await {
                Some(chunk) => head.extend_from_slice(&chunk?),
                None => break,
            }
        }

        if head.len() < MULTIPART_THRESHOLD {
            let size = head.len();
            let options = PutOptions {
                attributes,
                ..Default::default()
            };
            self.store
                .put_opts(&location, PutPayload::from(head.freeze()), options)
                .await
                .map_err(|e| self.error(&key, e))?;
            tracing::info!(size, "Stored object");
            return Ok(key);
        }

        let options = PutMultipartOpts {
            attributes,
            ..Default::default()
        };
        let mut upload = self
            .store
            .put_multipart_opts(&location, options)
            .await
            .map_err(|e| self.error(&key, e))?;

        let uploaded = match self.upload_parts(&key, upload.as_mut(), head, content).await {
            Ok(size) => upload
                .complete()
                .await
                .map(|_| size)
                .map_err(|e| self.error(&key, e)),
            Err(e) => Err(e),
        };

        match uploaded {
            Ok(size) => {
                tracing::info!(size, "Stored object in parts");
                Ok(key)
            }
            Err(e) => {
                if let Err(abort) = upload.abort().await {
                    tracing::warn!(error = %abort, "Failed to abort multipart upload");
                }
                Err(e)
            }
        }
    }

    async fn get(&self, key: &str) -> StorageBusResult<Option<Content>> {
        let location = Self::location(key)?;
        let driver = self.clone();
        let key = key.to_string();

        let producer = ContentProducer::new(move || {
            driver.clone().open(key.clone(), location.clone())
        });
        Ok(Some(Content::Producer(producer)))
    }

    async fn metadata(&self, key: &str) -> FileMetadata {
        let Ok(location) = Self::location(key) else {
            return FileMetadata::missing();
        };

        let options = GetOptions {
            head: true,
            ..Default::default()
        };
        match self.store.get_opts(&location, options).await {
            Ok(result) => FileMetadata {
                size: Some(result.meta.size as u64),
                last_modified: Some(result.meta.last_modified.timestamp_millis()),
                content_type: result
                    .attributes
                    .get(&Attribute::ContentType)
                    .map(|value| AsRef::<str>::as_ref(value).to_string()),
            },
            Err(object_store::Error::NotFound { .. }) => FileMetadata::missing(),
            Err(e) => {
                tracing::debug!(key, error = %e, "Metadata probe failed");
                FileMetadata::missing()
            }
        }
    }

    #[tracing::instrument(skip(self), fields(driver = %self.kind))]
    async fn delete(&self, key: &str) -> StorageBusResult<()> {
        let location = Self::location(key)?;

        match self.store.delete(&location).await {
            Ok(()) => {
                tracing::info!("Deleted object");
                Ok(())
            }
            Err(object_store::Error::NotFound { .. }) => {
                tracing::debug!("Nothing to delete");
                Ok(())
            }
            Err(e) => Err(self.error(key, e)),
        }
    }

    async fn has(&self, key: &str) -> StorageBusResult<bool> {
        let location = Self::location(key)?;

        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(self.error(key, e)),
        }
    }

    #[tracing::instrument(skip(self), fields(driver = %self.kind))]
    async fn copy(&self, from: &str, to: &str) -> StorageBusResult<()> {
        let source = Self::location(from)?;
        let destination = Self::location(to)?;

        self.store
            .copy(&source, &destination)
            .await
            .map_err(|e| self.error(from, e))?;
        tracing::info!("Copied object");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(driver = %self.kind))]
    async fn rename(&self, from: &str, to: &str) -> StorageBusResult<()> {
        let source = Self::location(from)?;
        let destination = Self::location(to)?;

        self.store
            .rename(&source, &destination)
            .await
            .map_err(|e| self.error(from, e))?;
        tracing::info!("Renamed object");
        Ok(())
    }
}
