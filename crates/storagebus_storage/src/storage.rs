//! The storage facade.

use crate::sanitize::{DEFAULT_SEPARATOR, RawKey, sanitize, validate_separator};
use crate::{Driver, DriverKind};
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use storagebus_error::{ArgumentError, StorageBusResult};
use storagebus_file::{ByteStream, Content, ContentProducer, File, MetadataProvider, MimeLookup};

type CustomSanitizer = dyn Fn(&str) -> StorageBusResult<String> + Send + Sync;

/// How string keys are canonicalized before they reach the driver.
#[derive(Clone, Default)]
pub enum SanitizeKey {
    /// Run [`sanitize`] with the configured separator
    #[default]
    Enabled,
    /// Pass keys through verbatim (empty keys are still rejected)
    Disabled,
    /// Run a caller-supplied function
    Custom(Arc<CustomSanitizer>),
}

impl SanitizeKey {
    /// Wrap a custom sanitizer.
    pub fn custom<F>(sanitizer: F) -> Self
    where
        F: Fn(&str) -> StorageBusResult<String> + Send + Sync + 'static,
    {
        SanitizeKey::Custom(Arc::new(sanitizer))
    }
}

impl From<bool> for SanitizeKey {
    fn from(enabled: bool) -> Self {
        if enabled {
            SanitizeKey::Enabled
        } else {
            SanitizeKey::Disabled
        }
    }
}

impl fmt::Debug for SanitizeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SanitizeKey::Enabled => f.write_str("Enabled"),
            SanitizeKey::Disabled => f.write_str("Disabled"),
            SanitizeKey::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Options for a [`Storage`].
///
/// # Example
///
/// ```rust
/// use storagebus_storage::{SanitizeKey, StorageOptionsBuilder};
///
/// let options = StorageOptionsBuilder::default()
///     .sanitize_key(SanitizeKey::Enabled)
///     .separator("_")
///     .build()
///     .unwrap();
/// assert_eq!(options.separator(), "_");
/// assert!(*options.infer_type());
/// ```
#[derive(Debug, Clone, derive_builder::Builder, derive_getters::Getters)]
#[builder(setter(into), build_fn(private, name = "build_internal"))]
pub struct StorageOptions {
    /// Key canonicalization policy
    #[builder(default)]
    sanitize_key: SanitizeKey,
    /// Replacement for spaces when sanitizing
    #[builder(default = "DEFAULT_SEPARATOR.to_string()")]
    separator: String,
    /// Infer content types of written and read files from their names
    #[builder(default = "true")]
    infer_type: bool,
    /// Table used when inferring content types
    #[builder(default)]
    mime_lookup: MimeLookup,
    /// Log conditions the facade swallows (absent keys)
    #[builder(default)]
    debug: bool,
}

impl StorageOptionsBuilder {
    /// Build the options.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSeparator` if the separator cannot be used by the sanitizer.
    pub fn build(&self) -> StorageBusResult<StorageOptions> {
        let options = self
            .build_internal()
            .map_err(|e| ArgumentError::invalid(e.to_string()))?;
        validate_separator(&options.separator)?;
        Ok(options)
    }
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            sanitize_key: SanitizeKey::Enabled,
            separator: DEFAULT_SEPARATOR.to_string(),
            infer_type: true,
            mime_lookup: MimeLookup::default(),
            debug: false,
        }
    }
}

/// Where a write lands: a key to canonicalize or a file whose name is used as is.
#[derive(Debug, Clone)]
pub enum Destination<'a> {
    /// Caller-supplied key
    Key(RawKey<'a>),
    /// Existing handle; its name was canonicalized when it was produced
    File(&'a File),
}

impl<'a> From<&'a File> for Destination<'a> {
    fn from(file: &'a File) -> Self {
        Destination::File(file)
    }
}

impl<'a> From<RawKey<'a>> for Destination<'a> {
    fn from(key: RawKey<'a>) -> Self {
        Destination::Key(key)
    }
}

macro_rules! key_destinations {
    ($($ty:ty),*) => {
        $(impl<'a> From<$ty> for Destination<'a> {
            fn from(key: $ty) -> Self {
                Destination::Key(RawKey::from(key))
            }
        })*
    };
}

key_destinations!(&'a str, &'a String, String, i32, i64, u32, u64, f64);

/// Data handed to [`Storage::write`].
#[derive(Debug)]
pub enum Payload {
    /// Delete the destination
    Remove,
    /// Store new content
    Content(Content),
    /// Store an existing handle's content under the destination key
    File(File),
}

impl From<Content> for Payload {
    fn from(content: Content) -> Self {
        Payload::Content(content)
    }
}

impl From<File> for Payload {
    fn from(file: File) -> Self {
        Payload::File(file)
    }
}

impl From<ByteStream> for Payload {
    fn from(stream: ByteStream) -> Self {
        Payload::Content(Content::from_stream(stream))
    }
}

macro_rules! content_payloads {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Payload {
            fn from(data: $ty) -> Self {
                Payload::Content(Content::from(data))
            }
        })*
    };
}

content_payloads!(&str, String, Vec<u8>, &[u8], Bytes, ContentProducer);

impl<T: Into<Payload>> From<Option<T>> for Payload {
    fn from(data: Option<T>) -> Self {
        data.map_or(Payload::Remove, Into::into)
    }
}

/// Uniform façade over one [`Driver`].
///
/// Canonicalizes keys, shapes payloads into [`File`]s and binds the files it
/// hands out to the driver's metadata probe.
///
/// # Example
///
/// ```rust
/// use storagebus_storage::{MemoryDriver, Storage};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let storage = Storage::new(MemoryDriver::new());
///
/// let key = storage.write("reports/Q3 summary.txt", "all good").await?;
/// assert_eq!(key, "reports/Q3-summary.txt");
///
/// let mut file = storage.file(&key).await?;
/// assert_eq!(file.size(), Some(8));
/// assert_eq!(file.text().await?, "all good");
///
/// storage.write(&key, None::<String>).await?;
/// assert!(!storage.exists(&key).await?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Storage {
    driver: Arc<dyn Driver>,
    options: StorageOptions,
}

impl Storage {
    /// Storage with default options.
    pub fn new(driver: impl Driver + 'static) -> Self {
        Self::from_arc(Arc::new(driver), StorageOptions::default())
    }

    /// Storage with explicit options.
    pub fn with_options(driver: impl Driver + 'static, options: StorageOptions) -> Self {
        Self::from_arc(Arc::new(driver), options)
    }

    /// Storage over an already shared driver.
    pub fn from_arc(driver: Arc<dyn Driver>, options: StorageOptions) -> Self {
        tracing::debug!(driver = %driver.kind(), ?options, "Created storage");
        Self { driver, options }
    }

    /// The underlying driver.
    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    /// Which backend the driver talks to.
    pub fn kind(&self) -> DriverKind {
        self.driver.kind()
    }

    /// Options in effect.
    pub fn options(&self) -> &StorageOptions {
        &self.options
    }

    /// Canonicalize a key according to the configured policy.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for empty keys and whatever the active
    /// sanitizer reports.
    pub fn key<'a>(&self, key: impl Into<RawKey<'a>>) -> StorageBusResult<String> {
        let key = key.into();
        let text = match (&self.options.sanitize_key, key) {
            (SanitizeKey::Enabled, key) => return sanitize(key, &self.options.separator),
            (_, RawKey::Integer(n)) => return Ok(n.to_string()),
            (_, RawKey::Float(n)) => return sanitize(RawKey::Float(n), &self.options.separator),
            (_, RawKey::Text(text)) => text,
        };

        if text.is_empty() {
            return Err(ArgumentError::invalid("\"key\" must be a non-empty string").into());
        }

        match &self.options.sanitize_key {
            SanitizeKey::Custom(sanitizer) => sanitizer(&text),
            _ => Ok(text.into_owned()),
        }
    }

    fn resolve(&self, destination: Destination<'_>) -> StorageBusResult<String> {
        match destination {
            Destination::Key(key) => self.key(key),
            Destination::File(file) => Ok(file.name().to_string()),
        }
    }

    fn new_file(&self, key: &str, content: Content) -> StorageBusResult<File> {
        let builder = File::builder(key, content);
        let builder = if self.options.infer_type {
            builder.mime_lookup(self.options.mime_lookup.clone())
        } else {
            builder.infer_type(false)
        };
        builder.build()
    }

    /// Store `data` under `destination`, or delete it when `data` is
    /// [`Payload::Remove`] (`None`).
    ///
    /// Returns the resolved key, also for deletions.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an unusable key before any I/O, and
    /// propagates driver failures.
    #[tracing::instrument(skip(self, destination, data), fields(driver = %self.driver.kind()))]
    pub async fn write<'a>(
        &self,
        destination: impl Into<Destination<'a>>,
        data: impl Into<Payload>,
    ) -> StorageBusResult<String> {
        let key = self.resolve(destination.into())?;

        match data.into() {
            Payload::Remove => {
                self.driver.delete(&key).await?;
                tracing::info!(key = %key, "Removed object");
            }
            Payload::Content(content) => {
                let mut file = self.new_file(&key, content)?;
                let stored = self.driver.set(&mut file).await?;
                tracing::info!(key = %key, stored = %stored, size = ?file.size(), "Stored object");
            }
            Payload::File(file) => {
                let mut file = file.with_name(key.as_str())?;
                let stored = self.driver.set(&mut file).await?;
                tracing::info!(key = %key, stored = %stored, size = ?file.size(), "Stored file");
            }
        }

        Ok(key)
    }

    /// Handle to the object at `path`.
    ///
    /// Never fails for an absent key. Reading the returned file's content
    /// fails with `NotFound` if the key is still absent at that point.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an unusable key and propagates driver
    /// failures other than absence.
    #[tracing::instrument(skip(self, path), fields(driver = %self.driver.kind()))]
    pub async fn file<'a>(&self, path: impl Into<RawKey<'a>>) -> StorageBusResult<File> {
        let key = self.key(path)?;

        let source = self.driver.get(&key).await?;
        let metadata = self.driver.metadata(&key).await;

        let Some(content) = source else {
            if self.options.debug {
                tracing::debug!(key = %key, "No content source, returning empty file");
            }
            return self.new_file(&key, Content::Empty);
        };

        if self.options.debug && metadata.last_modified.is_none() {
            tracing::debug!(key = %key, "Object absent when the handle was created");
        }

        let driver = Arc::clone(&self.driver);
        let probe_key = key.clone();
        let refresh = MetadataProvider::new(move || {
            let driver = Arc::clone(&driver);
            let key = probe_key.clone();
            async move { driver.metadata(&key).await }
        });

        let builder = File::builder(key.as_str(), content)
            .metadata(metadata)
            .metadata_provider(refresh);
        let builder = if self.options.infer_type {
            builder.mime_lookup(self.options.mime_lookup.clone())
        } else {
            builder.infer_type(false)
        };
        builder.build()
    }

    /// Whether `key` holds an object. Absence is `false`, never an error.
    ///
    /// A [`File`] argument's name is canonicalized like any other key.
    #[tracing::instrument(skip(self, key), fields(driver = %self.driver.kind()))]
    pub async fn exists<'a>(&self, key: impl Into<Destination<'a>>) -> StorageBusResult<bool> {
        let key = match key.into() {
            Destination::Key(key) => self.key(key)?,
            Destination::File(file) => self.key(file.name())?,
        };
        let found = self.driver.has(&key).await?;
        if self.options.debug && !found {
            tracing::debug!(key = %key, "Object does not exist");
        }
        Ok(found)
    }

    /// Duplicate `from` under `to`. Returns the destination key.
    ///
    /// Whether content type and timestamps carry over is up to the driver.
    #[tracing::instrument(skip(self, from, to), fields(driver = %self.driver.kind()))]
    pub async fn copy<'a, 'b>(
        &self,
        from: impl Into<Destination<'a>>,
        to: impl Into<Destination<'b>>,
    ) -> StorageBusResult<String> {
        let from = self.resolve(from.into())?;
        let to = self.resolve(to.into())?;

        self.driver.copy(&from, &to).await?;
        tracing::info!(from = %from, to = %to, "Copied object");
        Ok(to)
    }

    /// Move `from` to `to`. Returns the destination key.
    ///
    /// Tries the driver's rename first. A `CrossDevice` failure falls back to
    /// copy then delete; any other failure is returned with the source intact.
    #[tracing::instrument(skip(self, from, to), fields(driver = %self.driver.kind()))]
    pub async fn move_to<'a, 'b>(
        &self,
        from: impl Into<Destination<'a>>,
        to: impl Into<Destination<'b>>,
    ) -> StorageBusResult<String> {
        let from = self.resolve(from.into())?;
        let to = self.resolve(to.into())?;

        match self.driver.rename(&from, &to).await {
            Ok(()) => {
                tracing::info!(from = %from, to = %to, "Renamed object");
            }
            Err(e) if e.is_cross_device() => {
                tracing::debug!(from = %from, to = %to, error = %e, "Rename crossed devices, copying instead");
                self.driver.copy(&from, &to).await?;
                self.driver.delete(&from).await?;
                tracing::info!(from = %from, to = %to, "Moved object by copy and delete");
            }
            Err(e) => return Err(e),
        }

        Ok(to)
    }
}
