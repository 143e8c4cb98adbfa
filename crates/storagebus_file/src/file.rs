//! The lazy file handle.

use crate::{ByteStream, Content, ContentProducer, FileMetadata, MetadataProvider, MimeLookup};
use bytes::{Bytes, BytesMut};
use encoding_rs::{Encoding, UTF_8};
use futures::StreamExt;
use storagebus_error::{ArgumentError, StorageBusResult};

/// Lazily materialized, re-streamable handle to named byte content.
///
/// A `File` never touches a backend when it is built. Content is only pulled
/// when [`stream`](File::stream), [`buffer`](File::buffer) or
/// [`text`](File::text) is called, and each pull first refreshes `size`,
/// `content_type` and `last_modified` through the file's [`MetadataProvider`].
///
/// Files built from resident content (a string or a buffer) answer
/// `buffer()` and `text()` from the resident copy until the next `stream()`.
///
/// # Example
///
/// ```rust
/// use storagebus_file::{ByteStream, Content, ContentProducer, File};
/// use bytes::Bytes;
/// use futures::stream::{self, StreamExt};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let producer = ContentProducer::new(|| async {
///     let chunks: ByteStream = stream::iter(vec![Ok(Bytes::from("he")), Ok(Bytes::from("llo"))]).boxed();
///     Ok(chunks)
/// });
/// let mut file = File::new("greeting", Content::Producer(producer))?;
/// assert_eq!(file.size(), None);
/// assert_eq!(file.text().await?, "hello");
/// assert_eq!(file.size(), Some(5));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct File {
    name: String,
    producer: ContentProducer,
    refresh: MetadataProvider,
    fallback_type: String,
    size: Option<u64>,
    content_type: String,
    last_modified: Option<i64>,
    buffer: Option<Bytes>,
    text: Option<(&'static Encoding, String)>,
}

impl File {
    /// Build a file with default options (type inferred from `name`).
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if `name` is empty.
    pub fn new(name: impl Into<String>, content: impl Into<Content>) -> StorageBusResult<Self> {
        Self::builder(name, content).build()
    }

    /// Start building a file with explicit metadata or a metadata provider.
    pub fn builder(name: impl Into<String>, content: impl Into<Content>) -> FileBuilder {
        FileBuilder {
            name: name.into(),
            content: content.into(),
            size: None,
            content_type: None,
            last_modified: None,
            metadata_provider: None,
            mime: Some(MimeLookup::default()),
        }
    }

    /// Zero-length file.
    pub fn empty(name: impl Into<String>) -> StorageBusResult<Self> {
        Self::new(name, Content::Empty)
    }

    /// Name (key) of the file.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes from the last metadata snapshot.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// MIME type from the last metadata snapshot.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Last modification time (ms since the Unix epoch) from the last snapshot.
    pub fn last_modified(&self) -> Option<i64> {
        self.last_modified
    }

    /// The current metadata snapshot.
    pub fn metadata(&self) -> FileMetadata {
        FileMetadata {
            size: self.size,
            last_modified: self.last_modified,
            content_type: Some(self.content_type.clone()),
        }
    }

    /// Same content and metadata under a different name.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if `name` is empty.
    pub fn with_name(mut self, name: impl Into<String>) -> StorageBusResult<Self> {
        let name = name.into();
        validate_name(&name)?;
        self.name = name;
        Ok(self)
    }

    /// Refresh metadata, drop cached content and open a fresh byte stream.
    ///
    /// Every call yields an independent stream over the original content.
    #[tracing::instrument(skip(self), fields(name = %self.name))]
    pub async fn stream(&mut self) -> StorageBusResult<ByteStream> {
        let metadata = self.refresh.fetch().await;
        tracing::debug!(
            size = ?metadata.size,
            last_modified = ?metadata.last_modified,
            "Refreshed file metadata"
        );
        self.apply(metadata);
        self.buffer = None;
        self.text = None;
        self.producer.produce().await
    }

    /// The whole content as one buffer, cached after the first drain.
    #[tracing::instrument(skip(self), fields(name = %self.name))]
    pub async fn buffer(&mut self) -> StorageBusResult<Bytes> {
        if let Some(buffer) = &self.buffer {
            return Ok(buffer.clone());
        }

        let mut stream = self.stream().await?;
        let mut collected = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            collected.extend_from_slice(&chunk?);
        }
        let buffer = collected.freeze();

        if self.size.is_none() {
            self.size = Some(buffer.len() as u64);
        }
        tracing::debug!(size = buffer.len(), "Materialized file content");

        self.buffer = Some(buffer.clone());
        Ok(buffer)
    }

    /// The content decoded as UTF-8.
    pub async fn text(&mut self) -> StorageBusResult<String> {
        self.text_with_encoding(UTF_8).await
    }

    /// The content decoded with `encoding`; malformed sequences are replaced.
    pub async fn text_with_encoding(
        &mut self,
        encoding: &'static Encoding,
    ) -> StorageBusResult<String> {
        if let Some((cached, text)) = &self.text {
            if *cached == encoding {
                return Ok(text.clone());
            }
        }

        let buffer = self.buffer().await?;
        let (decoded, _) = encoding.decode_without_bom_handling(&buffer);
        let text = decoded.into_owned();
        self.text = Some((encoding, text.clone()));
        Ok(text)
    }

    /// An owned copy of the content.
    pub async fn array_buffer(&mut self) -> StorageBusResult<Vec<u8>> {
        Ok(self.buffer().await?.to_vec())
    }

    fn apply(&mut self, metadata: FileMetadata) {
        self.size = metadata.size;
        self.last_modified = metadata.last_modified;
        self.content_type = metadata
            .content_type
            .unwrap_or_else(|| self.fallback_type.clone());
    }
}

/// Builder for [`File`].
#[derive(Debug)]
pub struct FileBuilder {
    name: String,
    content: Content,
    size: Option<u64>,
    content_type: Option<String>,
    last_modified: Option<i64>,
    metadata_provider: Option<MetadataProvider>,
    mime: Option<MimeLookup>,
}

impl FileBuilder {
    /// Override the size (defaults to the resident content length).
    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Explicit MIME type; skips inference.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Last modification time in ms since the Unix epoch; `-1` means unknown.
    pub fn last_modified(mut self, last_modified: i64) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    /// Apply every known field of a metadata snapshot.
    pub fn metadata(mut self, metadata: FileMetadata) -> Self {
        if let Some(size) = metadata.size {
            self.size = Some(size);
        }
        if let Some(last_modified) = metadata.last_modified {
            self.last_modified = Some(last_modified);
        }
        if let Some(content_type) = metadata.content_type {
            self.content_type = Some(content_type);
        }
        self
    }

    /// Capability consulted on every `stream()`.
    ///
    /// Without one, the file keeps replaying its construction-time metadata.
    pub fn metadata_provider(mut self, provider: MetadataProvider) -> Self {
        self.metadata_provider = Some(provider);
        self
    }

    /// Enable or disable name-based type inference.
    ///
    /// Disabled inference leaves the type empty unless one is given explicitly.
    pub fn infer_type(mut self, infer: bool) -> Self {
        self.mime = if infer {
            Some(self.mime.unwrap_or_default())
        } else {
            None
        };
        self
    }

    /// Replace the inference table.
    pub fn mime_lookup(mut self, lookup: MimeLookup) -> Self {
        self.mime = Some(lookup);
        self
    }

    /// Validate the inputs and build the file.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if the name is empty or
    /// `last_modified` is below `-1`.
    pub fn build(self) -> StorageBusResult<File> {
        validate_name(&self.name)?;

        let last_modified = match self.last_modified {
            Some(-1) | None => None,
            Some(ts) if ts < -1 => {
                return Err(ArgumentError::invalid(format!(
                    "\"last_modified\" must be a timestamp or -1, found {}",
                    ts
                ))
                .into());
            }
            Some(ts) => Some(ts),
        };

        let fallback_type = match &self.mime {
            Some(lookup) => lookup.resolve(&self.name),
            None => String::new(),
        };
        let content_type = self
            .content_type
            .clone()
            .unwrap_or_else(|| fallback_type.clone());
        let size = self.size.or(self.content.resident_len());

        let refresh = self.metadata_provider.unwrap_or_else(|| {
            MetadataProvider::fixed(FileMetadata {
                size,
                last_modified,
                content_type: self.content_type.clone(),
            })
        });

        let producer = self.content.producer();
        let (buffer, text) = match self.content {
            Content::Empty => (Some(Bytes::new()), None),
            Content::Bytes(bytes) => (Some(bytes), None),
            Content::Text(text) => (Some(Bytes::from(text.clone())), Some((UTF_8, text))),
            Content::Producer(_) => (None, None),
        };

        Ok(File {
            name: self.name,
            producer,
            refresh,
            fallback_type,
            size,
            content_type,
            last_modified,
            buffer,
            text,
        })
    }
}

fn validate_name(name: &str) -> StorageBusResult<()> {
    if name.is_empty() {
        return Err(ArgumentError::invalid("\"name\" argument must be a non-empty string").into());
    }
    Ok(())
}
