//! Content shapes accepted by a [`File`](crate::File).

use bytes::Bytes;
use futures::FutureExt;
use futures::future::BoxFuture;
use futures::stream::{self, BoxStream, StreamExt};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use storagebus_error::{StorageBusResult, StorageError, StorageErrorKind};

/// A finite stream of byte chunks.
pub type ByteStream = BoxStream<'static, StorageBusResult<Bytes>>;

type ProduceFn = dyn Fn() -> BoxFuture<'static, StorageBusResult<ByteStream>> + Send + Sync;

/// Zero-argument factory yielding a fresh byte stream per invocation.
///
/// Producers are expected to be replayable: each call re-opens the content
/// from a stable source (a resident buffer, a file path, an object key).
/// [`ContentProducer::once`] is the single exception.
#[derive(Clone)]
pub struct ContentProducer(Arc<ProduceFn>);

impl ContentProducer {
    /// Wrap an async factory function.
    pub fn new<F, Fut>(produce: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StorageBusResult<ByteStream>> + Send + 'static,
    {
        Self(Arc::new(move || produce().boxed()))
    }

    /// Producer replaying a resident buffer.
    pub fn from_bytes(bytes: Bytes) -> Self {
        Self::new(move || {
            let bytes = bytes.clone();
            async move { Ok(single_chunk(bytes)) }
        })
    }

    /// Producer of a zero-length stream.
    pub fn empty() -> Self {
        Self::new(|| async { Ok(stream::empty().boxed()) })
    }

    /// Producer handing out an already-open stream exactly once.
    ///
    /// Any later invocation fails with [`StorageErrorKind::StreamConsumed`].
    pub fn once(stream: ByteStream) -> Self {
        let slot = Arc::new(Mutex::new(Some(stream)));
        Self::new(move || {
            let taken = slot.lock().ok().and_then(|mut guard| guard.take());
            async move {
                taken.ok_or_else(|| {
                    StorageError::new(StorageErrorKind::StreamConsumed(
                        "one-shot content stream".to_string(),
                    ))
                    .into()
                })
            }
        })
    }

    /// Invoke the factory.
    pub async fn produce(&self) -> StorageBusResult<ByteStream> {
        (self.0)().await
    }
}

impl fmt::Debug for ContentProducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContentProducer(..)")
    }
}

fn single_chunk(bytes: Bytes) -> ByteStream {
    if bytes.is_empty() {
        stream::empty().boxed()
    } else {
        stream::once(async move { Ok(bytes) }).boxed()
    }
}

/// The four content shapes a [`File`](crate::File) can be built from.
#[derive(Debug, Clone, Default)]
pub enum Content {
    /// Zero-length content
    #[default]
    Empty,
    /// Resident bytes
    Bytes(Bytes),
    /// Resident text, stored as UTF-8
    Text(String),
    /// Lazily produced content
    Producer(ContentProducer),
}

impl Content {
    /// Wrap a one-shot stream (see [`ContentProducer::once`]).
    pub fn from_stream(stream: ByteStream) -> Self {
        Content::Producer(ContentProducer::once(stream))
    }

    /// Length of resident content; `None` for producers.
    pub fn resident_len(&self) -> Option<u64> {
        match self {
            Content::Empty => Some(0),
            Content::Bytes(bytes) => Some(bytes.len() as u64),
            Content::Text(text) => Some(text.len() as u64),
            Content::Producer(_) => None,
        }
    }

    pub(crate) fn producer(&self) -> ContentProducer {
        match self {
            Content::Empty => ContentProducer::empty(),
            Content::Bytes(bytes) => ContentProducer::from_bytes(bytes.clone()),
            Content::Text(text) => ContentProducer::from_bytes(Bytes::from(text.clone())),
            Content::Producer(producer) => producer.clone(),
        }
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Content::Bytes(Bytes::from(bytes))
    }
}

impl From<&[u8]> for Content {
    fn from(bytes: &[u8]) -> Self {
        Content::Bytes(Bytes::copy_from_slice(bytes))
    }
}

impl From<Bytes> for Content {
    fn from(bytes: Bytes) -> Self {
        Content::Bytes(bytes)
    }
}

impl From<ContentProducer> for Content {
    fn from(producer: ContentProducer) -> Self {
        Content::Producer(producer)
    }
}
