//! Tests for the lazy file handle.

use bytes::Bytes;
use futures::StreamExt;
use futures::stream;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use storagebus_file::{
    ByteStream, Content, ContentProducer, DEFAULT_CONTENT_TYPE, File, FileMetadata,
    MetadataProvider, MimeLookup,
};

fn counting_producer(text: &'static str, calls: Arc<AtomicUsize>) -> ContentProducer {
    ContentProducer::new(move || {
        calls.fetch_add(1, Ordering::SeqCst);
        async move {
            let chunks: ByteStream = stream::iter(
                text.as_bytes()
                    .chunks(2)
                    .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
                    .collect::<Vec<_>>(),
            )
            .boxed();
            Ok(chunks)
        }
    })
}

async fn drain(mut stream: ByteStream) -> String {
    let mut out = Vec::new();
    while let Some(chunk) = stream.next().await {
        out.extend_from_slice(&chunk.unwrap());
    }
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn test_file_from_producer() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut file = File::new("hello.txt", counting_producer("hello", calls.clone())).unwrap();

    assert_eq!(file.name(), "hello.txt");
    assert_eq!(file.size(), None);
    assert_eq!(file.last_modified(), None);
    assert_eq!(file.content_type(), "text/plain");
    assert_eq!(calls.load(Ordering::SeqCst), 0, "construction must not invoke the producer");

    assert_eq!(file.text().await.unwrap(), "hello");
    assert_eq!(file.buffer().await.unwrap(), Bytes::from("hello"));
    assert_eq!(file.array_buffer().await.unwrap(), b"hello".to_vec());
    assert_eq!(calls.load(Ordering::SeqCst), 1, "buffer is cached after the first drain");
    assert_eq!(file.size(), Some(5));
}

#[tokio::test]
async fn test_file_from_string() {
    let mut file = File::new("hello.txt", "hello").unwrap();

    assert_eq!(file.size(), Some(5));
    assert_eq!(file.content_type(), "text/plain");
    assert_eq!(file.last_modified(), None);
    assert_eq!(file.text().await.unwrap(), "hello");
    assert_eq!(file.buffer().await.unwrap(), Bytes::from("hello"));
}

#[tokio::test]
async fn test_file_from_bytes_with_metadata() {
    let file = File::builder("hello.txt", Bytes::from("hello"))
        .size(5)
        .last_modified(1_700_000_000_000)
        .content_type("text/markdown")
        .build()
        .unwrap();

    assert_eq!(file.size(), Some(5));
    assert_eq!(file.last_modified(), Some(1_700_000_000_000));
    assert_eq!(file.content_type(), "text/markdown");
}

#[tokio::test]
async fn test_file_empty() {
    let mut file = File::empty("hello.txt").unwrap();

    assert_eq!(file.size(), Some(0));
    assert_eq!(file.text().await.unwrap(), "");
    assert!(file.buffer().await.unwrap().is_empty());
    assert_eq!(drain(file.stream().await.unwrap()).await, "");
}

#[tokio::test]
async fn test_resident_buffer_does_not_invoke_producer() {
    let mut file = File::new("data.bin", vec![1u8, 2, 3]).unwrap();

    let first = file.buffer().await.unwrap();
    let second = file.buffer().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.as_ref(), &[1, 2, 3]);
}

#[tokio::test]
async fn test_stream_is_replayable() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut file = File::new("k", counting_producer("hello", calls.clone())).unwrap();

    let mut consumed = drain(file.stream().await.unwrap()).await;
    consumed.push_str(&drain(file.stream().await.unwrap()).await);

    assert_eq!(consumed, "hellohello");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_resident_stream_is_replayable() {
    let mut file = File::new("k", "hello").unwrap();

    let first = file.stream().await.unwrap();
    let second = file.stream().await.unwrap();

    assert_eq!(drain(second).await, "hello");
    assert_eq!(drain(first).await, "hello");
}

#[tokio::test]
async fn test_stream_refreshes_metadata() {
    let probes = Arc::new(AtomicUsize::new(0));
    let counter = probes.clone();
    let provider = MetadataProvider::new(move || {
        let n = counter.fetch_add(1, Ordering::SeqCst) as i64;
        async move {
            FileMetadata::default()
                .with_size(5)
                .with_last_modified(1000 + n)
                .with_content_type("text/x-greeting")
        }
    });

    let mut file = File::builder("greeting", "hello")
        .metadata_provider(provider)
        .build()
        .unwrap();
    assert_eq!(file.last_modified(), None);
    assert_eq!(file.content_type(), DEFAULT_CONTENT_TYPE);

    let _ = file.stream().await.unwrap();
    assert_eq!(file.last_modified(), Some(1000));
    assert_eq!(file.content_type(), "text/x-greeting");

    let _ = file.stream().await.unwrap();
    assert_eq!(file.last_modified(), Some(1001));
    assert_eq!(probes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_stream_clears_cached_text() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut file = File::new("k", counting_producer("abc", calls.clone())).unwrap();

    assert_eq!(file.text().await.unwrap(), "abc");
    let _ = file.stream().await.unwrap();
    assert_eq!(file.text().await.unwrap(), "abc");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_one_shot_stream_is_consumed_once() {
    let chunks: ByteStream = stream::iter(vec![Ok(Bytes::from("once"))]).boxed();
    let mut file = File::new("k", Content::from_stream(chunks)).unwrap();

    assert_eq!(drain(file.stream().await.unwrap()).await, "once");
    let err = file.stream().await.err().unwrap();
    assert!(err.to_string().contains("Stream already consumed"));
}

#[tokio::test]
async fn test_text_with_encoding() {
    let mut file = File::new("latin1.txt", vec![0x63u8, 0x61, 0x66, 0xE9]).unwrap();

    let text = file
        .text_with_encoding(encoding_rs::WINDOWS_1252)
        .await
        .unwrap();
    assert_eq!(text, "café");

    let utf8 = file.text().await.unwrap();
    assert_eq!(utf8, "caf\u{FFFD}");
}

#[test]
fn test_type_inference() {
    assert_eq!(File::empty("photo.png").unwrap().content_type(), "image/png");
    assert_eq!(File::empty("a/b/report.pdf").unwrap().content_type(), "application/pdf");
    assert_eq!(
        File::empty("8b0c6a9e-6f3d-4f0e-9a34-8f0b1e2d3c4b").unwrap().content_type(),
        DEFAULT_CONTENT_TYPE
    );

    let disabled = File::builder("photo.png", Content::Empty)
        .infer_type(false)
        .build()
        .unwrap();
    assert_eq!(disabled.content_type(), "");

    let custom = File::builder("photo.png", Content::Empty)
        .mime_lookup(MimeLookup::new(|_| Some("image/x-custom".to_string())))
        .build()
        .unwrap();
    assert_eq!(custom.content_type(), "image/x-custom");
}

#[test]
fn test_invalid_arguments() {
    let err = File::new("", "hello").unwrap_err();
    assert!(err.is_invalid_argument());

    let err = File::builder("k", "hello").last_modified(-5).build().unwrap_err();
    assert!(err.is_invalid_argument());

    let unknown = File::builder("k", "hello").last_modified(-1).build().unwrap();
    assert_eq!(unknown.last_modified(), None);

    let err = File::new("k", "hello").unwrap().with_name("").unwrap_err();
    assert!(err.is_invalid_argument());
}
