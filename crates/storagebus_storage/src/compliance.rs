//! Behavioral checks every driver must pass behind a [`Storage`].
//!
//! Driver crates call [`run`] from their own tests. Failures panic with a
//! message naming the payload shape and the check.

use crate::{Payload, Storage};
use bytes::Bytes;
use futures::StreamExt;
use futures::stream;
use storagebus_file::{ByteStream, DEFAULT_CONTENT_TYPE, File};
use uuid::Uuid;

/// Run the whole suite against `storage`.
///
/// Uses fresh random keys and leaves the objects it wrote behind.
pub async fn run(storage: &Storage) {
    let key = Uuid::new_v4().to_string();
    let content = key.repeat(6 * 1024);
    check(storage, "string", &key, Some(content.as_str()), || Payload::from(content.clone())).await;

    let key = Uuid::new_v4().to_string();
    let content = key.repeat(6 * 1024);
    check(storage, "bytes", &key, Some(content.as_str()), || {
        Payload::from(Bytes::from(content.clone()))
    })
    .await;

    let key = Uuid::new_v4().to_string();
    let content = key.repeat(6 * 1024);
    check(storage, "stream", &key, Some(content.as_str()), || {
        Payload::from(chunked(&content))
    })
    .await;

    let key = Uuid::new_v4().to_string();
    check(storage, "remove", &key, None, || Payload::Remove).await;

    let key = Uuid::new_v4().to_string();
    check(storage, "file", &key, Some(""), || match File::empty(key.as_str()) {
        Ok(file) => Payload::File(file),
        Err(e) => panic!("[file] building payload: {}", e),
    })
    .await;
}

/// One-shot stream of `content` in 4 KiB chunks.
fn chunked(content: &str) -> ByteStream {
    let chunks: Vec<_> = content
        .as_bytes()
        .chunks(4096)
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
        .collect();
    stream::iter(chunks).boxed()
}

/// `expected` is `None` when the payload deletes the key.
async fn check<F>(storage: &Storage, shape: &str, key: &str, expected: Option<&str>, payload: F)
where
    F: Fn() -> Payload,
{
    let size = expected.map_or(0, |content| content.len() as u64);

    // write returns the key and the handle describes what was written
    let written = storage
        .write(key, payload())
        .await
        .unwrap_or_else(|e| panic!("[{}] write: {}", shape, e));
    assert_eq!(written, key, "[{}] write returns the key", shape);

    let file = storage
        .file(&written)
        .await
        .unwrap_or_else(|e| panic!("[{}] file: {}", shape, e));
    assert_eq!(file.name(), written, "[{}] file name", shape);
    assert_eq!(file.size(), Some(size), "[{}] file size", shape);
    assert_eq!(file.content_type(), DEFAULT_CONTENT_TYPE, "[{}] file type", shape);
    assert_eq!(
        storage.exists(&written).await.ok(),
        Some(expected.is_some()),
        "[{}] exists after write",
        shape
    );

    // a file handle works as a destination
    let destination = File::empty(key).unwrap_or_else(|e| panic!("[{}] handle: {}", shape, e));
    let written = storage
        .write(&destination, chunked("foo"))
        .await
        .unwrap_or_else(|e| panic!("[{}] write to handle: {}", shape, e));
    assert_eq!(written, key, "[{}] handle destination keeps its name", shape);
    let file = storage
        .file(&written)
        .await
        .unwrap_or_else(|e| panic!("[{}] file after handle write: {}", shape, e));
    assert_eq!(file.size(), Some(3), "[{}] size after handle write", shape);
    assert_eq!(file.content_type(), DEFAULT_CONTENT_TYPE, "[{}] type after handle write", shape);

    // content accessors
    storage
        .write(key, payload())
        .await
        .unwrap_or_else(|e| panic!("[{}] rewrite: {}", shape, e));
    let mut file = storage
        .file(key)
        .await
        .unwrap_or_else(|e| panic!("[{}] file after rewrite: {}", shape, e));
    match expected {
        Some(content) => {
            let buffer = file
                .buffer()
                .await
                .unwrap_or_else(|e| panic!("[{}] buffer: {}", shape, e));
            assert_eq!(buffer.len() as u64, size, "[{}] buffer length", shape);
            let array = file
                .array_buffer()
                .await
                .unwrap_or_else(|e| panic!("[{}] array_buffer: {}", shape, e));
            assert_eq!(array.len() as u64, size, "[{}] array_buffer length", shape);
            let text = file
                .text()
                .await
                .unwrap_or_else(|e| panic!("[{}] text: {}", shape, e));
            assert_eq!(text, content, "[{}] text", shape);
        }
        None => {
            let err = file.text().await.err();
            assert!(
                err.as_ref().is_some_and(|e| e.is_not_found()),
                "[{}] reading a removed key fails with NotFound, got {:?}",
                shape,
                err
            );
        }
    }

    // the handle can be consumed more than once
    storage
        .write(key, payload())
        .await
        .unwrap_or_else(|e| panic!("[{}] rewrite: {}", shape, e));
    let mut file = storage
        .file(key)
        .await
        .unwrap_or_else(|e| panic!("[{}] file for double read: {}", shape, e));
    match expected {
        Some(content) => {
            let mut consumed = Vec::new();
            for _ in 0..2 {
                let mut stream = file
                    .stream()
                    .await
                    .unwrap_or_else(|e| panic!("[{}] stream: {}", shape, e));
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk.unwrap_or_else(|e| panic!("[{}] chunk: {}", shape, e));
                    consumed.extend_from_slice(&chunk);
                }
            }
            assert_eq!(
                consumed,
                content.repeat(2).into_bytes(),
                "[{}] double consumption",
                shape
            );
        }
        None => {
            let err = file.stream().await.err();
            assert!(
                err.as_ref().is_some_and(|e| e.is_not_found()),
                "[{}] streaming a removed key fails with NotFound",
                shape
            );
        }
    }
}
