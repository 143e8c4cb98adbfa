//! Tests for the object-store driver against an in-memory client.

use bytes::Bytes;
use futures::StreamExt;
use futures::stream;
use object_store::ObjectStore;
use object_store::memory::InMemory;
use object_store::path::Path;
use std::sync::Arc;
use storagebus_cloud::{GcsOptions, MULTIPART_THRESHOLD, ObjectStoreDriver, S3Options};
use storagebus_storage::{ByteStream, Driver, DriverKind, Storage, compliance};

fn in_memory(kind: DriverKind) -> (Arc<InMemory>, Storage) {
    let store = Arc::new(InMemory::new());
    let driver = ObjectStoreDriver::new(store.clone(), kind);
    (store, Storage::new(driver))
}

#[tokio::test]
async fn test_s3_compliance() {
    let (_, storage) = in_memory(DriverKind::S3);
    compliance::run(&storage).await;
}

#[tokio::test]
async fn test_gcs_compliance() {
    let (_, storage) = in_memory(DriverKind::Gcs);
    compliance::run(&storage).await;
}

#[tokio::test]
async fn test_write_lands_in_store() {
    let (store, storage) = in_memory(DriverKind::S3);

    storage.write("docs/readme.md", "# hello").await.unwrap();

    let stored = store
        .get(&Path::from("docs/readme.md"))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(stored, Bytes::from("# hello"));

    let mut file = storage.file("docs/readme.md").await.unwrap();
    assert_eq!(file.size(), Some(7));
    assert!(file.last_modified().is_some());
    assert_eq!(file.text().await.unwrap(), "# hello");
}

#[tokio::test]
async fn test_large_content_uses_multipart() {
    let (store, storage) = in_memory(DriverKind::S3);
    let total = MULTIPART_THRESHOLD + 1024 * 1024;

    let chunk = Bytes::from(vec![7u8; 256 * 1024]);
    let chunks: Vec<_> = (0..total / chunk.len()).map(|_| Ok(chunk.clone())).collect();
    let content: ByteStream = stream::iter(chunks).boxed();

    storage.write("big.bin", content).await.unwrap();

    let meta = store.head(&Path::from("big.bin")).await.unwrap();
    assert_eq!(meta.size as u64, total as u64);

    let file = storage.file("big.bin").await.unwrap();
    assert_eq!(file.size(), Some(total as u64));
}

#[tokio::test]
async fn test_missing_object() {
    let (_, storage) = in_memory(DriverKind::Gcs);

    assert!(!storage.exists("nope.txt").await.unwrap());

    let mut file = storage.file("nope.txt").await.unwrap();
    assert_eq!(file.size(), Some(0));
    assert_eq!(file.last_modified(), None);
    assert!(file.text().await.unwrap_err().is_not_found());

    storage.write("nope.txt", None::<String>).await.unwrap();
}

#[tokio::test]
async fn test_copy_and_move() {
    let (store, storage) = in_memory(DriverKind::S3);
    storage.write("a.txt", "payload").await.unwrap();

    storage.copy("a.txt", "b.txt").await.unwrap();
    assert!(storage.exists("a.txt").await.unwrap());
    assert!(storage.exists("b.txt").await.unwrap());

    storage.move_to("b.txt", "archive/c.txt").await.unwrap();
    assert!(!storage.exists("b.txt").await.unwrap());
    assert!(store.head(&Path::from("archive/c.txt")).await.is_ok());

    let err = storage.move_to("b.txt", "d.txt").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_driver_kind_and_metadata_for_invalid_key() {
    let driver = ObjectStoreDriver::new(Arc::new(InMemory::new()), DriverKind::Gcs);
    assert_eq!(driver.kind(), DriverKind::Gcs);

    let meta = driver.metadata("a//b").await;
    assert_eq!(meta.size, Some(0));
    assert!(driver.delete("a//b").await.unwrap_err().is_invalid_argument());
}

#[test]
fn test_builders_validate_bucket() {
    let err = ObjectStoreDriver::s3(&S3Options::new("")).unwrap_err();
    assert!(err.to_string().contains("bucket"));

    let err = ObjectStoreDriver::gcs(&GcsOptions::new("")).unwrap_err();
    assert!(err.to_string().contains("bucket"));
}

#[test]
fn test_s3_builder_makes_no_requests() {
    let options = S3Options::new("media")
        .with_region("eu-west-1")
        .with_endpoint("http://localhost:9000")
        .with_credentials("minio", "minio123")
        .with_allow_http(true);

    let driver = ObjectStoreDriver::s3(&options).unwrap();
    assert_eq!(driver.kind(), DriverKind::S3);
}
