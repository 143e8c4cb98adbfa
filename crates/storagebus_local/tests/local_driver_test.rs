//! Tests for the local filesystem driver.

use bytes::Bytes;
use futures::StreamExt;
use futures::stream;
use storagebus_error::{StorageBusResult, StorageError, StorageErrorKind};
use storagebus_local::LocalDriver;
use storagebus_storage::{ByteStream, Driver, DriverKind, Storage, compliance};
use tempfile::TempDir;

#[tokio::test]
async fn test_local_compliance() {
    let temp_dir = TempDir::new().unwrap();
    let storage = Storage::new(LocalDriver::new(temp_dir.path()).unwrap());

    compliance::run(&storage).await;
}

#[tokio::test]
async fn test_root_is_created() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("nested").join("root");

    let driver = LocalDriver::new(&root).unwrap();

    assert!(root.is_dir());
    assert_eq!(driver.root(), root.as_path());
    assert_eq!(driver.kind(), DriverKind::Local);
}

#[tokio::test]
async fn test_nested_directories_are_created() {
    let temp_dir = TempDir::new().unwrap();
    let storage = Storage::new(LocalDriver::new(temp_dir.path()).unwrap());

    let key = storage
        .write("a/deeply/nested/path/file.txt", "content")
        .await
        .unwrap();

    let on_disk = temp_dir.path().join("a/deeply/nested/path/file.txt");
    assert_eq!(std::fs::read_to_string(on_disk).unwrap(), "content");

    let mut file = storage.file(&key).await.unwrap();
    assert_eq!(file.size(), Some(7));
    assert_eq!(file.content_type(), "text/plain");
    assert!(file.last_modified().is_some());
    assert_eq!(file.text().await.unwrap(), "content");
}

#[tokio::test]
async fn test_missing_key() {
    let temp_dir = TempDir::new().unwrap();
    let storage = Storage::new(LocalDriver::new(temp_dir.path()).unwrap());

    assert!(!storage.exists("missing.txt").await.unwrap());

    let mut file = storage.file("missing.txt").await.unwrap();
    assert_eq!(file.size(), Some(0));
    assert_eq!(file.last_modified(), None);
    assert!(file.buffer().await.unwrap_err().is_not_found());

    // deleting an absent key succeeds
    storage.write("missing.txt", None::<String>).await.unwrap();
}

#[tokio::test]
async fn test_overwrite_and_delete() {
    let temp_dir = TempDir::new().unwrap();
    let storage = Storage::new(LocalDriver::new(temp_dir.path()).unwrap());

    storage.write("doc.md", "first version").await.unwrap();
    storage.write("doc.md", "second").await.unwrap();
    let mut file = storage.file("doc.md").await.unwrap();
    assert_eq!(file.text().await.unwrap(), "second");
    assert_eq!(file.size(), Some(6));

    storage.write("doc.md", None::<String>).await.unwrap();
    assert!(!temp_dir.path().join("doc.md").exists());
    assert!(!storage.exists("doc.md").await.unwrap());
}

#[tokio::test]
async fn test_directories_are_not_objects() {
    let temp_dir = TempDir::new().unwrap();
    let storage = Storage::new(LocalDriver::new(temp_dir.path()).unwrap());

    storage.write("dir/file.txt", "x").await.unwrap();

    assert!(!storage.exists("dir").await.unwrap());
    assert_eq!(storage.file("dir").await.unwrap().size(), Some(0));
}

#[tokio::test]
async fn test_escaping_keys_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let storage = Storage::new(LocalDriver::new(temp_dir.path()).unwrap());

    let err = storage.write("../outside.txt", "x").await.unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(!temp_dir.path().parent().unwrap().join("outside.txt").exists());
}

#[tokio::test]
async fn test_copy_and_rename() {
    let temp_dir = TempDir::new().unwrap();
    let storage = Storage::new(LocalDriver::new(temp_dir.path()).unwrap());
    storage.write("src.txt", "payload").await.unwrap();

    storage.copy("src.txt", "copies/one.txt").await.unwrap();
    assert!(storage.exists("src.txt").await.unwrap());
    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("copies/one.txt")).unwrap(),
        "payload"
    );

    storage.move_to("src.txt", "moved/two.txt").await.unwrap();
    assert!(!storage.exists("src.txt").await.unwrap());
    assert_eq!(
        storage.file("moved/two.txt").await.unwrap().text().await.unwrap(),
        "payload"
    );

    let err = storage.move_to("src.txt", "three.txt").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_write_file_back_to_its_own_key() {
    let temp_dir = TempDir::new().unwrap();
    let storage = Storage::new(LocalDriver::new(temp_dir.path()).unwrap());
    storage.write("a.txt", "precious").await.unwrap();

    let handle = storage.file("a.txt").await.unwrap();
    storage.write("a.txt", handle).await.unwrap();

    let mut file = storage.file("a.txt").await.unwrap();
    assert_eq!(file.size(), Some(8));
    assert_eq!(file.text().await.unwrap(), "precious");
}

#[tokio::test]
async fn test_failed_stream_keeps_previous_content() {
    let temp_dir = TempDir::new().unwrap();
    let storage = Storage::new(LocalDriver::new(temp_dir.path()).unwrap());
    storage.write("doc.txt", "good old content").await.unwrap();

    let chunks: Vec<StorageBusResult<Bytes>> = vec![
        Ok(Bytes::from("par")),
        Err(StorageError::new(StorageErrorKind::FileRead("connection reset".to_string())).into()),
    ];
    let content: ByteStream = stream::iter(chunks).boxed();

    let err = storage.write("doc.txt", content).await.unwrap_err();
    assert!(err.to_string().contains("connection reset"));

    let mut file = storage.file("doc.txt").await.unwrap();
    assert_eq!(file.text().await.unwrap(), "good old content");

    // no staging files left behind
    let entries: Vec<_> = std::fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("doc.txt")]);
}

#[tokio::test]
async fn test_failed_stream_creates_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let storage = Storage::new(LocalDriver::new(temp_dir.path()).unwrap());

    let chunks: Vec<StorageBusResult<Bytes>> =
        vec![Err(StorageError::not_found("upstream").into())];
    let content: ByteStream = stream::iter(chunks).boxed();

    assert!(storage.write("nested/new.txt", content).await.is_err());
    assert!(!storage.exists("nested/new.txt").await.unwrap());
}
