//! Process-local driver.

use crate::{Driver, DriverKind};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use storagebus_error::{StorageBusResult, StorageError};
use storagebus_file::{Content, ContentProducer, File, FileMetadata};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct MemoryObject {
    data: Bytes,
    content_type: Option<String>,
    last_modified: i64,
}

/// Driver keeping objects in a shared map.
///
/// Clones share the same map. Each `set`, `delete` and `rename` is atomic
/// with respect to other calls; no lock is held while content is streamed.
#[derive(Debug, Clone, Default)]
pub struct MemoryDriver {
    objects: Arc<RwLock<HashMap<String, MemoryObject>>>,
}

impl MemoryDriver {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl Driver for MemoryDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Memory
    }

    #[tracing::instrument(skip(self, file), fields(key = %file.name()))]
    async fn set(&self, file: &mut File) -> StorageBusResult<String> {
        let data = file.buffer().await?;
        let content_type = Some(file.content_type())
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let key = file.name().to_string();

        tracing::debug!(size = data.len(), "Storing object in memory");
        self.objects.write().await.insert(
            key.clone(),
            MemoryObject {
                data,
                content_type,
                last_modified: chrono::Utc::now().timestamp_millis(),
            },
        );
        Ok(key)
    }

    async fn get(&self, key: &str) -> StorageBusResult<Option<Content>> {
        let objects = Arc::clone(&self.objects);
        let key = key.to_string();
        let producer = ContentProducer::new(move || {
            let objects = Arc::clone(&objects);
            let key = key.clone();
            async move {
                let data = objects
                    .read()
                    .await
                    .get(&key)
                    .map(|object| object.data.clone())
                    .ok_or_else(|| StorageError::not_found(key.as_str()))?;
                ContentProducer::from_bytes(data).produce().await
            }
        });
        Ok(Some(Content::Producer(producer)))
    }

    async fn metadata(&self, key: &str) -> FileMetadata {
        match self.objects.read().await.get(key) {
            Some(object) => FileMetadata {
                size: Some(object.data.len() as u64),
                last_modified: Some(object.last_modified),
                content_type: object.content_type.clone(),
            },
            None => FileMetadata::missing(),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, key: &str) -> StorageBusResult<()> {
        if self.objects.write().await.remove(key).is_none() {
            tracing::debug!("Nothing stored under key");
        }
        Ok(())
    }

    async fn has(&self, key: &str) -> StorageBusResult<bool> {
        Ok(self.objects.read().await.contains_key(key))
    }

    #[tracing::instrument(skip(self))]
    async fn copy(&self, from: &str, to: &str) -> StorageBusResult<()> {
        let mut objects = self.objects.write().await;
        let mut object = objects
            .get(from)
            .cloned()
            .ok_or_else(|| StorageError::not_found(from))?;
        object.last_modified = chrono::Utc::now().timestamp_millis();
        objects.insert(to.to_string(), object);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn rename(&self, from: &str, to: &str) -> StorageBusResult<()> {
        let mut objects = self.objects.write().await;
        let object = objects
            .remove(from)
            .ok_or_else(|| StorageError::not_found(from))?;
        objects.insert(to.to_string(), object);
        Ok(())
    }
}
