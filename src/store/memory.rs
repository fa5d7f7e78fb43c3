//! In-memory store implementation
//!
//! Backs tests and development setups where durability across restarts
//! is not required.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::Result;

use super::{StoreClient, StoredItem};

/// Non-durable [`StoreClient`] backed by a concurrent map
#[derive(Default)]
pub struct MemoryStore {
    items: DashMap<String, StoredItem>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of items across all services.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the store holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn store(&self, mut item: StoredItem) -> Result<String> {
        item.validate(false)?;
        let id = item.id.clone();
        self.items.insert(id.clone(), item);
        Ok(id)
    }

    async fn update(&self, mut item: StoredItem) -> Result<()> {
        item.validate(true)?;
        self.items.insert(item.id.clone(), item);
        Ok(())
    }

    async fn remove_from_store(&self, item: &StoredItem) -> Result<()> {
        let mut item = item.clone();
        item.validate(true)?;
        self.items.remove(&item.id);
        Ok(())
    }

    async fn retrieve_from_store(&self, app_service_key: &str) -> Result<Vec<StoredItem>> {
        Ok(self
            .items
            .iter()
            .filter(|entry| entry.value().app_service_key == app_service_key)
            .map(|entry| entry.value().clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_retrieve_remove() {
        let store = MemoryStore::new();

        let id = store
            .store(StoredItem::new("svc-a", b"one".to_vec(), 0, "v1"))
            .await
            .unwrap();
        store
            .store(StoredItem::new("svc-b", b"two".to_vec(), 0, "v1"))
            .await
            .unwrap();

        let items = store.retrieve_from_store("svc-a").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, id);
        assert_eq!(items[0].payload, b"one");

        store.remove_from_store(&items[0]).await.unwrap();
        assert!(store.retrieve_from_store("svc-a").await.unwrap().is_empty());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_update_replaces() {
        let store = MemoryStore::new();
        let id = store
            .store(StoredItem::new("svc", b"payload".to_vec(), 1, "v1"))
            .await
            .unwrap();

        let mut item = store.retrieve_from_store("svc").await.unwrap().remove(0);
        item.retry_count = 3;
        store.update(item).await.unwrap();

        let items = store.retrieve_from_store("svc").await.unwrap();
        assert_eq!(items[0].id, id);
        assert_eq!(items[0].retry_count, 3);
    }

    #[tokio::test]
    async fn test_store_rejects_invalid() {
        let store = MemoryStore::new();
        let result = store
            .store(StoredItem::new("svc", Vec::new(), 0, "v1"))
            .await;
        assert!(result.is_err());
        assert!(store.is_empty());
    }
}
