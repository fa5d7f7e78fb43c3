//! JSON-file store implementation
//!
//! Persists the full item map to a single JSON file, writing to a temp
//! file and renaming for atomicity. Suitable for single-node edge
//! deployments; the in-process mutex serializes concurrent updates.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{EdgeflowError, Result};

use super::{StoreClient, StoredItem};

/// Durable [`StoreClient`] backed by one JSON file
pub struct FileStore {
    path: PathBuf,
    items: Mutex<HashMap<String, StoredItem>>,
}

impl FileStore {
    /// Open or create the store at `path`.
    pub fn new(path: PathBuf) -> Result<Self> {
        let items = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)
                .map_err(|e| EdgeflowError::store(format!("failed to parse {:?}: {e}", path)))?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    fn persist(&self, items: &HashMap<String, StoredItem>) -> Result<()> {
        let content = serde_json::to_string(items)?;
        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, content)?;
        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl StoreClient for FileStore {
    async fn store(&self, mut item: StoredItem) -> Result<String> {
        item.validate(false)?;
        let id = item.id.clone();
        let mut items = self.items.lock();
        items.insert(id.clone(), item);
        self.persist(&items)?;
        Ok(id)
    }

    async fn update(&self, mut item: StoredItem) -> Result<()> {
        item.validate(true)?;
        let mut items = self.items.lock();
        items.insert(item.id.clone(), item);
        self.persist(&items)
    }

    async fn remove_from_store(&self, item: &StoredItem) -> Result<()> {
        let mut item = item.clone();
        item.validate(true)?;
        let mut items = self.items.lock();
        items.remove(&item.id);
        self.persist(&items)
    }

    async fn retrieve_from_store(&self, app_service_key: &str) -> Result<Vec<StoredItem>> {
        Ok(self
            .items
            .lock()
            .values()
            .filter(|item| item.app_service_key == app_service_key)
            .cloned()
            .collect())
    }
}
