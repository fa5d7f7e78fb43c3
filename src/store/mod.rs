//! Store-and-forward item storage
//!
//! [`StoredItem`] is the implementation-agnostic record of a single event
//! that failed mid-pipeline and must be replayed. [`StoreClient`] is the
//! abstract durable store; [`MemoryStore`] backs tests and development,
//! [`FileStore`] persists to a JSON file for single-node deployments.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EdgeflowError, Result};

/// Durable record of one in-flight event awaiting replay
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredItem {
    /// Unique id, assigned on first insert
    pub id: String,
    /// Partition key identifying the owning service instance
    pub app_service_key: String,
    /// The payload to re-feed on replay
    pub payload: Vec<u8>,
    /// How many retry rounds have processed this item
    pub retry_count: u32,
    /// Offset of the next function to invoke on replay
    pub pipeline_position: usize,
    /// Pipeline fingerprint at the time the item was written
    pub version: String,
    /// Traceability id provided by the trigger
    pub correlation_id: String,
    /// Event id used to acknowledge the upstream event
    pub event_id: String,
    /// Event checksum used to acknowledge CBOR-encoded upstream events
    pub event_checksum: String,
}

impl StoredItem {
    /// Create a new item; the preferred way to build one before insert.
    pub fn new(
        app_service_key: impl Into<String>,
        payload: Vec<u8>,
        pipeline_position: usize,
        version: impl Into<String>,
    ) -> Self {
        Self {
            app_service_key: app_service_key.into(),
            payload,
            retry_count: 0,
            pipeline_position,
            version: version.into(),
            ..Default::default()
        }
    }

    /// Ensure the required fields are present.
    ///
    /// When `id_required` is false a missing id is generated; a present id
    /// must always parse as a UUID and is normalized to its canonical
    /// hyphenated form.
    pub fn validate(&mut self, id_required: bool) -> Result<()> {
        if self.id.is_empty() {
            if id_required {
                return Err(EdgeflowError::InvalidStoredItem(
                    "id cannot be empty".to_string(),
                ));
            }
            self.id = Uuid::new_v4().to_string();
        }

        let parsed = Uuid::parse_str(&self.id)
            .map_err(|_| EdgeflowError::InvalidStoredItem("id must be a UUID".to_string()))?;
        self.id = parsed.to_string();

        if self.app_service_key.is_empty() {
            return Err(EdgeflowError::InvalidStoredItem(
                "app service key cannot be empty".to_string(),
            ));
        }
        if self.payload.is_empty() {
            return Err(EdgeflowError::InvalidStoredItem(
                "payload cannot be empty".to_string(),
            ));
        }
        if self.version.is_empty() {
            return Err(EdgeflowError::InvalidStoredItem(
                "version cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Abstract durable store for retry items
///
/// Implementations must serialize concurrent `update` calls on the same
/// id; the engine never holds two operations in flight on one item.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Insert a new item, returning its id.
    async fn store(&self, item: StoredItem) -> Result<String>;

    /// Replace an existing item; the id must be set.
    async fn update(&self, item: StoredItem) -> Result<()>;

    /// Remove an existing item; the id must be set.
    async fn remove_from_store(&self, item: &StoredItem) -> Result<()>;

    /// List all items belonging to `app_service_key`.
    async fn retrieve_from_store(&self, app_service_key: &str) -> Result<Vec<StoredItem>>;
}
