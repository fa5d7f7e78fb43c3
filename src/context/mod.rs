//! Per-event processing context
//!
//! One [`Context`] is created by the trigger for each incoming event and
//! discarded when processing returns. Pipeline functions use it to set
//! the final output, deposit retry data for store-and-forward, reach the
//! core-data service, and resolve secrets. Errors from these operations
//! are returned to the calling function, never thrown across the
//! runtime.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;
use uuid::Uuid;

use crate::clients::CoreDataClient;
use crate::config::WritableConfig;
use crate::error::{EdgeflowError, Result};
use crate::function::Value;
use crate::models::{Event, Reading};
use crate::security::SecretProvider;

/// Per-event carrier handed to every pipeline function
#[derive(Clone, Default)]
pub struct Context {
    /// Id tracking this event across services
    pub correlation_id: String,
    /// Id of the triggering event, when it arrived as JSON
    pub event_id: String,
    /// Checksum of the triggering event, when it arrived as CBOR
    pub event_checksum: String,
    /// Final output for the trigger to deliver; set via [`Context::complete`]
    pub output_data: Option<Bytes>,
    /// Payload to persist if the current function signals failure
    pub retry_data: Option<Bytes>,
    /// Snapshot of the writable configuration taken at event entry
    pub writable: WritableConfig,
    core_data: Option<Arc<CoreDataClient>>,
    secret_provider: Option<Arc<SecretProvider>>,
}

impl Context {
    /// Create a context for one event.
    pub fn new(correlation_id: impl Into<String>, writable: WritableConfig) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            writable,
            ..Default::default()
        }
    }

    /// Attach the core-data client.
    pub fn with_core_data(mut self, client: Arc<CoreDataClient>) -> Self {
        self.core_data = Some(client);
        self
    }

    /// Attach the secret provider.
    pub fn with_secret_provider(mut self, provider: Arc<SecretProvider>) -> Self {
        self.secret_provider = Some(provider);
        self
    }

    /// Record the id of the triggering event.
    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = event_id.into();
        self
    }

    /// Record the checksum of the triggering event.
    pub fn with_event_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.event_checksum = checksum.into();
        self
    }

    /// Set the data the trigger returns once the pipeline completes.
    ///
    /// For the HTTP trigger this becomes the response body; for the
    /// message-bus trigger it is published to the configured topic.
    pub fn complete(&mut self, output: Bytes) {
        self.output_data = Some(output);
    }

    /// Deposit the payload to persist should this function then fail.
    pub fn set_retry_data(&mut self, payload: Bytes) {
        self.retry_data = Some(payload);
    }

    pub(crate) fn clear_retry_data(&mut self) {
        self.retry_data = None;
    }

    /// Acknowledge the triggering event to core-data, by id when it is
    /// known and by checksum otherwise.
    pub async fn mark_as_pushed(&self) -> Result<()> {
        debug!(correlation_id = %self.correlation_id, "marking event as pushed");

        let client = self.core_data.as_ref().ok_or_else(|| {
            EdgeflowError::config("core_data is missing from the clients configuration")
        })?;

        if !self.event_id.is_empty() {
            client.mark_pushed(&self.event_id, &self.correlation_id).await
        } else if !self.event_checksum.is_empty() {
            client
                .mark_pushed_by_checksum(&self.event_checksum, &self.correlation_id)
                .await
        } else {
            Err(EdgeflowError::Pipeline(
                "no event id or event checksum provided".to_string(),
            ))
        }
    }

    /// Build a single-reading event and publish it to core-data. The new
    /// event carries a fresh correlation id; the returned event has the
    /// id core-data assigned.
    pub async fn push_to_core_data(
        &self,
        device_name: &str,
        reading_name: &str,
        value: &Value,
    ) -> Result<Event> {
        debug!(correlation_id = %self.correlation_id, device = device_name, "pushing to core-data");

        let client = self.core_data.as_ref().ok_or_else(|| {
            EdgeflowError::config("core_data is missing from the clients configuration")
        })?;

        let bytes = value.coerce_bytes()?;
        let now = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0);
        let reading = Reading {
            id: String::new(),
            name: reading_name.to_string(),
            value: String::from_utf8_lossy(&bytes).into_owned(),
            origin: now,
            device: device_name.to_string(),
        };

        let mut event = Event {
            id: String::new(),
            device: device_name.to_string(),
            origin: now,
            readings: vec![reading],
        };

        let correlation = Uuid::new_v4().to_string();
        event.id = client.add_event(&event, &correlation).await?;
        Ok(event)
    }

    /// Retrieve secrets from the secret provider. Empty `keys` returns
    /// everything under `path`.
    pub async fn get_secrets(&self, path: &str, keys: &[&str]) -> Result<HashMap<String, String>> {
        let provider = self.secret_provider.as_ref().ok_or_else(|| {
            EdgeflowError::Secrets("secret provider is not initialized".to_string())
        })?;
        provider.get_secrets(path, keys).await
    }
}
