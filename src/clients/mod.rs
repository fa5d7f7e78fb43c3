//! Core-data HTTP client
//!
//! Minimal client for the upstream core-data service: publishing new
//! events and acknowledging processed ones. Every request carries the
//! originating correlation id so events stay traceable end to end.

use serde::Deserialize;

use crate::error::{EdgeflowError, Result};
use crate::models::Event;

/// Header carrying the correlation id across services
pub const CORRELATION_HEADER: &str = "X-Correlation-ID";

/// Client for the core-data service API
#[derive(Debug, Clone)]
pub struct CoreDataClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct VersionResponse {
    version: String,
}

impl CoreDataClient {
    /// Create a client for the service at `base_url` (scheme://host:port).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Publish a new event; returns the id core-data assigned.
    pub async fn add_event(&self, event: &Event, correlation_id: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/api/v1/event", self.base_url))
            .header(CORRELATION_HEADER, correlation_id)
            .json(event)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.text().await?)
    }

    /// Mark the event with `event_id` as pushed.
    pub async fn mark_pushed(&self, event_id: &str, correlation_id: &str) -> Result<()> {
        self.client
            .put(format!("{}/api/v1/event/id/{event_id}", self.base_url))
            .header(CORRELATION_HEADER, correlation_id)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Mark the CBOR-encoded event with `checksum` as pushed.
    pub async fn mark_pushed_by_checksum(
        &self,
        checksum: &str,
        correlation_id: &str,
    ) -> Result<()> {
        self.client
            .put(format!(
                "{}/api/v1/event/checksum/{checksum}",
                self.base_url
            ))
            .header(CORRELATION_HEADER, correlation_id)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Fetch the service's reported version string.
    pub async fn get_version(&self) -> Result<String> {
        let response: VersionResponse = self
            .client
            .get(format!("{}/api/v1/version", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.version.is_empty() {
            return Err(EdgeflowError::Server(
                "core-data version response missing 'version'".to_string(),
            ));
        }
        Ok(response.version)
    }
}
