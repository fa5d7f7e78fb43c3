//! Trigger adapters
//!
//! A trigger accepts raw payloads from the outside world, decodes them
//! into the configured target type, and hands them to the pipeline
//! runtime with correlation metadata. Decode failures are reported to
//! the trigger's caller and never reach the core.

pub mod http;
pub mod messagebus;

pub use http::HttpTrigger;
pub use messagebus::{BusMessage, MessageBus, MessageBusTrigger};

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::clients::CoreDataClient;
use crate::config::ServiceConfig;
use crate::context::Context;
use crate::error::{EdgeflowError, Result};
use crate::function::Value;
use crate::models::Event;
use crate::runtime::PipelineRuntime;
use crate::security::SecretProvider;

/// How incoming payload bytes are decoded before entering the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetType {
    /// Decode into an [`Event`], auto-detecting JSON or CBOR
    #[default]
    Event,
    /// Hand the raw bytes to the first function unchanged
    RawBytes,
    /// Decode into an arbitrary JSON value
    Json,
}

/// Correlation markers extracted while decoding
#[derive(Debug, Clone, Default)]
pub struct EventMeta {
    /// Event id, populated for JSON events
    pub event_id: String,
    /// Payload checksum, populated for CBOR events
    pub event_checksum: String,
}

/// Everything a trigger needs to run one payload through the pipeline
pub struct TriggerDependencies {
    pub runtime: Arc<PipelineRuntime>,
    pub config: Arc<RwLock<ServiceConfig>>,
    pub core_data: Option<Arc<CoreDataClient>>,
    pub secret_provider: Option<Arc<SecretProvider>>,
    pub target_type: TargetType,
}

impl TriggerDependencies {
    /// Decode `body`, build the per-event context, and run the pipeline.
    /// Returns the output data the final function set, if any.
    pub async fn process(
        &self,
        correlation_id: String,
        content_type: Option<&str>,
        body: &Bytes,
    ) -> Result<Option<Bytes>> {
        let (value, meta) = decode_payload(self.target_type, content_type, body)?;

        let writable = self.config.read().writable.clone();
        let mut ctx = Context::new(correlation_id, writable)
            .with_event_id(meta.event_id)
            .with_event_checksum(meta.event_checksum);
        if let Some(client) = &self.core_data {
            ctx = ctx.with_core_data(client.clone());
        }
        if let Some(provider) = &self.secret_provider {
            ctx = ctx.with_secret_provider(provider.clone());
        }

        self.runtime.process_event(&mut ctx, value).await?;
        Ok(ctx.output_data.take())
    }
}

/// An input adapter feeding the pipeline runtime
#[async_trait]
pub trait Trigger: Send + Sync {
    /// Start receiving events. Returns the consumer worker handle when
    /// the trigger runs one, so the lifecycle controller can join it on
    /// shutdown.
    async fn initialize(&self, shutdown: watch::Receiver<bool>) -> Result<Option<JoinHandle<()>>>;
}

/// Decode raw payload bytes into the configured target type.
pub fn decode_payload(
    target_type: TargetType,
    content_type: Option<&str>,
    body: &Bytes,
) -> Result<(Value, EventMeta)> {
    if body.is_empty() {
        return Err(EdgeflowError::Decode("empty payload".to_string()));
    }

    match target_type {
        TargetType::RawBytes => Ok((Value::Bytes(body.clone()), EventMeta::default())),
        TargetType::Json => {
            let json: serde_json::Value = serde_json::from_slice(body)
                .map_err(|e| EdgeflowError::Decode(format!("invalid JSON payload: {e}")))?;
            Ok((Value::Json(json), EventMeta::default()))
        }
        TargetType::Event => decode_event(content_type, body),
    }
}

/// JSON carries the event id; CBOR is identified upstream by a checksum
/// of the raw payload instead, since CBOR events arrive without an id.
fn decode_event(content_type: Option<&str>, body: &Bytes) -> Result<(Value, EventMeta)> {
    let declared_cbor = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("cbor"))
        .unwrap_or(false);

    if !declared_cbor {
        if let Ok(event) = serde_json::from_slice::<Event>(body) {
            let meta = EventMeta {
                event_id: event.id.clone(),
                event_checksum: String::new(),
            };
            return Ok((Value::Event(event), meta));
        }
    }

    let event = Event::from_cbor(body)
        .map_err(|e| EdgeflowError::Decode(format!("payload is neither JSON nor CBOR: {e}")))?;
    let meta = EventMeta {
        event_id: String::new(),
        event_checksum: hex::encode(Sha256::digest(body)),
    };
    Ok((Value::Event(event), meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Reading;

    fn sample_event() -> Event {
        Event {
            id: "evt-1".to_string(),
            device: "d1".to_string(),
            origin: 7,
            readings: vec![Reading {
                id: String::new(),
                name: "temp".to_string(),
                value: "20".to_string(),
                origin: 7,
                device: "d1".to_string(),
            }],
        }
    }

    #[test]
    fn test_decode_json_event_captures_id() {
        let body = Bytes::from(serde_json::to_vec(&sample_event()).unwrap());
        let (value, meta) = decode_payload(TargetType::Event, Some("application/json"), &body).unwrap();

        assert!(matches!(value, Value::Event(_)));
        assert_eq!(meta.event_id, "evt-1");
        assert!(meta.event_checksum.is_empty());
    }

    #[test]
    fn test_decode_cbor_event_captures_checksum() {
        let body = Bytes::from(sample_event().to_cbor().unwrap());
        let (value, meta) = decode_payload(TargetType::Event, Some("application/cbor"), &body).unwrap();

        match value {
            Value::Event(event) => assert_eq!(event.device, "d1"),
            other => panic!("unexpected value: {}", other.kind()),
        }
        assert!(meta.event_id.is_empty());
        assert_eq!(meta.event_checksum, hex::encode(Sha256::digest(&body)));
    }

    #[test]
    fn test_decode_auto_detects_cbor_without_content_type() {
        let body = Bytes::from(sample_event().to_cbor().unwrap());
        let (value, meta) = decode_payload(TargetType::Event, None, &body).unwrap();
        assert!(matches!(value, Value::Event(_)));
        assert!(!meta.event_checksum.is_empty());
    }

    #[test]
    fn test_decode_raw_bytes_passthrough() {
        let body = Bytes::from_static(b"\x00\x01\x02");
        let (value, meta) = decode_payload(TargetType::RawBytes, None, &body).unwrap();
        match value {
            Value::Bytes(bytes) => assert_eq!(bytes.as_ref(), b"\x00\x01\x02"),
            other => panic!("unexpected value: {}", other.kind()),
        }
        assert!(meta.event_id.is_empty());
    }

    #[test]
    fn test_decode_garbage_fails() {
        let body = Bytes::from_static(b"\xff\xfe not a payload");
        assert!(decode_payload(TargetType::Event, None, &body).is_err());
        assert!(decode_payload(TargetType::Json, None, &body).is_err());
    }

    #[test]
    fn test_decode_empty_fails() {
        assert!(decode_payload(TargetType::Event, None, &Bytes::new()).is_err());
    }
}
