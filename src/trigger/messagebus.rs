//! Message-bus trigger
//!
//! An in-process publish/subscribe bus built on broadcast channels.
//! The trigger subscribes to the configured topic, runs each received
//! message through the pipeline, and publishes the output data to the
//! publish topic. Messages are fire-and-forget: only currently
//! subscribed consumers receive them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::Result;

use super::{Trigger, TriggerDependencies};

const CHANNEL_CAPACITY: usize = 1024;

/// One message on the bus
#[derive(Debug, Clone)]
pub struct BusMessage {
    /// Correlation id; generated when the publisher left it empty
    pub correlation_id: String,
    /// MIME type of the payload
    pub content_type: String,
    /// The payload bytes
    pub payload: Bytes,
}

/// In-process topic bus
#[derive(Default)]
pub struct MessageBus {
    channels: RwLock<HashMap<String, broadcast::Sender<BusMessage>>>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn channel(&self, topic: &str) -> broadcast::Sender<BusMessage> {
        if let Some(sender) = self.channels.read().get(topic) {
            return sender.clone();
        }
        self.channels
            .write()
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Publish to `topic`; returns how many subscribers received it.
    pub fn publish(&self, topic: &str, message: BusMessage) -> usize {
        self.channel(topic).send(message).unwrap_or(0)
    }

    /// Subscribe to `topic`.
    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<BusMessage> {
        self.channel(topic).subscribe()
    }
}

/// Trigger consuming events from the message bus
pub struct MessageBusTrigger {
    deps: Arc<TriggerDependencies>,
    bus: Arc<MessageBus>,
    subscribe_topic: String,
    publish_topic: String,
}

impl MessageBusTrigger {
    pub fn new(deps: Arc<TriggerDependencies>, bus: Arc<MessageBus>) -> Self {
        let (subscribe_topic, publish_topic) = {
            let config = deps.config.read();
            (
                config.binding.subscribe_topic.clone(),
                config.binding.publish_topic.clone(),
            )
        };
        Self {
            deps,
            bus,
            subscribe_topic,
            publish_topic,
        }
    }
}

#[async_trait]
impl Trigger for MessageBusTrigger {
    async fn initialize(&self, mut shutdown: watch::Receiver<bool>) -> Result<Option<JoinHandle<()>>> {
        let mut receiver = self.bus.subscribe(&self.subscribe_topic);
        let deps = self.deps.clone();
        let bus = self.bus.clone();
        let subscribe_topic = self.subscribe_topic.clone();
        let publish_topic = self.publish_topic.clone();

        info!(topic = %subscribe_topic, "message-bus trigger initialized");

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    received = receiver.recv() => match received {
                        Ok(message) => {
                            handle_message(&deps, &bus, &publish_topic, message).await;
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(topic = %subscribe_topic, skipped, "message-bus trigger lagged, messages dropped");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            warn!(topic = %subscribe_topic, "message-bus channel closed");
                            return;
                        }
                    },
                    _ = shutdown.changed() => {
                        info!("exiting message-bus trigger loop");
                        return;
                    }
                }
            }
        });

        Ok(Some(handle))
    }
}

async fn handle_message(
    deps: &TriggerDependencies,
    bus: &MessageBus,
    publish_topic: &str,
    message: BusMessage,
) {
    let correlation_id = if message.correlation_id.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        message.correlation_id.clone()
    };

    debug!(correlation_id = %correlation_id, "message received from bus");

    let content_type = if message.content_type.is_empty() {
        None
    } else {
        Some(message.content_type.as_str())
    };

    match deps
        .process(correlation_id.clone(), content_type, &message.payload)
        .await
    {
        Ok(Some(output)) => {
            let receivers = bus.publish(
                publish_topic,
                BusMessage {
                    correlation_id: correlation_id.clone(),
                    content_type: "application/json".to_string(),
                    payload: output,
                },
            );
            debug!(
                correlation_id = %correlation_id,
                topic = publish_topic,
                receivers,
                "pipeline output published"
            );
        }
        Ok(None) => {}
        Err(err) => {
            error!(correlation_id = %correlation_id, error = %err, "failed to process bus message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::function::{FnFunction, FunctionOutcome, PipelineFunction, Value};
    use crate::runtime::PipelineRuntime;
    use crate::trigger::TargetType;
    use std::time::Duration;

    #[tokio::test]
    async fn test_bus_publish_subscribe() {
        let bus = MessageBus::new();
        let mut receiver = bus.subscribe("events");

        let delivered = bus.publish(
            "events",
            BusMessage {
                correlation_id: "c1".to_string(),
                content_type: String::new(),
                payload: Bytes::from_static(b"hello"),
            },
        );
        assert_eq!(delivered, 1);

        let message = receiver.recv().await.unwrap();
        assert_eq!(message.payload.as_ref(), b"hello");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_dropped() {
        let bus = MessageBus::new();
        assert_eq!(
            bus.publish(
                "nobody-listening",
                BusMessage {
                    correlation_id: String::new(),
                    content_type: String::new(),
                    payload: Bytes::from_static(b"x"),
                },
            ),
            0
        );
    }

    #[tokio::test]
    async fn test_trigger_processes_and_publishes_output() {
        let runtime = Arc::new(PipelineRuntime::new("svc"));
        runtime.set_transforms(vec![Arc::new(FnFunction::new(
            "Echo",
            |ctx: &mut crate::context::Context, value: Value| {
                let bytes = value.coerce_bytes().expect("coercible");
                ctx.complete(bytes);
                FunctionOutcome::Done
            },
        )) as Arc<dyn PipelineFunction>]);

        let config = Arc::new(RwLock::new(ServiceConfig::default()));
        let deps = Arc::new(TriggerDependencies {
            runtime,
            config,
            core_data: None,
            secret_provider: None,
            target_type: TargetType::RawBytes,
        });

        let bus = Arc::new(MessageBus::new());
        let trigger = MessageBusTrigger::new(deps, bus.clone());
        let mut output_rx = bus.subscribe(&trigger.publish_topic);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = trigger.initialize(shutdown_rx).await.unwrap().unwrap();

        bus.publish(
            &trigger.subscribe_topic,
            BusMessage {
                correlation_id: "corr-bus".to_string(),
                content_type: String::new(),
                payload: Bytes::from_static(b"payload"),
            },
        );

        let output = tokio::time::timeout(Duration::from_secs(5), output_rx.recv())
            .await
            .expect("output must be published")
            .unwrap();
        assert_eq!(output.payload.as_ref(), b"payload");
        assert_eq!(output.correlation_id, "corr-bus");

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("trigger must exit on shutdown")
            .unwrap();
    }
}
