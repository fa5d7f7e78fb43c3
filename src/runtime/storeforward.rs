//! Store-and-forward retry engine
//!
//! One background worker per service: sleep for the configured retry
//! interval, then run one retry round over every stored item belonging
//! to this service. Each item is replayed from its saved pipeline
//! position; items whose fingerprint no longer matches the current
//! pipeline are discarded without invoking any function. All downstream
//! failures are absorbed and logged here — the loop survives transient
//! store outages and never propagates errors to the lifecycle
//! controller.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::RwLock;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::ServiceConfig;
use crate::context::Context;
use crate::error::{EdgeflowError, Result};
use crate::function::Value;
use crate::store::StoredItem;

use super::{PipelineExecution, PipelineRuntime};

/// Replays stored items through the remaining portion of the pipeline
pub struct StoreForward {
    runtime: Arc<PipelineRuntime>,
    config: Arc<RwLock<ServiceConfig>>,
    core_data: Option<Arc<crate::clients::CoreDataClient>>,
}

impl StoreForward {
    /// Create the engine over a runtime and the shared configuration.
    pub fn new(runtime: Arc<PipelineRuntime>, config: Arc<RwLock<ServiceConfig>>) -> Self {
        Self {
            runtime,
            config,
            core_data: None,
        }
    }

    /// Attach the core-data client used by replayed functions.
    pub fn with_core_data(mut self, client: Arc<crate::clients::CoreDataClient>) -> Self {
        self.core_data = Some(client);
        self
    }

    /// Start the background worker. Refuses to start until the runtime
    /// has been initialized with a store client. The worker exits
    /// promptly on the shutdown signal, finishing at most the round
    /// already in progress.
    pub fn start(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) -> Result<JoinHandle<()>> {
        if self.runtime.store_client().is_none() {
            return Err(EdgeflowError::store(
                "store-and-forward requires an initialized store client",
            ));
        }

        let engine = Arc::clone(self);
        info!("starting store-and-forward retry loop");

        Ok(tokio::spawn(async move {
            loop {
                let interval = {
                    let config = engine.config.read();
                    config.writable.store_and_forward.retry_interval_secs.max(1)
                };

                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(interval)) => {
                        engine.retry_once().await;
                    }
                    _ = shutdown.changed() => {
                        info!("exiting store-and-forward retry loop");
                        return;
                    }
                }
            }
        }))
    }

    /// Run one retry round: list this service's items, replay each, then
    /// apply the resulting removals and updates. Per-item store errors
    /// are logged and ignored; a failed list skips the whole round.
    pub async fn retry_once(&self) {
        let Some(store_client) = self.runtime.store_client() else {
            warn!("store-and-forward retry skipped: no store client bound");
            return;
        };

        let service_key = self.runtime.service_key().to_string();
        let items = match store_client.retrieve_from_store(&service_key).await {
            Ok(items) => items,
            Err(error) => {
                error!(error = %error, "failed to list stored items, skipping retry round");
                return;
            }
        };

        if items.is_empty() {
            debug!("no stored items to retry");
            return;
        }
        debug!(count = items.len(), "retrying stored items");

        let (to_remove, to_update) = self.process_retry_items(items).await;

        for item in &to_remove {
            if let Err(error) = store_client.remove_from_store(item).await {
                error!(
                    id = %item.id,
                    correlation_id = %item.correlation_id,
                    error = %error,
                    "failed to remove stored item"
                );
            }
        }
        for item in to_update {
            if let Err(error) = store_client.update(item.clone()).await {
                error!(
                    id = %item.id,
                    correlation_id = %item.correlation_id,
                    error = %error,
                    "failed to update stored item"
                );
            }
        }
    }

    /// Partition `items` into disjoint remove/update sets.
    ///
    /// The retry counter is incremented on the returned update entries
    /// only; it becomes observable when the caller's store update
    /// succeeds, so a storage failure does not consume retry budget.
    pub(crate) async fn process_retry_items(
        &self,
        items: Vec<StoredItem>,
    ) -> (Vec<StoredItem>, Vec<StoredItem>) {
        let snapshot = self.runtime.capture();
        let max_retry_count = {
            let config = self.config.read();
            config.writable.store_and_forward.max_retry_count.max(1) as u32
        };

        let mut to_remove = Vec::new();
        let mut to_update = Vec::new();

        for item in items {
            if item.version != snapshot.hash {
                info!(
                    id = %item.id,
                    correlation_id = %item.correlation_id,
                    "pipeline has changed since item was stored, removing"
                );
                to_remove.push(item);
                continue;
            }

            let mut ctx = self.replay_context(&item);
            let value = Value::Bytes(Bytes::from(item.payload.clone()));
            let execution = self
                .runtime
                .execute_pipeline(&mut ctx, value, &snapshot, item.pipeline_position)
                .await;

            match execution {
                PipelineExecution::Completed => {
                    debug!(
                        id = %item.id,
                        correlation_id = %item.correlation_id,
                        "replay succeeded, removing stored item"
                    );
                    to_remove.push(item);
                }
                PipelineExecution::Failed { index, error } => {
                    let attempted = item.retry_count + 1;
                    if attempted >= max_retry_count {
                        warn!(
                            id = %item.id,
                            correlation_id = %item.correlation_id,
                            retry_count = item.retry_count,
                            max_retry_count,
                            "max retries exceeded, removing stored item"
                        );
                        to_remove.push(item);
                    } else {
                        debug!(
                            id = %item.id,
                            correlation_id = %item.correlation_id,
                            error = %error,
                            "replay failed, will retry again"
                        );
                        let mut updated = item;
                        if let Some(payload) = ctx.retry_data.take() {
                            // partial progress: resume at the newly failed stage
                            updated.payload = payload.to_vec();
                            updated.pipeline_position = index;
                        }
                        updated.retry_count = attempted;
                        to_update.push(updated);
                    }
                }
            }
        }

        (to_remove, to_update)
    }

    fn replay_context(&self, item: &StoredItem) -> Context {
        let writable = self.config.read().writable.clone();
        let mut ctx = Context::new(item.correlation_id.clone(), writable)
            .with_event_id(item.event_id.clone())
            .with_event_checksum(item.event_checksum.clone());
        if let Some(client) = &self.core_data {
            ctx = ctx.with_core_data(client.clone());
        }
        if let Some(provider) = self.runtime.secret_provider() {
            ctx = ctx.with_secret_provider(provider);
        }
        ctx
    }
}
