//! Pipeline runtime
//!
//! Dispatches one event through the ordered function chain. The runtime
//! itself performs no I/O: it is a straight sequential caller that
//! threads each function's output into the next function's input,
//! honoring the short-circuit semantics of [`FunctionOutcome`]. When a
//! function fails after depositing retry data and store-and-forward is
//! enabled, the in-flight item is persisted at the failing offset for
//! the retry engine to replay.
//!
//! The pipeline is an atomically swappable snapshot: `process_event`
//! captures it once at entry and uses that capture for the whole call,
//! so a concurrent [`set_transforms`](PipelineRuntime::set_transforms)
//! never affects in-flight events.

mod storeforward;

pub use storeforward::StoreForward;

use std::sync::Arc;

use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use crate::context::Context;
use crate::error::{EdgeflowError, Result};
use crate::function::{FunctionOutcome, PipelineFunction, Value};
use crate::security::SecretProvider;
use crate::store::{StoreClient, StoredItem};

/// An immutable capture of the bound pipeline and its fingerprint
pub(crate) struct PipelineSnapshot {
    pub(crate) transforms: Vec<Arc<dyn PipelineFunction>>,
    pub(crate) hash: String,
}

/// Outcome of walking the pipeline from some offset
pub(crate) enum PipelineExecution {
    /// The pipeline ran to the end or a function terminated it successfully
    Completed,
    /// A function terminated the pipeline with an error at `index`
    Failed { index: usize, error: EdgeflowError },
}

/// Runs events through the function chain
pub struct PipelineRuntime {
    service_key: String,
    snapshot: RwLock<Arc<PipelineSnapshot>>,
    store_client: RwLock<Option<Arc<dyn StoreClient>>>,
    secret_provider: RwLock<Option<Arc<SecretProvider>>>,
}

impl PipelineRuntime {
    /// Create a runtime for the service identified by `service_key`.
    pub fn new(service_key: impl Into<String>) -> Self {
        Self {
            service_key: service_key.into(),
            snapshot: RwLock::new(Arc::new(PipelineSnapshot {
                transforms: Vec::new(),
                hash: calculate_pipeline_hash(&[]),
            })),
            store_client: RwLock::new(None),
            secret_provider: RwLock::new(None),
        }
    }

    /// Bind the store client and secret provider. Idempotent; the retry
    /// engine refuses to start until a store client is bound.
    pub fn initialize(
        &self,
        store_client: Option<Arc<dyn StoreClient>>,
        secret_provider: Option<Arc<SecretProvider>>,
    ) {
        if let Some(store_client) = store_client {
            *self.store_client.write() = Some(store_client);
        }
        if let Some(secret_provider) = secret_provider {
            *self.secret_provider.write() = Some(secret_provider);
        }
    }

    /// Atomically replace the pipeline and recompute its fingerprint.
    /// In-flight `process_event` calls keep the snapshot they captured.
    pub fn set_transforms(&self, transforms: Vec<Arc<dyn PipelineFunction>>) {
        let hash = calculate_pipeline_hash(&transforms);
        debug!(functions = transforms.len(), hash = %hash, "pipeline replaced");
        *self.snapshot.write() = Arc::new(PipelineSnapshot { transforms, hash });
    }

    /// Fingerprint of the currently bound pipeline.
    pub fn pipeline_hash(&self) -> String {
        self.snapshot.read().hash.clone()
    }

    /// Number of functions in the currently bound pipeline.
    pub fn transform_count(&self) -> usize {
        self.snapshot.read().transforms.len()
    }

    /// The service key this runtime writes stored items under.
    pub fn service_key(&self) -> &str {
        &self.service_key
    }

    pub(crate) fn capture(&self) -> Arc<PipelineSnapshot> {
        self.snapshot.read().clone()
    }

    pub(crate) fn store_client(&self) -> Option<Arc<dyn StoreClient>> {
        self.store_client.read().clone()
    }

    pub(crate) fn secret_provider(&self) -> Option<Arc<SecretProvider>> {
        self.secret_provider.read().clone()
    }

    /// Run one event through the pipeline from offset 0.
    ///
    /// On a function failure the error is returned to the trigger; if the
    /// failing function deposited retry data and store-and-forward is
    /// enabled in the context's writable snapshot, the item is persisted
    /// first.
    pub async fn process_event(&self, ctx: &mut Context, value: Value) -> Result<()> {
        let snapshot = self.capture();
        if snapshot.transforms.is_empty() {
            return Err(EdgeflowError::pipeline("no transforms configured"));
        }

        debug!(
            correlation_id = %ctx.correlation_id,
            kind = value.kind(),
            "processing event"
        );

        match self.execute_pipeline(ctx, value, &snapshot, 0).await {
            PipelineExecution::Completed => Ok(()),
            PipelineExecution::Failed { index, error } => {
                if ctx.retry_data.is_some() && ctx.writable.store_and_forward.enabled {
                    self.store_for_retry(ctx, index, &snapshot).await;
                }
                Err(error)
            }
        }
    }

    /// Walk the captured pipeline starting at `start`, clearing the retry
    /// buffer before each call so only the most recent function's retry
    /// intent is honored.
    pub(crate) async fn execute_pipeline(
        &self,
        ctx: &mut Context,
        value: Value,
        snapshot: &PipelineSnapshot,
        start: usize,
    ) -> PipelineExecution {
        let mut current = value;

        for (index, function) in snapshot.transforms.iter().enumerate().skip(start) {
            ctx.clear_retry_data();

            match function.call(ctx, current.clone()).await {
                FunctionOutcome::Next(value) => current = value,
                FunctionOutcome::NextWarn(error) => {
                    warn!(
                        correlation_id = %ctx.correlation_id,
                        function = function.name(),
                        error = %error,
                        "pipeline function returned an error, continuing"
                    );
                }
                FunctionOutcome::Done | FunctionOutcome::DoneWith(_) => {
                    debug!(
                        correlation_id = %ctx.correlation_id,
                        function = function.name(),
                        "pipeline terminated by function"
                    );
                    return PipelineExecution::Completed;
                }
                FunctionOutcome::Failed(error) => {
                    warn!(
                        correlation_id = %ctx.correlation_id,
                        function = function.name(),
                        index,
                        error = %error,
                        "pipeline function failed"
                    );
                    return PipelineExecution::Failed { index, error };
                }
            }
        }

        PipelineExecution::Completed
    }

    async fn store_for_retry(&self, ctx: &mut Context, index: usize, snapshot: &PipelineSnapshot) {
        let Some(store_client) = self.store_client() else {
            error!(
                correlation_id = %ctx.correlation_id,
                "store-and-forward is enabled but no store client is bound; event not persisted"
            );
            return;
        };
        let Some(payload) = ctx.retry_data.take() else {
            return;
        };

        let mut item = StoredItem::new(
            self.service_key.clone(),
            payload.to_vec(),
            index,
            snapshot.hash.clone(),
        );
        item.correlation_id = ctx.correlation_id.clone();
        item.event_id = ctx.event_id.clone();
        item.event_checksum = ctx.event_checksum.clone();

        match store_client.store(item).await {
            Ok(id) => info!(
                correlation_id = %ctx.correlation_id,
                id = %id,
                pipeline_position = index,
                "event stored for retry"
            ),
            Err(error) => error!(
                correlation_id = %ctx.correlation_id,
                error = %error,
                "failed to store event for retry"
            ),
        }
    }
}

/// Fingerprint the ordered function list: length-prefixed names fed to
/// Sha256, hex encoded. Identical lists hash identically; any change of
/// order, length, or element identity changes the digest.
fn calculate_pipeline_hash(transforms: &[Arc<dyn PipelineFunction>]) -> String {
    let mut hasher = Sha256::new();
    for function in transforms {
        let name = function.name();
        hasher.update((name.len() as u64).to_le_bytes());
        hasher.update(name.as_bytes());
    }
    hex::encode(hasher.finalize())
}
