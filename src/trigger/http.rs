//! HTTP trigger
//!
//! Events arrive as `POST /api/v1/trigger` bodies on the web server; the
//! pipeline's output data is returned as the response body. The route
//! handler itself lives in the web server, which is handed this
//! trigger's dependencies when the lifecycle controller selects the HTTP
//! binding.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::Result;

use super::{Trigger, TriggerDependencies};

/// Trigger fed by the web server's trigger route
pub struct HttpTrigger {
    deps: Arc<TriggerDependencies>,
}

impl HttpTrigger {
    pub fn new(deps: Arc<TriggerDependencies>) -> Self {
        Self { deps }
    }

    /// Dependencies for the web server's route handler.
    pub fn dependencies(&self) -> Arc<TriggerDependencies> {
        self.deps.clone()
    }
}

#[async_trait]
impl Trigger for HttpTrigger {
    async fn initialize(&self, _shutdown: watch::Receiver<bool>) -> Result<Option<JoinHandle<()>>> {
        // the web server owns the listener; nothing to start here
        info!("HTTP trigger initialized");
        Ok(None)
    }
}
