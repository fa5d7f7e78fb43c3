#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

//! # edgeflow
//!
//! An event-pipeline framework for building stateless or stateful
//! event-processing microservices at the edge. A trigger (HTTP or
//! message bus) hands each incoming event to an ordered pipeline of
//! transformation functions; the final result is delivered back through
//! the trigger. When a delivery stage fails and opts in, the in-flight
//! item is persisted and replayed later from the exact pipeline position
//! where it failed, until it succeeds or its retry budget runs out.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use edgeflow::{AppService, FnFunction, FunctionOutcome, Result, ServiceArgs};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut service = AppService::new("my-app-service", ServiceArgs::default());
//!     service.initialize().await?;
//!
//!     service.set_functions_pipeline(vec![Arc::new(FnFunction::new(
//!         "Echo",
//!         |ctx: &mut edgeflow::Context, value: edgeflow::Value| {
//!             if let Ok(bytes) = value.coerce_bytes() {
//!                 ctx.complete(bytes);
//!             }
//!             FunctionOutcome::Done
//!         },
//!     ))])?;
//!
//!     service.run().await
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`runtime`]: pipeline dispatch and the store-and-forward engine
//! - [`trigger`]: HTTP and message-bus input adapters
//! - [`function`]: the pipeline function contract and named registry
//! - [`transforms`]: built-in transforms (filters, compression,
//!   encryption, HTTP export, core-data)
//! - [`store`]: durable storage for retry items
//! - [`context`]: the per-event processing context
//! - [`service`]: the lifecycle controller
//! - [`config`]: TOML configuration, CLI arguments, env overrides
//! - [`security`]: secret provider with caching
//! - [`webserver`]: standard service routes and the trigger endpoint
//! - [`telemetry`]: CPU/memory usage sampling
//! - [`error`]: error types and the crate-wide `Result` alias

pub mod clients;
pub mod config;
pub mod context;
pub mod error;
pub mod function;
pub mod models;
pub mod runtime;
pub mod security;
pub mod service;
pub mod store;
pub mod telemetry;
pub mod transforms;
pub mod trigger;
pub mod util;
pub mod webserver;

pub use config::{ServiceArgs, ServiceConfig, StoreAndForwardConfig, WritableConfig};
pub use context::Context;
pub use error::{EdgeflowError, Result};
pub use function::{
    FnFunction, FunctionOutcome, FunctionParams, FunctionRegistry, PipelineFunction, Value,
};
pub use models::{Event, Reading};
pub use runtime::{PipelineRuntime, StoreForward};
pub use security::{SecretClient, SecretProvider};
pub use service::AppService;
pub use store::{FileStore, MemoryStore, StoreClient, StoredItem};
pub use trigger::{MessageBus, TargetType};
