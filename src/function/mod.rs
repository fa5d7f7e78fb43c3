//! Pipeline function contract
//!
//! A pipeline is an ordered list of [`PipelineFunction`]s. Each function
//! receives the per-event [`Context`](crate::context::Context) and the
//! current [`Value`], and reports what the runtime should do next through
//! a [`FunctionOutcome`]. The runtime never inspects the value's tag; it
//! only threads the value from one function to the next.

mod registry;

pub use registry::{FunctionConstructor, FunctionParams, FunctionRegistry};

use async_trait::async_trait;
use bytes::Bytes;

use crate::context::Context;
use crate::error::{EdgeflowError, Result};
use crate::models::Event;

/// The value flowing through a pipeline
///
/// Opaque to the runtime. Cloning is cheap for the byte variant
/// (`Bytes` is reference counted) and structural for the rest.
#[derive(Debug, Clone)]
pub enum Value {
    /// Raw byte payload
    Bytes(Bytes),
    /// UTF-8 text
    Text(String),
    /// Decoded device event
    Event(Event),
    /// Arbitrary user payload as JSON
    Json(serde_json::Value),
}

impl Value {
    /// Convert any variant to bytes: byte payloads pass through, text is
    /// its UTF-8 encoding, events and JSON values are marshalled to JSON.
    pub fn coerce_bytes(&self) -> Result<Bytes> {
        match self {
            Value::Bytes(b) => Ok(b.clone()),
            Value::Text(s) => Ok(Bytes::from(s.clone().into_bytes())),
            Value::Event(e) => Ok(Bytes::from(serde_json::to_vec(e)?)),
            Value::Json(v) => Ok(Bytes::from(serde_json::to_vec(v)?)),
        }
    }

    /// Short tag name for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bytes(_) => "bytes",
            Value::Text(_) => "text",
            Value::Event(_) => "event",
            Value::Json(_) => "json",
        }
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(b))
    }
}

impl From<Event> for Value {
    fn from(e: Event) -> Self {
        Value::Event(e)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// What the runtime should do after a function returns
#[derive(Debug)]
pub enum FunctionOutcome {
    /// Continue with the produced value as the next function's input
    Next(Value),
    /// Continue with the current value unchanged; the error is logged as
    /// a warning
    NextWarn(EdgeflowError),
    /// Terminate the pipeline successfully
    Done,
    /// Terminate the pipeline successfully with a final value (early exit)
    DoneWith(Value),
    /// Terminate the pipeline with an error; if the context holds retry
    /// data and store-and-forward is enabled, the event is persisted
    Failed(EdgeflowError),
}

/// A single stage of a pipeline
///
/// `name` must be a stable identity: it feeds the pipeline fingerprint
/// that store-and-forward uses to detect pipeline changes across
/// restarts.
#[async_trait]
pub trait PipelineFunction: Send + Sync {
    /// Stable identity of this function within the pipeline
    fn name(&self) -> &str;

    /// Process one value
    async fn call(&self, ctx: &mut Context, input: Value) -> FunctionOutcome;
}

impl std::fmt::Debug for dyn PipelineFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineFunction").field("name", &self.name()).finish()
    }
}

/// Adapter turning a plain closure into a [`PipelineFunction`]
pub struct FnFunction<F> {
    name: String,
    inner: F,
}

impl<F> FnFunction<F>
where
    F: Fn(&mut Context, Value) -> FunctionOutcome + Send + Sync,
{
    /// Wrap `inner` under the given stable name.
    pub fn new(name: impl Into<String>, inner: F) -> Self {
        Self {
            name: name.into(),
            inner,
        }
    }
}

#[async_trait]
impl<F> PipelineFunction for FnFunction<F>
where
    F: Fn(&mut Context, Value) -> FunctionOutcome + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, ctx: &mut Context, input: Value) -> FunctionOutcome {
        (self.inner)(ctx, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_bytes_passthrough() {
        let value = Value::Bytes(Bytes::from_static(b"abc"));
        assert_eq!(value.coerce_bytes().unwrap().as_ref(), b"abc");

        let value = Value::Text("abc".to_string());
        assert_eq!(value.coerce_bytes().unwrap().as_ref(), b"abc");
    }

    #[test]
    fn test_coerce_bytes_marshals_json() {
        let value = Value::Json(serde_json::json!({"a": 1}));
        assert_eq!(value.coerce_bytes().unwrap().as_ref(), br#"{"a":1}"#);
    }

    #[test]
    fn test_value_kind() {
        assert_eq!(Value::Bytes(Bytes::new()).kind(), "bytes");
        assert_eq!(Value::Event(Event::default()).kind(), "event");
    }
}
