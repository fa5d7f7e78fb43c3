//! Conversion and output transforms

use async_trait::async_trait;
use bytes::Bytes;

use crate::context::Context;
use crate::error::EdgeflowError;
use crate::function::{FunctionOutcome, PipelineFunction, Value};

/// Serializes the event to JSON bytes for downstream text sinks
pub struct TransformToJson;

#[async_trait]
impl PipelineFunction for TransformToJson {
    fn name(&self) -> &str {
        "TransformToJson"
    }

    async fn call(&self, _ctx: &mut Context, input: Value) -> FunctionOutcome {
        let result = match &input {
            Value::Event(event) => serde_json::to_vec(event),
            Value::Json(json) => serde_json::to_vec(json),
            other => {
                return FunctionOutcome::Failed(EdgeflowError::pipeline(format!(
                    "TransformToJson expects an event or JSON value, got {}",
                    other.kind()
                )))
            }
        };

        match result {
            Ok(bytes) => FunctionOutcome::Next(Value::Bytes(Bytes::from(bytes))),
            Err(error) => FunctionOutcome::Failed(error.into()),
        }
    }
}

/// Copies the current value into the context's output buffer
///
/// Typically the last stage of a pipeline whose result the trigger must
/// deliver (HTTP response body or message-bus publish).
pub struct SetOutputData;

#[async_trait]
impl PipelineFunction for SetOutputData {
    fn name(&self) -> &str {
        "SetOutputData"
    }

    async fn call(&self, ctx: &mut Context, input: Value) -> FunctionOutcome {
        match input.coerce_bytes() {
            Ok(bytes) => {
                ctx.complete(bytes);
                FunctionOutcome::Next(input)
            }
            Err(error) => FunctionOutcome::Failed(error),
        }
    }
}
