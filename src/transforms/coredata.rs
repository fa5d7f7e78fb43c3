//! Core-data transforms
//!
//! Acknowledge the triggering event upstream, or publish a new event
//! built from the current value.

use async_trait::async_trait;

use crate::context::Context;
use crate::function::{FunctionOutcome, PipelineFunction, Value};

/// Marks the triggering event as pushed in core-data
///
/// An acknowledgment failure does not stop the pipeline; it is logged as
/// a warning and the current value continues downstream.
pub struct MarkAsPushed;

#[async_trait]
impl PipelineFunction for MarkAsPushed {
    fn name(&self) -> &str {
        "MarkAsPushed"
    }

    async fn call(&self, ctx: &mut Context, input: Value) -> FunctionOutcome {
        match ctx.mark_as_pushed().await {
            Ok(()) => FunctionOutcome::Next(input),
            Err(error) => FunctionOutcome::NextWarn(error),
        }
    }
}

/// Publishes the current value to core-data as a new single-reading event
pub struct PushToCoreData {
    device_name: String,
    reading_name: String,
}

impl PushToCoreData {
    pub fn new(device_name: impl Into<String>, reading_name: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
            reading_name: reading_name.into(),
        }
    }
}

#[async_trait]
impl PipelineFunction for PushToCoreData {
    fn name(&self) -> &str {
        "PushToCoreData"
    }

    async fn call(&self, ctx: &mut Context, input: Value) -> FunctionOutcome {
        match ctx
            .push_to_core_data(&self.device_name, &self.reading_name, &input)
            .await
        {
            Ok(event) => FunctionOutcome::Next(Value::Event(event)),
            Err(error) => FunctionOutcome::Failed(error),
        }
    }
}
