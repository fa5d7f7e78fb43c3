//! Event filters
//!
//! A filtered-out event terminates the pipeline successfully without
//! output; nothing downstream runs and nothing is persisted.

use async_trait::async_trait;
use tracing::debug;

use crate::context::Context;
use crate::error::EdgeflowError;
use crate::function::{FunctionOutcome, PipelineFunction, Value};

/// Passes only events whose device is in the allow list
pub struct FilterByDeviceName {
    device_names: Vec<String>,
}

impl FilterByDeviceName {
    pub fn new(device_names: Vec<String>) -> Self {
        Self { device_names }
    }
}

#[async_trait]
impl PipelineFunction for FilterByDeviceName {
    fn name(&self) -> &str {
        "FilterByDeviceName"
    }

    async fn call(&self, ctx: &mut Context, input: Value) -> FunctionOutcome {
        let Value::Event(event) = input else {
            return FunctionOutcome::Failed(EdgeflowError::pipeline(
                "FilterByDeviceName expects an event",
            ));
        };

        if self.device_names.iter().any(|name| *name == event.device) {
            FunctionOutcome::Next(Value::Event(event))
        } else {
            debug!(
                correlation_id = %ctx.correlation_id,
                device = %event.device,
                "event filtered out by device name"
            );
            FunctionOutcome::Done
        }
    }
}

/// Keeps only readings whose name is in the allow list; drops the event
/// entirely when no reading survives
pub struct FilterByReadingName {
    reading_names: Vec<String>,
}

impl FilterByReadingName {
    pub fn new(reading_names: Vec<String>) -> Self {
        Self { reading_names }
    }
}

#[async_trait]
impl PipelineFunction for FilterByReadingName {
    fn name(&self) -> &str {
        "FilterByReadingName"
    }

    async fn call(&self, ctx: &mut Context, input: Value) -> FunctionOutcome {
        let Value::Event(mut event) = input else {
            return FunctionOutcome::Failed(EdgeflowError::pipeline(
                "FilterByReadingName expects an event",
            ));
        };

        event
            .readings
            .retain(|reading| self.reading_names.iter().any(|name| *name == reading.name));

        if event.readings.is_empty() {
            debug!(
                correlation_id = %ctx.correlation_id,
                device = %event.device,
                "no readings remain after filtering"
            );
            FunctionOutcome::Done
        } else {
            FunctionOutcome::Next(Value::Event(event))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WritableConfig;
    use crate::models::{Event, Reading};

    fn event_with_readings(device: &str, readings: &[&str]) -> Event {
        Event {
            id: String::new(),
            device: device.to_string(),
            origin: 1,
            readings: readings
                .iter()
                .map(|name| Reading {
                    id: String::new(),
                    name: name.to_string(),
                    value: "1".to_string(),
                    origin: 1,
                    device: device.to_string(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_device_filter_passes_listed_device() {
        let filter = FilterByDeviceName::new(vec!["sensor-1".to_string()]);
        let mut ctx = Context::new("corr", WritableConfig::default());

        let outcome = filter
            .call(
                &mut ctx,
                Value::Event(event_with_readings("sensor-1", &["temp"])),
            )
            .await;
        assert!(matches!(outcome, FunctionOutcome::Next(Value::Event(_))));
    }

    #[tokio::test]
    async fn test_device_filter_drops_unlisted_device() {
        let filter = FilterByDeviceName::new(vec!["sensor-1".to_string()]);
        let mut ctx = Context::new("corr", WritableConfig::default());

        let outcome = filter
            .call(
                &mut ctx,
                Value::Event(event_with_readings("other", &["temp"])),
            )
            .await;
        assert!(matches!(outcome, FunctionOutcome::Done));
    }

    #[tokio::test]
    async fn test_reading_filter_retains_matching() {
        let filter = FilterByReadingName::new(vec!["temp".to_string()]);
        let mut ctx = Context::new("corr", WritableConfig::default());

        let outcome = filter
            .call(
                &mut ctx,
                Value::Event(event_with_readings("d", &["temp", "humidity"])),
            )
            .await;
        match outcome {
            FunctionOutcome::Next(Value::Event(event)) => {
                assert_eq!(event.readings.len(), 1);
                assert_eq!(event.readings[0].name, "temp");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reading_filter_drops_empty_event() {
        let filter = FilterByReadingName::new(vec!["pressure".to_string()]);
        let mut ctx = Context::new("corr", WritableConfig::default());

        let outcome = filter
            .call(
                &mut ctx,
                Value::Event(event_with_readings("d", &["temp", "humidity"])),
            )
            .await;
        assert!(matches!(outcome, FunctionOutcome::Done));
    }

    #[tokio::test]
    async fn test_filter_rejects_non_event() {
        let filter = FilterByDeviceName::new(vec!["sensor-1".to_string()]);
        let mut ctx = Context::new("corr", WritableConfig::default());
        let outcome = filter
            .call(&mut ctx, Value::Text("not an event".to_string()))
            .await;
        assert!(matches!(outcome, FunctionOutcome::Failed(_)));
    }
}
