//! HTTP export transform
//!
//! POSTs the current value to a configured endpoint. On any delivery
//! failure the exported bytes are deposited as retry data when
//! `persist_on_error` is set, so an enabled store-and-forward engine can
//! replay the export later from this exact stage.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::context::Context;
use crate::error::EdgeflowError;
use crate::function::{FunctionOutcome, PipelineFunction, Value};

const DEFAULT_MIME_TYPE: &str = "application/json";

/// Exports the value via HTTP POST
pub struct HttpExporter {
    url: String,
    mime_type: String,
    persist_on_error: bool,
    client: reqwest::Client,
}

impl HttpExporter {
    /// Create an exporter for `url`. An empty `mime_type` defaults to
    /// `application/json`.
    pub fn new(url: impl Into<String>, mime_type: impl Into<String>, persist_on_error: bool) -> Self {
        let mime_type = mime_type.into();
        Self {
            url: url.into(),
            mime_type: if mime_type.is_empty() {
                DEFAULT_MIME_TYPE.to_string()
            } else {
                mime_type
            },
            persist_on_error,
            client: reqwest::Client::new(),
        }
    }

    fn set_retry_data(&self, ctx: &mut Context, data: &Bytes) {
        if self.persist_on_error {
            ctx.set_retry_data(data.clone());
        }
    }
}

#[async_trait]
impl PipelineFunction for HttpExporter {
    fn name(&self) -> &str {
        "HttpExport"
    }

    async fn call(&self, ctx: &mut Context, input: Value) -> FunctionOutcome {
        let data = match input.coerce_bytes() {
            Ok(data) => data,
            Err(error) => return FunctionOutcome::Failed(error),
        };

        debug!(correlation_id = %ctx.correlation_id, url = %self.url, "posting data");

        let response = match self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, &self.mime_type)
            .body(data.clone())
            .send()
            .await
        {
            Ok(response) => response,
            Err(error) => {
                self.set_retry_data(ctx, &data);
                return FunctionOutcome::Failed(error.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            self.set_retry_data(ctx, &data);
            return FunctionOutcome::Failed(EdgeflowError::ExportStatus(status.as_u16()));
        }

        match response.bytes().await {
            Ok(body) => {
                debug!(
                    correlation_id = %ctx.correlation_id,
                    status = status.as_u16(),
                    "data exported"
                );
                FunctionOutcome::Next(Value::Bytes(body))
            }
            Err(error) => {
                self.set_retry_data(ctx, &data);
                FunctionOutcome::Failed(error.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WritableConfig;

    #[tokio::test]
    async fn test_unreachable_endpoint_sets_retry_data() {
        // port 9 (discard) on localhost is not listening
        let exporter = HttpExporter::new("http://127.0.0.1:9/export", "", true);
        let mut ctx = Context::new("corr", WritableConfig::default());

        let outcome = exporter
            .call(&mut ctx, Value::Text("payload".to_string()))
            .await;
        assert!(matches!(outcome, FunctionOutcome::Failed(_)));
        assert_eq!(ctx.retry_data.as_deref(), Some(b"payload".as_ref()));
    }

    #[tokio::test]
    async fn test_failure_without_persist_leaves_no_retry_data() {
        let exporter = HttpExporter::new("http://127.0.0.1:9/export", "", false);
        let mut ctx = Context::new("corr", WritableConfig::default());

        let outcome = exporter
            .call(&mut ctx, Value::Text("payload".to_string()))
            .await;
        assert!(matches!(outcome, FunctionOutcome::Failed(_)));
        assert!(ctx.retry_data.is_none());
    }

    #[test]
    fn test_empty_mime_type_defaults_to_json() {
        let exporter = HttpExporter::new("http://example", "", false);
        assert_eq!(exporter.mime_type, DEFAULT_MIME_TYPE);
        let exporter = HttpExporter::new("http://example", "text/xml", false);
        assert_eq!(exporter.mime_type, "text/xml");
    }
}
