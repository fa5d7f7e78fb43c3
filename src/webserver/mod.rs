//! Web server
//!
//! Serves the standard service routes — ping, config, metrics, version —
//! plus the trigger route when the HTTP binding is selected. Hosts may
//! add their own routes as long as they do not shadow the reserved
//! paths.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, MethodRouter};
use axum::{Json, Router};
use parking_lot::RwLock;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clients::CORRELATION_HEADER;
use crate::config::ServiceConfig;
use crate::error::{EdgeflowError, Result};
use crate::telemetry::TelemetrySampler;
use crate::trigger::TriggerDependencies;

/// Health-check route
pub const API_PING_ROUTE: &str = "/api/v1/ping";
/// Current-configuration route
pub const API_CONFIG_ROUTE: &str = "/api/v1/config";
/// Telemetry route
pub const API_METRICS_ROUTE: &str = "/api/v1/metrics";
/// Version route
pub const API_VERSION_ROUTE: &str = "/api/v1/version";
/// Trigger route (HTTP binding only)
pub const API_TRIGGER_ROUTE: &str = "/api/v1/trigger";

const RESERVED_ROUTES: &[&str] = &[
    API_PING_ROUTE,
    API_CONFIG_ROUTE,
    API_METRICS_ROUTE,
    API_VERSION_ROUTE,
    API_TRIGGER_ROUTE,
];

/// Shared state for all route handlers
#[derive(Clone)]
pub struct WebServerState {
    pub config: Arc<RwLock<ServiceConfig>>,
    pub telemetry: Arc<TelemetrySampler>,
    /// Present when the HTTP trigger binding is selected
    pub trigger: Option<Arc<TriggerDependencies>>,
}

/// The service's HTTP surface
pub struct WebServer {
    state: WebServerState,
    extra_routes: Vec<(String, MethodRouter<WebServerState>)>,
}

impl WebServer {
    pub fn new(config: Arc<RwLock<ServiceConfig>>, telemetry: Arc<TelemetrySampler>) -> Self {
        Self {
            state: WebServerState {
                config,
                telemetry,
                trigger: None,
            },
            extra_routes: Vec::new(),
        }
    }

    /// Wire the HTTP trigger's dependencies into the trigger route.
    pub fn set_trigger(&mut self, trigger: Arc<TriggerDependencies>) {
        self.state.trigger = Some(trigger);
    }

    /// Add a host-supplied route. Reserved paths are rejected.
    pub fn add_route(
        &mut self,
        path: impl Into<String>,
        handler: MethodRouter<WebServerState>,
    ) -> Result<()> {
        let path = path.into();
        if RESERVED_ROUTES.contains(&path.as_str()) {
            return Err(EdgeflowError::RouteReserved(path));
        }
        self.extra_routes.push((path, handler));
        Ok(())
    }

    /// Build the full router with standard and host routes.
    pub fn build_router(&self) -> Router {
        let mut router = Router::new()
            .route(API_PING_ROUTE, get(ping_handler))
            .route(API_CONFIG_ROUTE, get(config_handler))
            .route(API_METRICS_ROUTE, get(metrics_handler))
            .route(API_VERSION_ROUTE, get(version_handler))
            .route(API_TRIGGER_ROUTE, post(trigger_handler));

        for (path, handler) in &self.extra_routes {
            router = router.route(path, handler.clone());
        }

        router.with_state(self.state.clone())
    }

    /// Bind the configured address and serve until the shutdown signal.
    pub async fn serve(self, shutdown: watch::Receiver<bool>) -> Result<()> {
        let addr = {
            let config = self.state.config.read();
            format!("{}:{}", config.service.host, config.service.port)
        };
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| EdgeflowError::Server(format!("failed to bind {addr}: {e}")))?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already-bound listener (used by tests).
    pub async fn serve_on(
        self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        if let Ok(addr) = listener.local_addr() {
            info!(addr = %addr, "web server listening");
        }

        let router = self.build_router();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.changed().await;
                info!("web server shutting down");
            })
            .await
            .map_err(|e| EdgeflowError::Server(format!("web server error: {e}")))
    }
}

async fn ping_handler() -> &'static str {
    "pong"
}

async fn config_handler(State(state): State<WebServerState>) -> Json<ServiceConfig> {
    Json(state.config.read().clone())
}

async fn metrics_handler(State(state): State<WebServerState>) -> impl IntoResponse {
    Json(state.telemetry.snapshot())
}

async fn version_handler() -> impl IntoResponse {
    Json(json!({ "version": env!("CARGO_PKG_VERSION") }))
}

async fn trigger_handler(
    State(state): State<WebServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let Some(trigger) = state.trigger else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "trigger is not available: service is not using the HTTP binding".to_string(),
        )
            .into_response();
    };

    let correlation_id = headers
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let content_type = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    debug!(correlation_id = %correlation_id, bytes = body.len(), "trigger request received");

    match trigger
        .process(correlation_id.clone(), content_type.as_deref(), &body)
        .await
    {
        Ok(Some(output)) => output.into_response(),
        Ok(None) => StatusCode::OK.into_response(),
        Err(EdgeflowError::Decode(message)) => {
            warn!(correlation_id = %correlation_id, error = %message, "trigger payload rejected");
            (StatusCode::BAD_REQUEST, message).into_response()
        }
        Err(error) => {
            warn!(correlation_id = %correlation_id, error = %error, "pipeline processing failed");
            (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::function::{FnFunction, FunctionOutcome, PipelineFunction, Value};
    use crate::runtime::PipelineRuntime;
    use crate::trigger::TargetType;

    fn test_server(trigger: Option<Arc<TriggerDependencies>>) -> WebServer {
        let config = Arc::new(RwLock::new(ServiceConfig::default()));
        let telemetry = Arc::new(TelemetrySampler::new(60));
        let mut server = WebServer::new(config, telemetry);
        if let Some(trigger) = trigger {
            server.set_trigger(trigger);
        }
        server
    }

    fn echo_trigger() -> Arc<TriggerDependencies> {
        let runtime = Arc::new(PipelineRuntime::new("svc"));
        runtime.set_transforms(vec![Arc::new(FnFunction::new(
            "Echo",
            |ctx: &mut Context, value: Value| {
                ctx.complete(value.coerce_bytes().expect("coercible"));
                FunctionOutcome::Done
            },
        )) as Arc<dyn PipelineFunction>]);

        Arc::new(TriggerDependencies {
            runtime,
            config: Arc::new(RwLock::new(ServiceConfig::default())),
            core_data: None,
            secret_provider: None,
            target_type: TargetType::RawBytes,
        })
    }

    async fn spawn_server(server: WebServer) -> (String, watch::Sender<bool>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = watch::channel(false);
        tokio::spawn(async move {
            server.serve_on(listener, rx).await.unwrap();
        });
        (format!("http://{addr}"), tx)
    }

    #[test]
    fn test_reserved_routes_rejected() {
        let mut server = test_server(None);
        for route in RESERVED_ROUTES {
            assert!(server.add_route(*route, get(ping_handler)).is_err());
        }
        assert!(server.add_route("/custom", get(ping_handler)).is_ok());
    }

    #[tokio::test]
    async fn test_standard_routes() {
        let (base, _shutdown) = spawn_server(test_server(None)).await;
        let client = reqwest::Client::new();

        let ping = client.get(format!("{base}{API_PING_ROUTE}")).send().await.unwrap();
        assert_eq!(ping.text().await.unwrap(), "pong");

        let version: serde_json::Value = client
            .get(format!("{base}{API_VERSION_ROUTE}"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(version["version"], env!("CARGO_PKG_VERSION"));

        let config: serde_json::Value = client
            .get(format!("{base}{API_CONFIG_ROUTE}"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(config["service"]["port"], 48095);

        let metrics: serde_json::Value = client
            .get(format!("{base}{API_METRICS_ROUTE}"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(metrics.get("cpu_busy_avg").is_some());
    }

    #[tokio::test]
    async fn test_trigger_route_round_trip() {
        let (base, _shutdown) = spawn_server(test_server(Some(echo_trigger()))).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{base}{API_TRIGGER_ROUTE}"))
            .header(CORRELATION_HEADER, "corr-http")
            .body("raw payload")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "raw payload");
    }

    #[tokio::test]
    async fn test_trigger_route_without_binding() {
        let (base, _shutdown) = spawn_server(test_server(None)).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{base}{API_TRIGGER_ROUTE}"))
            .body("payload")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_trigger_route_rejects_empty_body() {
        let (base, _shutdown) = spawn_server(test_server(Some(echo_trigger()))).await;
        let client = reqwest::Client::new();

        // RawBytes target still rejects an empty payload at decode time
        let response = client
            .post(format!("{base}{API_TRIGGER_ROUTE}"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    }
}
