//! edgeflow demo service
//!
//! Runs an event-pipeline service whose pipeline is defined entirely in
//! configuration (`[writable.pipeline]`). Useful as-is for simple
//! filter/transform/export deployments and as a template for services
//! that define their pipelines in code.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use edgeflow::{AppService, Result, ServiceArgs};

const SERVICE_KEY: &str = "edgeflow-app-<profile>";

#[tokio::main]
async fn main() -> ExitCode {
    let args = ServiceArgs::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    match run_service(args).await {
        Ok(()) => {
            info!("service exited cleanly");
            ExitCode::SUCCESS
        }
        Err(error) => {
            error!(error = %error, "service failed");
            ExitCode::FAILURE
        }
    }
}

async fn run_service(args: ServiceArgs) -> Result<()> {
    let mut service = AppService::new(SERVICE_KEY, args);
    service.initialize().await?;

    let pipeline = service.load_configurable_pipeline()?;
    service.set_functions_pipeline(pipeline)?;

    service.run().await
}
