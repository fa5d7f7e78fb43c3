//! Built-in pipeline transforms
//!
//! Each transform implements [`PipelineFunction`] and is registered in
//! the default [`FunctionRegistry`] under a stable name so the
//! configurable pipeline can reference it by `execution_order` entry.

pub mod compression;
pub mod conversion;
pub mod coredata;
pub mod encryption;
pub mod filter;
pub mod http;

pub use compression::{CompressionAlgorithm, Compressor};
pub use conversion::{SetOutputData, TransformToJson};
pub use coredata::{MarkAsPushed, PushToCoreData};
pub use encryption::AesEncryptor;
pub use filter::{FilterByDeviceName, FilterByReadingName};
pub use http::HttpExporter;

use std::sync::Arc;

use crate::error::{EdgeflowError, Result};
use crate::function::{FunctionParams, FunctionRegistry, PipelineFunction};
use crate::util::split_and_trim;

/// Registry pre-populated with every built-in transform
pub fn default_registry() -> FunctionRegistry {
    let mut registry = FunctionRegistry::new();

    registry.register(
        "FilterByDeviceName",
        Box::new(|params| {
            let names = require_list(params, "FilterByDeviceName", "devicenames")?;
            Ok(Arc::new(FilterByDeviceName::new(names)) as Arc<dyn PipelineFunction>)
        }),
    );
    registry.register(
        "FilterByReadingName",
        Box::new(|params| {
            let names = require_list(params, "FilterByReadingName", "readingnames")?;
            Ok(Arc::new(FilterByReadingName::new(names)) as Arc<dyn PipelineFunction>)
        }),
    );
    registry.register(
        "TransformToJson",
        Box::new(|_params| Ok(Arc::new(TransformToJson) as Arc<dyn PipelineFunction>)),
    );
    registry.register(
        "SetOutputData",
        Box::new(|_params| Ok(Arc::new(SetOutputData) as Arc<dyn PipelineFunction>)),
    );
    registry.register(
        "CompressWithGzip",
        Box::new(|_params| {
            Ok(Arc::new(Compressor::new(CompressionAlgorithm::Gzip)) as Arc<dyn PipelineFunction>)
        }),
    );
    registry.register(
        "CompressWithZlib",
        Box::new(|_params| {
            Ok(Arc::new(Compressor::new(CompressionAlgorithm::Zlib)) as Arc<dyn PipelineFunction>)
        }),
    );
    registry.register(
        "EncryptWithAes",
        Box::new(|params| {
            let key = require(params, "EncryptWithAes", "key")?;
            Ok(Arc::new(AesEncryptor::new(key)) as Arc<dyn PipelineFunction>)
        }),
    );
    registry.register(
        "HttpExport",
        Box::new(|params| {
            let url = require(params, "HttpExport", "url")?;
            let mime_type = params.get("mimetype").cloned().unwrap_or_default();
            let persist_on_error = parse_bool(params, "HttpExport", "persistonerror")?;
            Ok(Arc::new(HttpExporter::new(url, mime_type, persist_on_error))
                as Arc<dyn PipelineFunction>)
        }),
    );
    registry.register(
        "MarkAsPushed",
        Box::new(|_params| Ok(Arc::new(MarkAsPushed) as Arc<dyn PipelineFunction>)),
    );
    registry.register(
        "PushToCoreData",
        Box::new(|params| {
            let device_name = require(params, "PushToCoreData", "devicename")?;
            let reading_name = require(params, "PushToCoreData", "readingname")?;
            Ok(Arc::new(PushToCoreData::new(device_name, reading_name))
                as Arc<dyn PipelineFunction>)
        }),
    );

    registry
}

fn require(params: &FunctionParams, function: &str, key: &str) -> Result<String> {
    params.get(key).cloned().ok_or_else(|| {
        EdgeflowError::FunctionConfig(function.to_string(), format!("missing parameter '{key}'"))
    })
}

fn require_list(params: &FunctionParams, function: &str, key: &str) -> Result<Vec<String>> {
    let names = split_and_trim(&require(params, function, key)?);
    if names.is_empty() {
        return Err(EdgeflowError::FunctionConfig(
            function.to_string(),
            format!("parameter '{key}' must list at least one name"),
        ));
    }
    Ok(names)
}

fn parse_bool(params: &FunctionParams, function: &str, key: &str) -> Result<bool> {
    match params.get(key) {
        None => Ok(false),
        Some(value) => value.parse().map_err(|_| {
            EdgeflowError::FunctionConfig(
                function.to_string(),
                format!("parameter '{key}' must be true or false, got '{value}'"),
            )
        }),
    }
}
