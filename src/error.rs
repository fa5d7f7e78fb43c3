//! Error types for edgeflow
//!
//! This module defines the main error type used throughout the framework
//! and the crate-wide [`Result`] alias.

use thiserror::Error;

/// Result type alias for edgeflow operations
pub type Result<T> = std::result::Result<T, EdgeflowError>;

/// Errors produced by the framework and its collaborators
#[derive(Error, Debug)]
pub enum EdgeflowError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Invalid stored item: {0}")]
    InvalidStoredItem(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Function '{0}' is not registered")]
    FunctionNotRegistered(String),

    #[error("Invalid configuration for function '{0}': {1}")]
    FunctionConfig(String, String),

    #[error("Secret error: {0}")]
    Secrets(String),

    #[error("Input decode error: {0}")]
    Decode(String),

    #[error("Route '{0}' is reserved")]
    RouteReserved(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CBOR decode error: {0}")]
    CborDecode(#[from] minicbor::decode::Error),

    #[error("CBOR encode error: {0}")]
    CborEncode(#[from] minicbor::encode::Error<std::convert::Infallible>),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Export failed with {0} HTTP status code")]
    ExportStatus(u16),
}

impl EdgeflowError {
    /// Shorthand for a [`EdgeflowError::Config`] with an owned message
    pub fn config(msg: impl Into<String>) -> Self {
        EdgeflowError::Config(msg.into())
    }

    /// Shorthand for a [`EdgeflowError::Store`] with an owned message
    pub fn store(msg: impl Into<String>) -> Self {
        EdgeflowError::Store(msg.into())
    }

    /// Shorthand for a [`EdgeflowError::Pipeline`] with an owned message
    pub fn pipeline(msg: impl Into<String>) -> Self {
        EdgeflowError::Pipeline(msg.into())
    }
}
