//! Compression transforms
//!
//! Compresses the incoming value and continues the pipeline with the
//! base64 encoding of the compressed bytes, so downstream text-based
//! sinks can carry the result unchanged.

use std::io::Write;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;

use crate::context::Context;
use crate::error::EdgeflowError;
use crate::function::{FunctionOutcome, PipelineFunction, Value};

/// Supported compression algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionAlgorithm {
    Gzip,
    Zlib,
}

/// Compresses the value and emits base64 text bytes
pub struct Compressor {
    algorithm: CompressionAlgorithm,
}

impl Compressor {
    pub fn new(algorithm: CompressionAlgorithm) -> Self {
        Self { algorithm }
    }

    fn compress(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        match self.algorithm {
            CompressionAlgorithm::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data)?;
                encoder.finish()
            }
            CompressionAlgorithm::Zlib => {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data)?;
                encoder.finish()
            }
        }
    }
}

#[async_trait]
impl PipelineFunction for Compressor {
    fn name(&self) -> &str {
        match self.algorithm {
            CompressionAlgorithm::Gzip => "CompressWithGzip",
            CompressionAlgorithm::Zlib => "CompressWithZlib",
        }
    }

    async fn call(&self, _ctx: &mut Context, input: Value) -> FunctionOutcome {
        let data = match input.coerce_bytes() {
            Ok(data) => data,
            Err(error) => return FunctionOutcome::Failed(error),
        };

        match self.compress(&data) {
            Ok(compressed) => {
                let encoded = BASE64.encode(compressed);
                FunctionOutcome::Next(Value::Bytes(Bytes::from(encoded.into_bytes())))
            }
            Err(error) => FunctionOutcome::Failed(EdgeflowError::Io(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WritableConfig;
    use flate2::read::{GzDecoder, ZlibDecoder};
    use std::io::Read;

    const CLEAR: &str = "This is the test string used for testing";

    async fn run(algorithm: CompressionAlgorithm) -> Vec<u8> {
        let compressor = Compressor::new(algorithm);
        let mut ctx = Context::new("corr", WritableConfig::default());
        match compressor
            .call(&mut ctx, Value::Text(CLEAR.to_string()))
            .await
        {
            FunctionOutcome::Next(Value::Bytes(bytes)) => bytes.to_vec(),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_gzip_round_trip() {
        let encoded = run(CompressionAlgorithm::Gzip).await;
        let compressed = BASE64.decode(encoded).unwrap();

        let mut decoder = GzDecoder::new(compressed.as_slice());
        let mut decoded = String::new();
        decoder.read_to_string(&mut decoded).unwrap();
        assert_eq!(decoded, CLEAR);
    }

    #[tokio::test]
    async fn test_zlib_round_trip() {
        let encoded = run(CompressionAlgorithm::Zlib).await;
        let compressed = BASE64.decode(encoded).unwrap();

        let mut decoder = ZlibDecoder::new(compressed.as_slice());
        let mut decoded = String::new();
        decoder.read_to_string(&mut decoded).unwrap();
        assert_eq!(decoded, CLEAR);
    }

    #[tokio::test]
    async fn test_compression_is_deterministic() {
        let first = run(CompressionAlgorithm::Gzip).await;
        let second = run(CompressionAlgorithm::Gzip).await;
        assert_eq!(first, second);
    }
}
