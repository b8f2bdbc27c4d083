//! Payload token codec
//!
//! An evaluation request travels to the remote runner inside a build
//! environment variable. The request is serialized to compact JSON, compressed
//! with zlib and base64-encoded; the runner reverses the three steps.
//!
//! Environment variables are size-limited by the backend (and by the kernel's
//! per-string argument limit on the agent), so the token size is a hard
//! ceiling: [`encode_bounded`] refuses oversized payloads instead of
//! truncating them. Large inputs such as binary archives must be referenced
//! out of band (see `EvaluationRequest::archive_blob`).

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{Read, Write};
use thiserror::Error;

/// Default ceiling for an encoded token, in bytes
pub const DEFAULT_MAX_TOKEN_BYTES: usize = 128 * 1024;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("request is not serializable: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("payload does not match the request schema: {0}")]
    Deserialize(#[source] serde_json::Error),

    #[error("compression failed: {0}")]
    Compression(#[from] std::io::Error),

    #[error("token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("encoded payload is {size} bytes, above the {limit} byte limit; pass large inputs by reference")]
    TooLarge { size: usize, limit: usize },
}

/// Encodes a value into a transport-safe ASCII token
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, CodecError> {
    let json = serde_json::to_vec(value).map_err(CodecError::Serialize)?;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;

    Ok(STANDARD.encode(compressed))
}

/// Like [`encode`], but fails when the token would exceed `limit` bytes
pub fn encode_bounded<T: Serialize + ?Sized>(value: &T, limit: usize) -> Result<String, CodecError> {
    let token = encode(value)?;
    if token.len() > limit {
        return Err(CodecError::TooLarge {
            size: token.len(),
            limit,
        });
    }
    Ok(token)
}

/// Decodes a token produced by [`encode`]
pub fn decode<T: DeserializeOwned>(token: &str) -> Result<T, CodecError> {
    let compressed = STANDARD.decode(token.trim())?;

    let mut json = Vec::new();
    ZlibDecoder::new(compressed.as_slice()).read_to_end(&mut json)?;

    serde_json::from_slice(&json).map_err(CodecError::Deserialize)
}
