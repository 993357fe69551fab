//! Error types for the NCKVS client.
//!
//! # Design
//! Three layers of failure are kept apart: the transport (network trouble),
//! HTTP (a non-2xx status from the gateway), and RPC (a well-formed envelope
//! whose `code` is not `"200"`). Callers frequently need to tell these apart,
//! so each gets its own variant and none is folded into another.
//!
//! A field value that fails to decode as JSON is deliberately absent from
//! this list: the codec keeps the raw string instead.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by `KvsClient` build, parse and round-trip methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service answered with an RPC code other than `"200"`.
    #[error("RPCError: {code} {}", .message.as_deref().unwrap_or(""))]
    Rpc {
        code: String,
        message: Option<String>,
    },

    /// The response body was not JSON, or lacked a string `code`.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Upsert found more than one record for a key expected to be unique.
    #[error("{matches} records match `{key}`, expected at most one")]
    NotUnique { key: String, matches: usize },

    /// Upsert was asked to key on a field the item does not carry.
    #[error("item has no field `{0}`")]
    MissingField(String),

    /// The HTTP layer returned a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response (connection refused, DNS, ...).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// The RPC status code, when the service itself reported the failure.
    pub fn rpc_code(&self) -> Option<&str> {
        match self {
            ApiError::Rpc { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Errors raised while loading a `ClientConfig` from a file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config has no [{0}] section")]
    MissingSection(String),

    #[error("config is missing `{0}`")]
    MissingKey(&'static str),

    #[error("invalid value for `{key}`: {value}")]
    InvalidValue { key: &'static str, value: String },

    /// Type-based encoding and an explicit field list are exclusive.
    #[error("`encoding = \"containers\"` cannot be combined with `encoded_fields`")]
    ConflictingEncoding,
}
