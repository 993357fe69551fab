//! Data model for the NCKVS RPC service.
//!
//! # Design
//! A record is an ordered JSON object. `serde_json::Value` already is the
//! tagged scalar / sequence / mapping model the codec dispatches on, so
//! records reuse it instead of wrapping it in a parallel enum. Key order is
//! preserved (`preserve_order`) so request bodies stay stable for logging
//! and substring assertions.
//!
//! The envelope structs below are serialized field-for-field onto the wire;
//! field names are the service's and are case-sensitive.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single stored item: field name to value.
pub type Record = Map<String, Value>;

/// Reserved field carrying the record identifier.
pub const ID_FIELD: &str = "id";

/// Identifier sentinel asking the service to assign a fresh id.
pub const NEW_ID: &str = "-1";

/// Match mode for exact comparison.
pub const PATTERN_CMP: &str = "cmp";

/// Credentials and application identity sent as `system` on every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionParams {
    pub login_name: String,
    pub login_pass: String,
    pub app_servername: String,
    pub app_username: String,
    pub timezone: String,
}

/// One search predicate term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matcher {
    pub key: String,
    pub value: Value,
    pub pattern: String,
}

impl Matcher {
    pub fn new(key: impl Into<String>, value: impl Into<Value>, pattern: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            pattern: pattern.into(),
        }
    }

    /// Exact-match term (`pattern: "cmp"`).
    pub fn cmp(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(key, value, PATTERN_CMP)
    }
}

/// Request envelope shared by every operation.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a, Q> {
    pub system: &'a SessionParams,
    pub query: Q,
}

/// `query` for `/data/set/`.
#[derive(Debug, Clone, Serialize)]
pub struct SetQuery<'a> {
    pub datalist: Vec<Record>,
    pub datatypename: &'a str,
    pub datatypeversion: u32,
}

/// `query` for `/data/search/`.
///
/// `dataversion`, `limit` and `sortorder` are fixed: every version, no limit,
/// no ordering.
#[derive(Debug, Clone, Serialize)]
pub struct SearchQuery<'a> {
    pub datatypename: &'a str,
    pub dataversion: &'static str,
    pub limit: u32,
    pub sortorder: Vec<Value>,
    pub matching: &'a [Matcher],
}

/// `query` for `/data/delete/`.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteQuery<'a, I> {
    pub datatypename: &'a str,
    pub datatypeversion: u32,
    pub idlist: &'a [I],
}

/// A successful service response with every record already decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datalist: Option<Vec<Record>>,
}

impl RpcResponse {
    /// Records returned by the call, empty when the service sent none.
    pub fn records(&self) -> &[Record] {
        self.datalist.as_deref().unwrap_or(&[])
    }

    pub fn into_records(self) -> Vec<Record> {
        self.datalist.unwrap_or_default()
    }
}
