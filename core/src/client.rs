//! Request builder and response interpreter for the NCKVS RPC service.
//!
//! # Design
//! `KvsClient` holds only its immutable `ClientConfig` and carries no state
//! between calls, so one instance can serve any number of threads. Each
//! operation is split into a `build_*` method that produces an `HttpRequest`
//! and the shared `parse_response` that consumes the `HttpResponse`. The
//! round-trip helpers (`set`, `search`, `delete`) just glue the two halves
//! to a [`Transport`].

use serde::Serialize;
use tracing::{debug, warn};

use crate::codec::{decode_record, encode_record};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{DeleteQuery, Matcher, Record, RpcRequest, RpcResponse, SearchQuery, SetQuery};

const SET_PATH: &str = "/data/set/";
const SEARCH_PATH: &str = "/data/search/";
const DELETE_PATH: &str = "/data/delete/";

/// The only RPC code that means success.
pub const CODE_OK: &str = "200";

/// Synchronous, stateless client for the NCKVS RPC service.
#[derive(Debug, Clone)]
pub struct KvsClient {
    config: ClientConfig,
}

impl KvsClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Store `items`. Records with `id: "-1"` are created, others replaced.
    pub fn build_set(&self, items: &[Record]) -> Result<HttpRequest, ApiError> {
        let datalist = items
            .iter()
            .map(|item| encode_record(item, &self.config.encoding))
            .collect();
        let query = SetQuery {
            datalist,
            datatypename: &self.config.datatypename,
            datatypeversion: self.config.datatypeversion,
        };
        self.build("set", SET_PATH, query)
    }

    /// Find every record satisfying all of `matchers`.
    pub fn build_search(&self, matchers: &[Matcher]) -> Result<HttpRequest, ApiError> {
        let query = SearchQuery {
            datatypename: &self.config.datatypename,
            dataversion: "*",
            limit: 0,
            sortorder: Vec::new(),
            matching: matchers,
        };
        self.build("search", SEARCH_PATH, query)
    }

    /// Remove the records with the given ids.
    pub fn build_delete<I: Serialize>(&self, ids: &[I]) -> Result<HttpRequest, ApiError> {
        let query = DeleteQuery {
            datatypename: &self.config.datatypename,
            datatypeversion: self.config.datatypeversion,
            idlist: ids,
        };
        self.build("delete", DELETE_PATH, query)
    }

    /// Apply the HTTP status gate, then interpret the body.
    pub fn parse_response(&self, response: HttpResponse) -> Result<RpcResponse, ApiError> {
        if !response.is_success() {
            return Err(ApiError::Http {
                status: response.status,
                body: response.body,
            });
        }
        self.interpret(&response.body)
    }

    /// Decode a raw response body and check its RPC code.
    ///
    /// On success every record in `datalist` has been run through the codec.
    pub fn interpret(&self, body: &str) -> Result<RpcResponse, ApiError> {
        let mut response: RpcResponse =
            serde_json::from_str(body).map_err(|e| ApiError::MalformedResponse(e.to_string()))?;

        if response.code != CODE_OK {
            warn!(code = %response.code, message = ?response.message, "rpc call failed");
            return Err(ApiError::Rpc {
                code: response.code,
                message: response.message,
            });
        }

        if let Some(datalist) = response.datalist.take() {
            let decoded: Vec<Record> = datalist
                .into_iter()
                .map(|record| decode_record(record, &self.config.encoding))
                .collect();
            response.datalist = Some(decoded);
        }
        debug!(code = %response.code, records = response.records().len(), "rpc call succeeded");
        Ok(response)
    }

    pub fn set<T: Transport + ?Sized>(&self, transport: &T, items: &[Record]) -> Result<RpcResponse, ApiError> {
        let request = self.build_set(items)?;
        self.execute(transport, &request)
    }

    pub fn search<T: Transport + ?Sized>(
        &self,
        transport: &T,
        matchers: &[Matcher],
    ) -> Result<RpcResponse, ApiError> {
        let request = self.build_search(matchers)?;
        self.execute(transport, &request)
    }

    pub fn delete<T: Transport + ?Sized, I: Serialize>(
        &self,
        transport: &T,
        ids: &[I],
    ) -> Result<RpcResponse, ApiError> {
        let request = self.build_delete(ids)?;
        self.execute(transport, &request)
    }

    pub(crate) fn execute<T: Transport + ?Sized>(
        &self,
        transport: &T,
        request: &HttpRequest,
    ) -> Result<RpcResponse, ApiError> {
        let response = transport.send(request)?;
        self.parse_response(response)
    }

    fn build<Q: Serialize>(&self, op: &'static str, path: &str, query: Q) -> Result<HttpRequest, ApiError> {
        let envelope = RpcRequest {
            system: &self.config.session,
            query,
        };
        let body = serde_json::to_string(&envelope).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let url = format!("{}{path}", self.config.base_url);
        debug!(op, %url, bytes = body.len(), "built request");
        Ok(HttpRequest::json(url, body))
    }
}
