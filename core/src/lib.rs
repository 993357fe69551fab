//! Synchronous client core for the NCKVS key-value RPC service.
//!
//! # Overview
//! Builds `HttpRequest` values for `/data/set/`, `/data/search/` and
//! `/data/delete/` and interprets the JSON envelopes that come back. The
//! network exchange is delegated to a [`Transport`], so every piece of logic
//! here is deterministic and testable without a server.
//!
//! # Design
//! - `KvsClient` is stateless; it holds only an immutable `ClientConfig`.
//! - Structured field values travel as JSON text; the [`codec`] module owns
//!   that translation under a per-client [`EncodingPolicy`].
//! - Errors keep transport, HTTP and RPC failures apart (see [`ApiError`]).
//! - [`upsert`] composes search and set with a uniqueness check.
//!
//! ```no_run
//! use nckvs_core::{ClientConfig, KvsClient, UreqTransport};
//!
//! let config = ClientConfig::from_file("nckvs.toml", "nckvs")?;
//! let client = KvsClient::new(config);
//! let mut item = nckvs_core::Record::new();
//! item.insert("doc_id".into(), "0001".into());
//! item.insert("tags".into(), serde_json::json!(["a", "b"]));
//! client.upsert(&UreqTransport::new(), &item, "doc_id")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;
pub mod upsert;

pub use client::KvsClient;
pub use codec::{decode_record, encode_record, encode_value, EncodingPolicy};
pub use config::{ClientConfig, DEFAULT_SECTION};
pub use error::{ApiError, ConfigError};
pub use http::{HttpRequest, HttpResponse};
pub use transport::Transport;
#[cfg(feature = "http")]
pub use transport::UreqTransport;
pub use types::{Matcher, Record, RpcResponse, SessionParams};
pub use upsert::{plan_upsert, UpsertOutcome, UpsertPlan};
