//! The seam between the client and the network.
//!
//! # Design
//! The client never performs I/O itself. The round-trip helpers on
//! `KvsClient` accept anything implementing [`Transport`], including plain
//! closures, so tests can script responses and record requests without a
//! server. `UreqTransport` (feature `http`) is the blocking default.
//!
//! A transport returns `Ok` for every HTTP status it receives. Status
//! interpretation belongs to `KvsClient::parse_response`, which keeps HTTP
//! failures separate from RPC failures.

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one HTTP exchange.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, ApiError>,
{
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self(request)
    }
}

#[cfg(feature = "http")]
pub use self::ureq_transport::UreqTransport;

#[cfg(feature = "http")]
mod ureq_transport {
    use super::Transport;
    use crate::error::ApiError;
    use crate::http::{HttpRequest, HttpResponse, CONTENT_LENGTH};

    /// Blocking transport backed by a shared `ureq::Agent`.
    ///
    /// Response bodies are read without a size cap by default: searches ask
    /// for the full result set (`limit: 0`), which can exceed ureq's 10 MiB
    /// default.
    #[derive(Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
        body_limit: u64,
    }

    impl UreqTransport {
        /// Disables ureq's status-code-as-error behavior so 4xx/5xx
        /// responses come back as data.
        pub fn new() -> Self {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent();
            Self {
                agent,
                body_limit: u64::MAX,
            }
        }

        /// Fail with `ApiError::Transport` when a response body exceeds
        /// `bytes`.
        pub fn with_body_limit(mut self, bytes: u64) -> Self {
            self.body_limit = bytes;
            self
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Transport for UreqTransport {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            let mut builder = self.agent.post(&request.url);
            for (name, value) in &request.headers {
                // ureq derives the length from the body it sends.
                if name.eq_ignore_ascii_case(CONTENT_LENGTH) {
                    continue;
                }
                builder = builder.header(name.as_str(), value.as_str());
            }

            let mut response = builder
                .send(request.body.as_bytes())
                .map_err(|e| ApiError::Transport(e.to_string()))?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
                .collect();
            let body = response
                .body_mut()
                .with_config()
                .limit(self.body_limit)
                .read_to_string()
                .map_err(|e| ApiError::Transport(e.to_string()))?;

            Ok(HttpResponse { status, headers, body })
        }
    }
}
