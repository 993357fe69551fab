//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The
//! client builds `HttpRequest` values and parses `HttpResponse` values
//! without touching the network; a [`Transport`](crate::Transport) or the
//! caller performs the exchange. Every service call is a `POST` with a JSON
//! body, so the method is implied rather than stored.

pub const CONTENT_TYPE: &str = "Content-type";
pub const CONTENT_LENGTH: &str = "Content-length";
pub const APPLICATION_JSON: &str = "application/json";

/// A `POST` request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpRequest {
    /// A JSON `POST` whose `Content-length` counts UTF-8 bytes, not chars.
    pub fn json(url: String, body: String) -> Self {
        let headers = vec![
            (CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string()),
            (CONTENT_LENGTH.to_string(), body.len().to_string()),
        ];
        Self { url, headers, body }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// Constructed by the transport after executing an `HttpRequest`, then
/// passed to `KvsClient::parse_response`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// A `200 OK` carrying `body`, convenient for transports and tests.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
