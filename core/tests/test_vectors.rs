//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected results. Comparing parsed JSON (not raw strings) avoids
//! false negatives from field-ordering differences.

use std::cell::RefCell;

use nckvs_core::http::CONTENT_LENGTH;
use nckvs_core::{
    ApiError, ClientConfig, EncodingPolicy, HttpRequest, HttpResponse, KvsClient, Matcher, Record, RpcResponse,
    Transport,
};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:3000";

fn client(policy: &Value) -> KvsClient {
    let encoding = match policy {
        Value::Array(names) => EncodingPolicy::fields(names.iter().map(|n| n.as_str().unwrap())),
        _ => EncodingPolicy::Containers,
    };
    let config = ClientConfig::new(BASE_URL, "user", "pass", "testtype")
        .with_datatypeversion(2)
        .with_app("appname", "appuser")
        .with_encoding(encoding);
    KvsClient::new(config)
}

fn records(value: &Value) -> Vec<Record> {
    serde_json::from_value(value.clone()).unwrap()
}

fn check_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.url, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: url");
    assert_eq!(
        req.header(CONTENT_LENGTH),
        Some(req.body.len().to_string().as_str()),
        "{name}: content length"
    );
    let body: Value = serde_json::from_str(&req.body).unwrap();
    assert_eq!(body, expected["body"], "{name}: body");
}

// ---------------------------------------------------------------------------
// Set
// ---------------------------------------------------------------------------

#[test]
fn set_test_vectors() {
    let raw = include_str!("../../test-vectors/set.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let c = client(&case["policy"]);
        let req = c.build_set(&records(&case["input"])).unwrap();
        check_request(name, &req, &case["expected_request"]);
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[test]
fn search_test_vectors() {
    let raw = include_str!("../../test-vectors/search.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client(&Value::Null);
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let matchers: Vec<Matcher> = serde_json::from_value(case["input"].clone()).unwrap();
        let req = c.build_search(&matchers).unwrap();
        check_request(name, &req, &case["expected_request"]);
    }
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[test]
fn delete_test_vectors() {
    let raw = include_str!("../../test-vectors/delete.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client(&Value::Null);
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let ids = case["input"].as_array().unwrap();
        let req = c.build_delete(ids).unwrap();
        check_request(name, &req, &case["expected_request"]);
    }
}

// ---------------------------------------------------------------------------
// Response interpretation
// ---------------------------------------------------------------------------

#[test]
fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/response.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let c = client(&case["policy"]);
        let sim = &case["simulated_response"];
        let response = HttpResponse {
            status: sim["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: sim["body"].as_str().unwrap().to_string(),
        };
        let result = c.parse_response(response);

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "Rpc" => assert_eq!(err.rpc_code(), case["expected_code"].as_str(), "{name}: rpc code"),
                "MalformedResponse" => {
                    assert!(matches!(err, ApiError::MalformedResponse(_)), "{name}: expected MalformedResponse")
                }
                "Http" => assert!(matches!(err, ApiError::Http { .. }), "{name}: expected Http"),
                other => panic!("{name}: unknown expected_error: {other}"),
            }
        } else {
            let parsed = result.unwrap();
            let expected: RpcResponse = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(parsed, expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Upsert
// ---------------------------------------------------------------------------

/// Replies to searches with `found`, to writes with success, and keeps every
/// request body.
struct Scripted {
    found: Value,
    sent: RefCell<Vec<(String, Value)>>,
}

impl Transport for Scripted {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let body: Value = serde_json::from_str(&request.body).unwrap();
        self.sent.borrow_mut().push((request.url.clone(), body));
        let reply = if request.url.ends_with("/data/search/") {
            serde_json::json!({"code": "200", "datalist": self.found})
        } else {
            serde_json::json!({"code": "200"})
        };
        Ok(HttpResponse::ok(reply.to_string()))
    }
}

#[test]
fn upsert_test_vectors() {
    let raw = include_str!("../../test-vectors/upsert.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client(&Value::Null);
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let item: Record = serde_json::from_value(case["item"].clone()).unwrap();
        let key = case["key"].as_str().unwrap();
        let pattern = case["pattern"].as_str().unwrap();
        let accept = case["compare"].as_str().unwrap() == "always";
        let transport = Scripted {
            found: case["found"].clone(),
            sent: RefCell::new(Vec::new()),
        };

        let result = c.upsert_with(&transport, &item, key, pattern, |_, _| accept);
        let sent = transport.sent.borrow();

        assert_eq!(sent[0].1["query"]["matching"], case["expected_search"], "{name}: search");

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "NotUnique" => assert!(matches!(err, ApiError::NotUnique { .. }), "{name}: expected NotUnique"),
                other => panic!("{name}: unknown expected_error: {other}"),
            }
            assert_eq!(sent.len(), 1, "{name}: no write after failure");
            continue;
        }

        result.unwrap();
        match &case["expected_write"] {
            Value::Null => assert_eq!(sent.len(), 1, "{name}: no write expected"),
            expected => {
                assert_eq!(sent.len(), 2, "{name}: one write expected");
                assert_eq!(&sent[1].1["query"]["datalist"], expected, "{name}: write");
            }
        }
    }
}
