//! In-memory stand-in for the NCKVS RPC service.
//!
//! Every endpoint answers HTTP 200 with an RPC envelope; service-level
//! failures are reported through `code`/`message` the way the real service
//! does. Records are stored exactly as they arrive on the wire.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub type Record = Map<String, Value>;

#[derive(Debug, Default)]
pub struct Store {
    next_id: u64,
    tables: HashMap<String, BTreeMap<u64, Record>>,
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Deserialize)]
pub struct RpcRequest<Q> {
    pub system: System,
    pub query: Q,
}

#[derive(Deserialize)]
pub struct System {
    #[serde(default)]
    pub login_name: String,
    #[serde(default)]
    pub login_pass: String,
}

#[derive(Deserialize)]
pub struct SetQuery {
    pub datalist: Vec<Record>,
    pub datatypename: String,
}

#[derive(Deserialize)]
pub struct Matcher {
    pub key: String,
    pub value: Value,
    pub pattern: String,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub datatypename: String,
    #[serde(default)]
    pub matching: Vec<Matcher>,
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    pub datatypename: String,
    pub idlist: Vec<Value>,
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/data/set/", post(set_data))
        .route("/data/search/", post(search_data))
        .route("/data/delete/", post(delete_data))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn ok(datalist: Vec<Record>) -> Json<Value> {
    Json(json!({ "code": "200", "datalist": datalist }))
}

fn rpc_error(code: &str, message: impl Into<String>) -> Json<Value> {
    Json(json!({ "code": code, "message": message.into() }))
}

fn authenticate(system: &System) -> Result<(), Json<Value>> {
    if system.login_name.is_empty() || system.login_pass.is_empty() {
        return Err(rpc_error("401", "authentication failed"));
    }
    Ok(())
}

/// Numeric id from either `"7"` or `7`.
fn parse_id(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn matches(record: &Record, m: &Matcher) -> bool {
    let Some(field) = record.get(&m.key) else {
        return false;
    };
    match m.pattern.as_str() {
        "cmp" => text(field) == text(&m.value),
        "fcmp" => text(field).starts_with(&text(&m.value)),
        _ => false,
    }
}

async fn set_data(State(db): State<Db>, Json(req): Json<RpcRequest<SetQuery>>) -> Json<Value> {
    if let Err(resp) = authenticate(&req.system) {
        return resp;
    }
    let mut store = db.write().await;
    let Store { next_id, tables } = &mut *store;
    let table = tables.entry(req.query.datatypename).or_default();

    let mut planned = Vec::with_capacity(req.query.datalist.len());
    for item in req.query.datalist {
        let id = match item.get("id") {
            None => None,
            Some(Value::String(s)) if s == "-1" => None,
            Some(v) => match parse_id(v) {
                Some(id) if table.contains_key(&id) => Some(id),
                _ => return rpc_error("404", format!("no record with id {}", text(v))),
            },
        };
        planned.push((id, item));
    }

    let mut saved = Vec::with_capacity(planned.len());
    for (id, mut item) in planned {
        let id = id.unwrap_or_else(|| {
            *next_id += 1;
            *next_id
        });
        item.insert("id".to_string(), Value::String(id.to_string()));
        table.insert(id, item.clone());
        saved.push(item);
    }
    ok(saved)
}

async fn search_data(State(db): State<Db>, Json(req): Json<RpcRequest<SearchQuery>>) -> Json<Value> {
    if let Err(resp) = authenticate(&req.system) {
        return resp;
    }
    if let Some(m) = req.query.matching.iter().find(|m| !matches!(m.pattern.as_str(), "cmp" | "fcmp")) {
        return rpc_error("400", format!("unsupported pattern: {}", m.pattern));
    }
    let store = db.read().await;
    let found: Vec<Record> = store
        .tables
        .get(&req.query.datatypename)
        .map(|table| {
            table
                .values()
                .filter(|record| req.query.matching.iter().all(|m| matches(record, m)))
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    ok(found)
}

async fn delete_data(State(db): State<Db>, Json(req): Json<RpcRequest<DeleteQuery>>) -> Json<Value> {
    if let Err(resp) = authenticate(&req.system) {
        return resp;
    }
    let mut store = db.write().await;
    let Some(table) = store.tables.get_mut(&req.query.datatypename) else {
        return ok(Vec::new());
    };
    let removed: Vec<Record> = req
        .query
        .idlist
        .iter()
        .filter_map(parse_id)
        .filter_map(|id| table.remove(&id))
        .collect();
    ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn parse_id_accepts_strings_and_numbers() {
        assert_eq!(parse_id(&json!("7")), Some(7));
        assert_eq!(parse_id(&json!(7)), Some(7));
        assert_eq!(parse_id(&json!("-1")), None);
        assert_eq!(parse_id(&json!(null)), None);
    }

    #[test]
    fn cmp_is_exact_on_text() {
        let r = record(json!({"doc_id": "0001", "n": 5}));
        let m = |key: &str, value: Value, pattern: &str| Matcher {
            key: key.to_string(),
            value,
            pattern: pattern.to_string(),
        };
        assert!(matches(&r, &m("doc_id", json!("0001"), "cmp")));
        assert!(!matches(&r, &m("doc_id", json!("000"), "cmp")));
        assert!(matches(&r, &m("doc_id", json!("000"), "fcmp")));
        assert!(matches(&r, &m("n", json!(5), "cmp")));
        assert!(!matches(&r, &m("missing", json!("x"), "cmp")));
    }

    #[test]
    fn set_query_requires_datalist() {
        let result: Result<SetQuery, _> = serde_json::from_str(r#"{"datatypename":"t"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn search_query_ignores_fixed_fields() {
        let q: SearchQuery = serde_json::from_str(
            r#"{"datatypename":"t","dataversion":"*","limit":0,"sortorder":[],"matching":[]}"#,
        )
        .unwrap();
        assert_eq!(q.datatypename, "t");
        assert!(q.matching.is_empty());
    }
}
