//! Testing utilities for the HttpMutator workspace
//!
//! Shared response fixtures, input documents and engine helpers.

#![allow(missing_docs)]

use httpmutator_core::{Engine, MutantGroup, Properties, Response};
use serde_json::{json, Value};

/// Engine over the built-in defaults with the given seed
pub fn engine(seed: u64) -> Engine {
    Engine::new(&Properties::defaults().unwrap(), seed).unwrap()
}

/// Engine over the defaults plus `overrides`
pub fn engine_with(seed: u64, overrides: &[(&str, Value)]) -> Engine {
    let mut props = Properties::defaults().unwrap();
    for (key, value) in overrides {
        match value {
            Value::Bool(b) => props.set(*key, *b),
            Value::Number(n) if n.is_i64() => props.set(*key, n.as_i64().unwrap()),
            Value::Number(n) => props.set(*key, n.as_f64().unwrap()),
            other => props.set(*key, other.as_str().unwrap_or_default()),
        }
    }
    Engine::new(&props, seed).unwrap()
}

pub fn response_from(document: Value) -> Response {
    Response::from_value(&document).unwrap()
}

/// `200`, `application/json`, `{"a": 1}`
pub fn scenario_document() -> Value {
    json!({
        "Status Code": 200,
        "Headers": {"Content-Type": "application/json"},
        "Body": {"a": 1}
    })
}

pub fn scenario_response() -> Response {
    response_from(scenario_document())
}

/// Response touching every mutator kind
pub fn rich_document() -> Value {
    json!({
        "Status Code": 201,
        "Headers": {
            "Content-Type": "text/html; charset=UTF-8; version=2",
            "Location": "https://api.example.test/orders/17?expand=items",
            "X-Request-Id": "abc-123"
        },
        "Body": {
            "id": 17,
            "total": 42.5,
            "paid": false,
            "note": null,
            "customer": {"name": "Ada", "tier": "gold"},
            "items": [
                {"sku": "A-1", "qty": 2},
                {"sku": "B-7", "qty": 1},
                {"sku": "C-3", "qty": 5}
            ]
        }
    })
}

pub fn rich_response() -> Response {
    response_from(rich_document())
}

pub fn identifiers(groups: &[MutantGroup]) -> Vec<&str> {
    groups.iter().map(MutantGroup::identifier).collect()
}

/// One JSON document per line
pub fn jsonl_document(documents: &[Value]) -> String {
    documents
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// HAR entry with a JSON or text response body
pub fn har_entry(status: u16, headers: &[(&str, &str)], text: Option<&str>) -> Value {
    let headers: Vec<Value> = headers
        .iter()
        .map(|(name, value)| json!({"name": name, "value": value}))
        .collect();
    let mut content = json!({"size": -1, "mimeType": "application/json"});
    if let Some(text) = text {
        content["text"] = json!(text);
        content["size"] = json!(text.len());
    }
    json!({
        "startedDateTime": "2024-01-01T00:00:00.000Z",
        "time": 0,
        "request": {
            "method": "GET",
            "url": "https://api.example.test/orders/17",
            "httpVersion": "HTTP/1.1",
            "headers": [{"name": "Accept", "value": "application/json"}],
            "queryString": [],
            "cookies": [],
            "headersSize": -1,
            "bodySize": -1
        },
        "response": {
            "status": status,
            "statusText": "",
            "httpVersion": "HTTP/1.1",
            "headers": headers,
            "cookies": [],
            "content": content,
            "redirectURL": "",
            "headersSize": -1,
            "bodySize": -1
        },
        "cache": {},
        "timings": {"send": 0, "wait": 0, "receive": 0}
    })
}

pub fn har_document(entries: Vec<Value>) -> String {
    json!({
        "log": {
            "version": "1.2",
            "creator": {"name": "fixture", "version": "1"},
            "entries": entries
        }
    })
    .to_string()
}
