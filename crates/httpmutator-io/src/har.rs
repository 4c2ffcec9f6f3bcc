//! Conversion between HAR 1.2 entries and the canonical model
//!
//! Response bodies travel through `content.text`: on the way in the text is
//! parsed as JSON when it is valid JSON and kept as a plain string otherwise.
//! On the way out strings are written as they are and everything else as
//! compact JSON. A string body that itself looks like JSON (for example
//! `"123"`) therefore reads back as the parsed value.

use crate::exchange::Request;
use httpmutator_core::{kind_name, Headers, InputError, Response};
use serde_json::{json, Map, Value};

/// HAR format version written by this crate
pub const HAR_VERSION: &str = "1.2";

/// HTTP version recorded on written messages
pub const HTTP_VERSION: &str = "HTTP/1.1";

/// Parse a HAR `response` object
///
/// # Errors
/// Fails when the object has no valid `status` or malformed `headers`.
pub fn response_from_har(response: &Value) -> Result<Response, InputError> {
    let object = response
        .as_object()
        .ok_or(InputError::NotAnObject(kind_name(response)))?;

    let status = object.get("status").ok_or(InputError::MissingStatusCode)?;
    let status = status
        .as_u64()
        .and_then(|s| u16::try_from(s).ok())
        .ok_or_else(|| InputError::InvalidStatusCode(status.to_string()))?;

    let headers = headers_from_har(object.get("headers"))?;

    let body = object
        .get("content")
        .and_then(|c| c.get("text"))
        .and_then(Value::as_str)
        .map_or(Value::Null, body_from_text);

    Response::new(status, headers, body)
}

/// Parse a HAR `request` object; `None` when it lacks a method or URL
#[must_use]
pub fn request_from_har(request: &Value) -> Option<Request> {
    let method = request.get("method")?.as_str()?;
    let url = request.get("url")?.as_str()?;
    let mut parsed = Request::new(method, url);
    parsed.headers = headers_from_har(request.get("headers")).unwrap_or_default();
    parsed.body = request
        .get("postData")
        .and_then(|p| p.get("text"))
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(parsed)
}

/// HAR `response` object for a canonical response
#[must_use]
pub fn response_to_har(response: &Response) -> Value {
    let headers = response.headers();
    let text = body_to_text(response.body());
    let size = text.as_ref().map_or(0, String::len);
    let mime_type = headers
        .get("Content-Type")
        .unwrap_or("application/octet-stream");

    let mut content = Map::new();
    content.insert("size".into(), json!(size));
    content.insert("mimeType".into(), json!(mime_type));
    if let Some(text) = text {
        content.insert("text".into(), Value::String(text));
    }

    json!({
        "status": response.status_code(),
        "statusText": status_text(response.status_code()),
        "httpVersion": HTTP_VERSION,
        "cookies": [],
        "headers": headers_to_har(headers),
        "content": Value::Object(content),
        "redirectURL": headers.get("Location").unwrap_or_default(),
        "headersSize": -1,
        "bodySize": size,
    })
}

/// HAR `request` object
#[must_use]
pub fn request_to_har(request: &Request) -> Value {
    let mut value = json!({
        "method": request.method,
        "url": request.url,
        "httpVersion": HTTP_VERSION,
        "cookies": [],
        "headers": headers_to_har(&request.headers),
        "queryString": query_string(&request.url),
        "headersSize": -1,
        "bodySize": request.body.as_ref().map_or(0, String::len),
    });
    if let Some(body) = &request.body {
        value["postData"] = json!({
            "mimeType": request.headers.get("Content-Type").unwrap_or_default(),
            "text": body,
        });
    }
    value
}

/// Reason phrase for common status codes, empty otherwise
#[must_use]
pub fn status_text(status: u16) -> &'static str {
    match status {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        206 => "Partial Content",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        409 => "Conflict",
        410 => "Gone",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "",
    }
}

fn headers_from_har(headers: Option<&Value>) -> Result<Headers, InputError> {
    let entries = match headers {
        None | Some(Value::Null) => return Ok(Headers::new()),
        Some(Value::Array(entries)) => entries,
        Some(other) => return Err(InputError::InvalidHeaders(kind_name(other))),
    };
    let mut parsed = Headers::new();
    for entry in entries {
        let name = entry.get("name").and_then(Value::as_str);
        let value = entry.get("value").and_then(Value::as_str);
        match (name, value) {
            (Some(name), Some(value)) => parsed.set(name, value),
            _ => return Err(InputError::InvalidHeaders(kind_name(entry))),
        }
    }
    Ok(parsed)
}

fn headers_to_har(headers: &Headers) -> Value {
    headers
        .iter()
        .map(|(name, value)| json!({"name": name, "value": value}))
        .collect()
}

fn body_from_text(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn body_to_text(body: &Value) -> Option<String> {
    match body {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn query_string(raw: &str) -> Value {
    url::Url::parse(raw)
        .map(|url| {
            url.query_pairs()
                .map(|(name, value)| json!({"name": name, "value": value}))
                .collect()
        })
        .unwrap_or_else(|_| Value::Array(Vec::new()))
}
