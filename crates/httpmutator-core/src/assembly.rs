//! Turning a mutated component back into a full response
//!
//! Only the touched component is rebuilt; the others are shared with the
//! original through [`Response::with_status_code`] and friends.

use crate::error::AssemblyError;
use crate::model::{Response, BODY_LOCATION};
use serde_json::Value;

/// Response with a mutated status code
///
/// # Errors
/// Fails when `value` is not an integer in `100..=599`.
pub fn with_status(original: &Response, value: &Value) -> Result<Response, AssemblyError> {
    value
        .as_u64()
        .and_then(|code| u16::try_from(code).ok())
        .filter(|code| (100..=599).contains(code))
        .map(|code| original.with_status_code(code))
        .ok_or_else(|| AssemblyError::StatusCode(value.to_string()))
}

/// Response with one header set or removed
///
/// `null`, an empty string and the literal `"null"` remove the header.
/// Otherwise the value is stored under the existing spelling of `name`.
///
/// # Errors
/// Fails when `value` is neither a string nor null.
pub fn with_header(original: &Response, name: &str, value: &Value) -> Result<Response, AssemblyError> {
    let mut headers = original.headers().clone();
    match value {
        Value::Null => {
            headers.remove(name);
        }
        Value::String(s) if s.is_empty() || s == "null" => {
            headers.remove(name);
        }
        Value::String(s) => headers.set(name, s.as_str()),
        other => {
            return Err(AssemblyError::Headers(format!(
                "{name} cannot hold {other}"
            )))
        }
    }
    Ok(original.with_headers(headers))
}

/// Response whose body has `value` at JSON pointer `pointer`
///
/// An empty pointer replaces the whole body.
///
/// # Errors
/// Fails when `pointer` does not resolve inside the original body.
pub fn with_body_at(original: &Response, pointer: &str, value: Value) -> Result<Response, AssemblyError> {
    if pointer.is_empty() {
        return Ok(original.with_body(value));
    }
    let mut body = original.body().clone();
    let slot = body
        .pointer_mut(pointer)
        .ok_or_else(|| AssemblyError::BodyPath(body_location(pointer)))?;
    *slot = value;
    Ok(original.with_body(body))
}

/// Group identifier of the body site at `pointer`
#[must_use]
pub fn body_location(pointer: &str) -> String {
    format!("{BODY_LOCATION}{pointer}")
}

/// Append one reference token to a JSON pointer, escaping `~` and `/`
#[must_use]
pub fn child_pointer(parent: &str, token: &str) -> String {
    let escaped = token.replace('~', "~0").replace('/', "~1");
    format!("{parent}/{escaped}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Headers;
    use serde_json::json;

    fn original() -> Response {
        let headers: Headers = [("Content-Type", "application/json"), ("Location", "/a")]
            .into_iter()
            .collect();
        Response::new(200, headers, json!({"user": {"tags": ["x", "y"]}})).unwrap()
    }

    #[test]
    fn status_assembly_validates_range() {
        let original = original();
        let mutated = with_status(&original, &json!(503)).unwrap();
        assert_eq!(mutated.status_code(), 503);
        assert!(mutated.shares_body_with(&original));
        assert!(mutated.shares_headers_with(&original));

        assert!(with_status(&original, &json!(42)).is_err());
        assert!(with_status(&original, &json!("500")).is_err());
    }

    #[test]
    fn header_assembly_sets_or_removes() {
        let original = original();
        let set = with_header(&original, "location", &json!("/b")).unwrap();
        assert_eq!(set.headers().get("Location"), Some("/b"));
        assert_eq!(set.headers().field_name("location"), Some("Location"));
        assert!(set.shares_body_with(&original));

        for removal in [Value::Null, json!(""), json!("null")] {
            let removed = with_header(&original, "LOCATION", &removal).unwrap();
            assert!(!removed.headers().contains("location"));
            assert_eq!(removed.headers().len(), 1);
        }

        assert!(with_header(&original, "Location", &json!(1)).is_err());
    }

    #[test]
    fn body_assembly_replaces_one_site() {
        let original = original();
        let mutated = with_body_at(&original, "/user/tags/1", json!(null)).unwrap();
        assert_eq!(mutated.body(), &json!({"user": {"tags": ["x", null]}}));
        assert!(mutated.shares_headers_with(&original));
        assert_eq!(original.body(), &json!({"user": {"tags": ["x", "y"]}}));

        assert_eq!(
            with_body_at(&original, "/missing", json!(1)),
            Err(AssemblyError::BodyPath("Body/missing".into()))
        );
        assert_eq!(with_body_at(&original, "", json!([])).unwrap().body(), &json!([]));
    }

    #[test]
    fn pointer_tokens_are_escaped() {
        assert_eq!(child_pointer("", "a/b"), "/a~1b");
        assert_eq!(child_pointer("/x", "m~n"), "/x/m~0n");
        assert_eq!(body_location("/a~1b"), "Body/a~1b");
    }
}
