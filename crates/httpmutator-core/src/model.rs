//! Canonical response, mutants and groups
//!
//! A [`Response`] keeps its header map and body behind [`Arc`] so a mutant
//! that only touches one component shares the other two with the original.

use crate::error::InputError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// JSON field holding the status code
pub const STATUS_CODE_FIELD: &str = "Status Code";
/// JSON field holding the header object
pub const HEADERS_FIELD: &str = "Headers";
/// JSON field holding the body
pub const BODY_FIELD: &str = "Body";

/// Group identifier for status code mutants
pub const STATUS_CODE_LOCATION: &str = "Status Code";
/// Group identifier for Content-Type media type mutants
pub const MEDIA_TYPE_LOCATION: &str = "Headers/content-type/mediaType";
/// Group identifier for Content-Type charset mutants
pub const CHARSET_LOCATION: &str = "Headers/content-type/charset";
/// Group identifier for Location header mutants
pub const LOCATION_LOCATION: &str = "Headers/location";
/// Group identifier for the root body, and prefix of nested body sites
pub const BODY_LOCATION: &str = "Body";

/// Ordered header map with case-insensitive lookup
///
/// Stored names keep their original casing; every lookup, update and
/// removal matches names ignoring ASCII case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(IndexMap<String, String>);

impl Headers {
    /// Create empty header map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a header, matched case-insensitively
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entry(name).map(|(_, v)| v)
    }

    /// Stored spelling of a header name
    #[must_use]
    pub fn field_name(&self, name: &str) -> Option<&str> {
        self.entry(name).map(|(k, _)| k)
    }

    /// True when a header with this name exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// Set a header, keeping the stored name and position when it exists
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let key = self
            .field_name(name)
            .map_or_else(|| name.to_string(), str::to_string);
        self.0.insert(key, value.into());
    }

    /// Remove a header, keeping the order of the others
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let key = self.field_name(name)?.to_string();
        self.0.shift_remove(&key)
    }

    /// Iterate in stored order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of headers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no headers
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON object form
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }

    fn entry(&self, name: &str) -> Option<(&str, &str)> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Canonical HTTP response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    #[serde(rename = "Status Code")]
    status_code: u16,
    #[serde(rename = "Headers")]
    headers: Arc<Headers>,
    #[serde(rename = "Body")]
    body: Arc<Value>,
}

impl Response {
    /// Create response from its parts
    ///
    /// # Errors
    /// Fails when the status code is outside `100..=599`.
    pub fn new(status_code: u16, headers: Headers, body: Value) -> Result<Self, InputError> {
        validate_status(i64::from(status_code))?;
        Ok(Self {
            status_code,
            headers: Arc::new(headers),
            body: Arc::new(body),
        })
    }

    /// Parse the canonical JSON document form
    ///
    /// Missing `Headers` means no headers and missing `Body` means a null
    /// body. Non-string header values are kept as their JSON text.
    ///
    /// # Errors
    /// Fails for a non-object document, or a missing or invalid status code.
    pub fn from_value(document: &Value) -> Result<Self, InputError> {
        let object = document
            .as_object()
            .ok_or(InputError::NotAnObject(kind_name(document)))?;

        let status = object
            .get(STATUS_CODE_FIELD)
            .ok_or(InputError::MissingStatusCode)?;
        let status_code = status
            .as_i64()
            .ok_or_else(|| InputError::InvalidStatusCode(status.to_string()))
            .and_then(validate_status)?;

        let headers = match object.get(HEADERS_FIELD) {
            None | Some(Value::Null) => Headers::new(),
            Some(Value::Object(map)) => headers_from_object(map),
            Some(other) => return Err(InputError::InvalidHeaders(kind_name(other))),
        };

        let body = object.get(BODY_FIELD).cloned().unwrap_or(Value::Null);

        Ok(Self {
            status_code,
            headers: Arc::new(headers),
            body: Arc::new(body),
        })
    }

    /// Canonical JSON document form
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert(STATUS_CODE_FIELD.into(), Value::from(self.status_code));
        object.insert(HEADERS_FIELD.into(), self.headers.to_value());
        object.insert(BODY_FIELD.into(), self.body.as_ref().clone());
        Value::Object(object)
    }

    /// Status code
    #[inline]
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Header map
    #[inline]
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Body value
    #[inline]
    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Copy with a new status code; headers and body are shared
    #[must_use]
    pub fn with_status_code(&self, status_code: u16) -> Self {
        Self {
            status_code,
            headers: Arc::clone(&self.headers),
            body: Arc::clone(&self.body),
        }
    }

    /// Copy with new headers; status code and body are shared
    #[must_use]
    pub fn with_headers(&self, headers: Headers) -> Self {
        Self {
            status_code: self.status_code,
            headers: Arc::new(headers),
            body: Arc::clone(&self.body),
        }
    }

    /// Copy with a new body; status code and headers are shared
    #[must_use]
    pub fn with_body(&self, body: Value) -> Self {
        Self {
            status_code: self.status_code,
            headers: Arc::clone(&self.headers),
            body: Arc::new(body),
        }
    }

    /// True when both responses share the same header allocation
    #[inline]
    #[must_use]
    pub fn shares_headers_with(&self, other: &Response) -> bool {
        Arc::ptr_eq(&self.headers, &other.headers)
    }

    /// True when both responses share the same body allocation
    #[inline]
    #[must_use]
    pub fn shares_body_with(&self, other: &Response) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }
}

fn validate_status(code: i64) -> Result<u16, InputError> {
    u16::try_from(code)
        .ok()
        .filter(|c| (100..=599).contains(c))
        .ok_or_else(|| InputError::InvalidStatusCode(code.to_string()))
}

fn headers_from_object(map: &Map<String, Value>) -> Headers {
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let text = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), text)
        })
        .collect()
}

/// Short name of a JSON value kind, for messages
#[must_use]
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() => "long",
        Value::Number(n) if n.is_f64() => "double",
        Value::Number(_) => "unsigned",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Family of operators specialised for one kind of value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MutatorKind {
    /// HTTP status code
    StatusCode,
    /// Content-Type media type
    MediaType,
    /// Content-Type charset parameter
    Charset,
    /// Location header
    Location,
    /// JSON object
    Object,
    /// JSON array
    Array,
    /// Signed 64-bit integer
    Long,
    /// Floating point number
    Double,
    /// String
    String,
    /// Boolean
    Boolean,
    /// JSON null
    Null,
}

impl MutatorKind {
    /// All kinds, in engine order
    pub const ALL: [MutatorKind; 11] = [
        Self::StatusCode,
        Self::MediaType,
        Self::Charset,
        Self::Location,
        Self::Object,
        Self::Array,
        Self::Long,
        Self::Double,
        Self::String,
        Self::Boolean,
        Self::Null,
    ];

    /// Display name used in reports and metadata
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::StatusCode => "StatusCodeMutator",
            Self::MediaType => "MediaTypeMutator",
            Self::Charset => "CharsetMutator",
            Self::Location => "LocationMutator",
            Self::Object => "ObjectMutator",
            Self::Array => "ArrayMutator",
            Self::Long => "LongMutator",
            Self::Double => "DoubleMutator",
            Self::String => "StringMutator",
            Self::Boolean => "BooleanMutator",
            Self::Null => "NullMutator",
        }
    }

    /// Configuration prefix of this mutator
    #[must_use]
    pub fn config_prefix(self) -> &'static str {
        match self {
            Self::StatusCode => "operator.sc",
            Self::MediaType => "operator.header.mediaType",
            Self::Charset => "operator.header.charset",
            Self::Location => "operator.header.location",
            Self::Object => "operator.object",
            Self::Array => "operator.array",
            Self::Long => "operator.value.long",
            Self::Double => "operator.value.double",
            Self::String => "operator.value.string",
            Self::Boolean => "operator.value.boolean",
            Self::Null => "operator.value.null",
        }
    }
}

impl fmt::Display for MutatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Atomic mutation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OperatorKind {
    /// Status code from the 2xx pool
    ReplaceWith2xx,
    /// Status code from the 4xx pool
    ReplaceWith4xx,
    /// Status code from the 5xx pool
    ReplaceWith5xx,
    /// Fresh value from a configured range or pool
    Replace,
    /// Small edit of the current value
    Mutate,
    /// Boundary string values
    Boundary,
    /// Insert special characters into a string
    AddSpecialCharacters,
    /// Remove object-valued properties
    RemoveObjectElement,
    /// Remove elements or properties
    RemoveElement,
    /// Add elements or properties
    AddElement,
    /// Empty a container
    Empty,
    /// Move one array element
    DisorderElements,
    /// Replace with null
    Null,
    /// Replace with a value of another JSON kind
    ChangeType,
}

impl OperatorKind {
    /// Display name used in reports and metadata
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ReplaceWith2xx => "ReplaceWith2xx",
            Self::ReplaceWith4xx => "ReplaceWith4xx",
            Self::ReplaceWith5xx => "ReplaceWith5xx",
            Self::Replace => "Replace",
            Self::Mutate => "Mutate",
            Self::Boundary => "Boundary",
            Self::AddSpecialCharacters => "AddSpecialCharacters",
            Self::RemoveObjectElement => "RemoveObjectElement",
            Self::RemoveElement => "RemoveElement",
            Self::AddElement => "AddElement",
            Self::Empty => "Empty",
            Self::DisorderElements => "DisorderElements",
            Self::Null => "Null",
            Self::ChangeType => "ChangeType",
        }
    }

    /// Configuration key segment of this operator
    #[must_use]
    pub fn config_key(self) -> &'static str {
        match self {
            Self::ReplaceWith2xx => "replaceWith2xx",
            Self::ReplaceWith4xx => "replaceWith4xx",
            Self::ReplaceWith5xx => "replaceWith5xx",
            Self::Replace => "replace",
            Self::Mutate => "mutate",
            Self::Boundary => "boundary",
            Self::AddSpecialCharacters => "addSpecialCharacters",
            Self::RemoveObjectElement => "removeObjectElement",
            Self::RemoveElement => "removeElement",
            Self::AddElement => "addElement",
            Self::Empty => "empty",
            Self::DisorderElements => "disorderElements",
            Self::Null => "null",
            Self::ChangeType => "changeType",
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One complete mutated response with its provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mutant {
    location: String,
    response: Response,
    mutator: MutatorKind,
    operator: OperatorKind,
    weight: f32,
}

impl Mutant {
    /// Create mutant
    #[inline]
    #[must_use]
    pub fn new(
        location: impl Into<String>,
        response: Response,
        mutator: MutatorKind,
        operator: OperatorKind,
        weight: f32,
    ) -> Self {
        Self {
            location: location.into(),
            response,
            mutator,
            operator,
            weight,
        }
    }

    /// Location path of the mutated site
    #[inline]
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Full mutated response
    #[inline]
    #[must_use]
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Mutator that produced this mutant
    #[inline]
    #[must_use]
    pub fn mutator(&self) -> MutatorKind {
        self.mutator
    }

    /// Operator that produced this mutant
    #[inline]
    #[must_use]
    pub fn operator(&self) -> OperatorKind {
        self.operator
    }

    /// Configured weight of the producing operator
    #[inline]
    #[must_use]
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Consume into the mutated response
    #[inline]
    #[must_use]
    pub fn into_response(self) -> Response {
        self.response
    }
}

/// Mutants produced at one mutation site
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutantGroup {
    identifier: String,
    mutants: Vec<Mutant>,
}

impl MutantGroup {
    /// Create group
    #[inline]
    #[must_use]
    pub fn new(identifier: impl Into<String>, mutants: Vec<Mutant>) -> Self {
        Self {
            identifier: identifier.into(),
            mutants,
        }
    }

    /// Site identifier, e.g. `Headers/location`
    #[inline]
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Mutants in production order
    #[inline]
    #[must_use]
    pub fn mutants(&self) -> &[Mutant] {
        &self.mutants
    }

    /// Number of mutants
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.mutants.len()
    }

    /// True when the group holds no mutants
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mutants.is_empty()
    }

    /// Consume into the mutant list
    #[inline]
    #[must_use]
    pub fn into_mutants(self) -> Vec<Mutant> {
        self.mutants
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn headers_lookup_ignores_case() {
        let mut headers: Headers = [("Content-Type", "text/html"), ("X-Id", "1")]
            .into_iter()
            .collect();
        assert_eq!(headers.get("content-type"), Some("text/html"));
        assert_eq!(headers.field_name("CONTENT-TYPE"), Some("Content-Type"));

        headers.set("content-type", "application/json");
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec![("Content-Type", "application/json"), ("X-Id", "1")]
        );

        assert_eq!(headers.remove("CONTENT-type").as_deref(), Some("application/json"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn response_round_trips_document_shape() {
        let doc = json!({
            "Status Code": 201,
            "Headers": {"Location": "/items/1", "X-Count": 3},
            "Body": {"id": 1}
        });
        let response = Response::from_value(&doc).unwrap();
        assert_eq!(response.status_code(), 201);
        assert_eq!(response.headers().get("x-count"), Some("3"));
        assert_eq!(
            response.to_value(),
            json!({
                "Status Code": 201,
                "Headers": {"Location": "/items/1", "X-Count": "3"},
                "Body": {"id": 1}
            })
        );
    }

    #[test]
    fn response_defaults_missing_parts() {
        let response = Response::from_value(&json!({"Status Code": 204})).unwrap();
        assert!(response.headers().is_empty());
        assert!(response.body().is_null());
    }

    #[test]
    fn response_rejects_bad_status() {
        assert_eq!(
            Response::from_value(&json!({"Headers": {}})),
            Err(InputError::MissingStatusCode)
        );
        assert!(matches!(
            Response::from_value(&json!({"Status Code": "200"})),
            Err(InputError::InvalidStatusCode(_))
        ));
        assert!(matches!(
            Response::from_value(&json!({"Status Code": 700})),
            Err(InputError::InvalidStatusCode(_))
        ));
        assert_eq!(
            Response::from_value(&json!([1])),
            Err(InputError::NotAnObject("array"))
        );
        assert_eq!(
            Response::from_value(&json!({"Status Code": 200, "Headers": "x"})),
            Err(InputError::InvalidHeaders("string"))
        );
    }

    #[test]
    fn with_helpers_share_untouched_parts() {
        let original = Response::new(200, Headers::new(), json!({"a": 1})).unwrap();
        let mutated = original.with_status_code(404);
        assert!(mutated.shares_headers_with(&original));
        assert!(mutated.shares_body_with(&original));

        let mutated = original.with_body(json!(null));
        assert!(mutated.shares_headers_with(&original));
        assert!(!mutated.shares_body_with(&original));
    }

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(MutatorKind::Charset.config_prefix(), "operator.header.charset");
        assert_eq!(OperatorKind::DisorderElements.config_key(), "disorderElements");
        assert_eq!(OperatorKind::ReplaceWith4xx.to_string(), "ReplaceWith4xx");
        assert_eq!(kind_name(&json!(1.5)), "double");
        assert_eq!(kind_name(&json!(u64::MAX)), "unsigned");
    }
}
