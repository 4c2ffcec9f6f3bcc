//! Request/response pairs as read from input files

use httpmutator_core::{Headers, Response};
use serde::Serialize;

/// HTTP request that produced a response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    /// Method, upper case as recorded
    pub method: String,
    /// Full request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Request body text, if any
    pub body: Option<String>,
}

impl Request {
    /// Create bodyless request
    #[inline]
    #[must_use]
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Headers::new(),
            body: None,
        }
    }
}

/// One exchange: optional request, the response, and an identifier
#[derive(Debug, Clone, PartialEq)]
pub struct HttpExchange {
    request: Option<Request>,
    response: Response,
    id: String,
}

impl HttpExchange {
    /// Create exchange; an empty `id` is replaced by a generated one
    #[must_use]
    pub fn new(request: Option<Request>, response: Response, id: impl Into<String>) -> Self {
        let id = id.into();
        let id = if id.trim().is_empty() {
            generated_id()
        } else {
            id
        };
        Self {
            request,
            response,
            id,
        }
    }

    /// Exchange without a request
    #[inline]
    #[must_use]
    pub fn response_only(response: Response, id: impl Into<String>) -> Self {
        Self::new(None, response, id)
    }

    /// Recorded request
    #[inline]
    #[must_use]
    pub fn request(&self) -> Option<&Request> {
        self.request.as_ref()
    }

    /// Recorded response
    #[inline]
    #[must_use]
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

fn generated_id() -> String {
    format!("ex-{}", uuid::Uuid::new_v4())
}
