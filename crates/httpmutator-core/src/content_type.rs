//! Content-Type decomposition
//!
//! A header value is split on `;` into a media type, a charset and the
//! remaining `key=value` parameters. Rebuilding keeps parameter order, so
//! changing one component never disturbs the others.

use indexmap::IndexMap;
use std::fmt;

const TOP_LEVEL_TYPES: [&str; 8] = [
    "application",
    "audio",
    "image",
    "message",
    "model",
    "multipart",
    "text",
    "video",
];

const CHARSET_PREFIX: &str = "charset=";

/// Parts of a Content-Type header value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypeComponents {
    /// Media type, e.g. `text/html`
    pub media_type: Option<String>,
    /// Charset parameter value, e.g. `UTF-8`
    pub charset: Option<String>,
    /// Every other `key=value` parameter, in encounter order
    pub params: IndexMap<String, String>,
}

impl ContentTypeComponents {
    /// Split a header value
    ///
    /// A segment counts as the media type only when it starts with a known
    /// top-level type. Segments without `=` that are not a media type are
    /// dropped.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let mut components = Self::default();
        for segment in value.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            if is_charset(segment) {
                components.charset = Some(segment[CHARSET_PREFIX.len()..].trim().to_string());
            } else if let Some((key, val)) = segment.split_once('=') {
                components
                    .params
                    .insert(key.trim().to_string(), val.trim().to_string());
            } else if components.media_type.is_none() && is_media_type(segment) {
                components.media_type = Some(segment.to_string());
            }
        }
        components
    }

    /// Same components with another media type
    #[must_use]
    pub fn with_media_type(&self, media_type: Option<String>) -> Self {
        Self {
            media_type,
            ..self.clone()
        }
    }

    /// Same components with another charset
    #[must_use]
    pub fn with_charset(&self, charset: Option<String>) -> Self {
        Self {
            charset,
            ..self.clone()
        }
    }

    /// True when nothing is left to render
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.media_type.is_none() && self.charset.is_none() && self.params.is_empty()
    }
}

impl fmt::Display for ContentTypeComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(self.params.len() + 2);
        if let Some(media_type) = &self.media_type {
            parts.push(media_type.clone());
        }
        if let Some(charset) = &self.charset {
            parts.push(format!("{CHARSET_PREFIX}{charset}"));
        }
        parts.extend(self.params.iter().map(|(k, v)| format!("{k}={v}")));
        f.write_str(&parts.join("; "))
    }
}

fn is_charset(segment: &str) -> bool {
    segment
        .get(..CHARSET_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(CHARSET_PREFIX))
}

fn is_media_type(segment: &str) -> bool {
    let lower = segment.to_ascii_lowercase();
    TOP_LEVEL_TYPES.iter().any(|t| lower.starts_with(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_media_type_charset_and_params() {
        let original = "text/html; charset=UTF-8; version=2";
        let components = ContentTypeComponents::parse(original);
        assert_eq!(components.media_type.as_deref(), Some("text/html"));
        assert_eq!(components.charset.as_deref(), Some("UTF-8"));
        assert_eq!(components.params.get("version").map(String::as_str), Some("2"));
        assert_eq!(components.to_string(), original);
    }

    #[test]
    fn charset_prefix_is_case_insensitive() {
        let components = ContentTypeComponents::parse("application/json;CHARSET=utf-8");
        assert_eq!(components.charset.as_deref(), Some("utf-8"));
        assert_eq!(components.to_string(), "application/json; charset=utf-8");
    }

    #[test]
    fn unknown_top_level_type_is_not_a_media_type() {
        let components = ContentTypeComponents::parse("foo/bar; charset=utf8");
        assert!(components.media_type.is_none());
        assert_eq!(components.to_string(), "charset=utf8");
    }

    #[test]
    fn replacing_one_component_keeps_param_order() {
        let components = ContentTypeComponents::parse("multipart/form-data; boundary=x; a=1");
        let rebuilt = components.with_charset(Some("UTF-16".into()));
        assert_eq!(
            rebuilt.to_string(),
            "multipart/form-data; charset=UTF-16; boundary=x; a=1"
        );
        let rebuilt = components.with_media_type(None);
        assert_eq!(rebuilt.to_string(), "boundary=x; a=1");
    }

    #[test]
    fn empty_value_has_no_components() {
        assert!(ContentTypeComponents::parse("").is_empty());
        assert!(ContentTypeComponents::parse(" ; ").is_empty());
    }
}
