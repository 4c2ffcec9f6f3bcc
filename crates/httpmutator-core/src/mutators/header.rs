//! Header operators: Content-Type media type and charset, Location

use super::common::{distinct_pool, NullOperator};
use crate::config::Properties;
use crate::error::ConfigResult;
use crate::model::{MutatorKind, OperatorKind};
use crate::operator::{Mutator, MutatorBuilder, Operator};
use crate::rng::MutationRng;
use serde_json::Value;
use url::Url;

/// Replace the media type with a different one from the pool
///
/// Candidates equal to the current media type, ignoring case, are skipped.
#[derive(Debug, Clone)]
pub struct MediaTypeReplaceOperator {
    pool: Vec<String>,
}

impl MediaTypeReplaceOperator {
    /// Create operator over `pool`
    #[inline]
    #[must_use]
    pub fn new(pool: Vec<String>) -> Self {
        Self { pool }
    }
}

impl Operator for MediaTypeReplaceOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Replace
    }

    fn is_applicable(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|s| !s.is_empty())
    }

    fn mutate(&self, value: &Value, rng: &mut MutationRng) -> Value {
        let current = value.as_str().unwrap_or_default();
        let candidates: Vec<&String> = self
            .pool
            .iter()
            .filter(|m| !m.eq_ignore_ascii_case(current))
            .collect();
        rng.choose(&candidates)
            .map_or_else(|| value.clone(), |m| Value::String((*m).clone()))
    }
}

/// Replace the charset with a different one from the pool
///
/// Spelling variants (`UTF-8`, `utf8`) count as different values.
#[derive(Debug, Clone)]
pub struct CharsetReplaceOperator {
    pool: Vec<String>,
}

impl CharsetReplaceOperator {
    /// Create operator over `pool`
    #[inline]
    #[must_use]
    pub fn new(pool: Vec<String>) -> Self {
        Self { pool }
    }
}

impl Operator for CharsetReplaceOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Replace
    }

    fn is_applicable(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|s| !s.is_empty())
    }

    fn mutate(&self, value: &Value, rng: &mut MutationRng) -> Value {
        let current = value.as_str().unwrap_or_default();
        let candidates: Vec<&String> = self.pool.iter().filter(|c| *c != current).collect();
        rng.choose(&candidates)
            .map_or_else(|| value.clone(), |c| Value::String((*c).clone()))
    }
}

/// Append a random numeric segment to the Location path
///
/// Scheme, authority, query and fragment are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocationMutateOperator;

impl LocationMutateOperator {
    fn append_segment(location: &str, segment: &str) -> String {
        if let Ok(mut url) = Url::parse(location) {
            if !url.cannot_be_a_base() {
                let path = format!("{}/{segment}", url.path().trim_end_matches('/'));
                url.set_path(&path);
                return url.to_string();
            }
        }
        let split = location.find(['?', '#']).unwrap_or(location.len());
        let (path, rest) = location.split_at(split);
        format!("{}/{segment}{rest}", path.trim_end_matches('/'))
    }
}

impl Operator for LocationMutateOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Mutate
    }

    fn is_applicable(&self, value: &Value) -> bool {
        value.is_string()
    }

    fn mutate(&self, value: &Value, rng: &mut MutationRng) -> Value {
        let location = value.as_str().unwrap_or_default();
        let segment = rng.long(1, 999_999_999).to_string();
        Value::String(Self::append_segment(location, &segment))
    }
}

/// Build the media type mutator
///
/// # Errors
/// Fails on missing or malformed `operator.header.mediaType.*` keys.
pub fn media_type_mutator(properties: &Properties) -> ConfigResult<Mutator> {
    Ok(MutatorBuilder::new(properties, MutatorKind::MediaType)?
        .enabled_if(properties.flag("operator.header.enabled")?)
        .operator(OperatorKind::Replace, |_, op| {
            Ok(MediaTypeReplaceOperator::new(distinct_pool(op, "values")?))
        })?
        .operator(OperatorKind::Null, |_, _| Ok(NullOperator))?
        .build())
}

/// Build the charset mutator
///
/// # Errors
/// Fails on missing or malformed `operator.header.charset.*` keys.
pub fn charset_mutator(properties: &Properties) -> ConfigResult<Mutator> {
    Ok(MutatorBuilder::new(properties, MutatorKind::Charset)?
        .enabled_if(properties.flag("operator.header.enabled")?)
        .operator(OperatorKind::Replace, |_, op| {
            Ok(CharsetReplaceOperator::new(distinct_pool(op, "values")?))
        })?
        .operator(OperatorKind::Null, |_, _| Ok(NullOperator))?
        .build())
}

/// Build the Location mutator
///
/// # Errors
/// Fails on missing or malformed `operator.header.location.*` keys.
pub fn location_mutator(properties: &Properties) -> ConfigResult<Mutator> {
    Ok(MutatorBuilder::new(properties, MutatorKind::Location)?
        .enabled_if(properties.flag("operator.header.enabled")?)
        .operator(OperatorKind::Mutate, |_, _| Ok(LocationMutateOperator))?
        .operator(OperatorKind::Null, |_, _| Ok(NullOperator))?
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pool(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn media_type_replace_ignores_case_when_comparing() {
        let op = MediaTypeReplaceOperator::new(pool(&["application/json", "text/plain"]));
        let mut rng = MutationRng::new(5);
        for _ in 0..20 {
            assert_eq!(op.mutate(&json!("APPLICATION/JSON"), &mut rng), json!("text/plain"));
        }
        assert!(!op.is_applicable(&Value::Null));
    }

    #[test]
    fn charset_replace_treats_spellings_as_distinct() {
        let op = CharsetReplaceOperator::new(pool(&["UTF-8", "utf-8"]));
        let mut rng = MutationRng::new(5);
        assert_eq!(op.mutate(&json!("UTF-8"), &mut rng), json!("utf-8"));
    }

    #[test]
    fn location_keeps_query_and_fragment() {
        assert_eq!(
            LocationMutateOperator::append_segment("https://api.test/items/7?x=1#top", "42"),
            "https://api.test/items/7/42?x=1#top"
        );
        assert_eq!(
            LocationMutateOperator::append_segment("/items/7/?page=2", "42"),
            "/items/7/42?page=2"
        );
        assert_eq!(LocationMutateOperator::append_segment("", "42"), "/42");
    }

    #[test]
    fn location_mutation_is_seeded() {
        let value = json!("/orders/1");
        let a = LocationMutateOperator.mutate(&value, &mut MutationRng::new(11));
        let b = LocationMutateOperator.mutate(&value, &mut MutationRng::new(11));
        assert_eq!(a, b);
        assert_ne!(a, value);
    }

    #[test]
    fn header_master_switch_disables_all_three() {
        let props = Properties::defaults()
            .unwrap()
            .with("operator.header.enabled", false);
        assert!(media_type_mutator(&props).unwrap().is_empty());
        assert!(charset_mutator(&props).unwrap().is_empty());
        assert!(location_mutator(&props).unwrap().is_empty());
    }
}
