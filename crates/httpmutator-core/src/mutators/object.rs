//! Object operators

use super::common::{positive_range, ChangeTypeOperator, NullOperator};
use crate::config::Properties;
use crate::error::ConfigResult;
use crate::model::{MutatorKind, OperatorKind};
use crate::operator::{Mutator, MutatorBuilder, Operator};
use crate::rng::MutationRng;
use serde_json::{Map, Value};

fn properties_of(value: &Value) -> Option<&Map<String, Value>> {
    value.as_object()
}

/// Pick up to `count` distinct keys from `candidates`
fn pick_keys(candidates: &[&String], count: usize, rng: &mut MutationRng) -> Vec<String> {
    let mut pool: Vec<&String> = candidates.to_vec();
    let mut picked = Vec::with_capacity(count.min(pool.len()));
    while picked.len() < count && !pool.is_empty() {
        picked.push(pool.remove(rng.index(pool.len())).clone());
    }
    picked
}

/// Copy of `map` without `removed`, order preserved
fn without(map: &Map<String, Value>, removed: &[String]) -> Value {
    Value::Object(
        map.iter()
            .filter(|(k, _)| !removed.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    )
}

/// Remove between `min` and `max` object-valued properties
#[derive(Debug, Clone, Copy)]
pub struct RemoveObjectElementOperator {
    min: usize,
    max: usize,
}

impl RemoveObjectElementOperator {
    /// Create operator
    #[inline]
    #[must_use]
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
}

impl Operator for RemoveObjectElementOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::RemoveObjectElement
    }

    fn is_applicable(&self, value: &Value) -> bool {
        properties_of(value).is_some_and(|map| map.values().any(Value::is_object))
    }

    fn mutate(&self, value: &Value, rng: &mut MutationRng) -> Value {
        let Some(map) = properties_of(value) else {
            return value.clone();
        };
        let candidates: Vec<&String> = map
            .iter()
            .filter(|(_, v)| v.is_object())
            .map(|(k, _)| k)
            .collect();
        let count = rng.count(self.min, self.max);
        without(map, &pick_keys(&candidates, count, rng))
    }
}

/// Remove between `min` and `max` properties of any kind
#[derive(Debug, Clone, Copy)]
pub struct ObjectRemoveElementOperator {
    min: usize,
    max: usize,
}

impl ObjectRemoveElementOperator {
    /// Create operator
    #[inline]
    #[must_use]
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
}

impl Operator for ObjectRemoveElementOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::RemoveElement
    }

    fn is_applicable(&self, value: &Value) -> bool {
        properties_of(value).is_some_and(|map| !map.is_empty())
    }

    fn mutate(&self, value: &Value, rng: &mut MutationRng) -> Value {
        let Some(map) = properties_of(value) else {
            return value.clone();
        };
        let candidates: Vec<&String> = map.keys().collect();
        let count = rng.count(self.min, self.max);
        without(map, &pick_keys(&candidates, count, rng))
    }
}

/// Add between `min` and `max` new properties
///
/// New values copy random existing ones; an empty object receives strings.
#[derive(Debug, Clone, Copy)]
pub struct ObjectAddElementOperator {
    min: usize,
    max: usize,
}

impl ObjectAddElementOperator {
    /// Create operator
    #[inline]
    #[must_use]
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
}

impl Operator for ObjectAddElementOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::AddElement
    }

    fn mutate(&self, value: &Value, rng: &mut MutationRng) -> Value {
        let mut map = properties_of(value).cloned().unwrap_or_default();
        let existing: Vec<Value> = map.values().cloned().collect();
        let add = rng.count(self.min, self.max);
        let mut added = 0;
        while added < add {
            let key = format!("hm_{}", rng.alphanumeric(6));
            if map.contains_key(&key) {
                continue;
            }
            let element = rng
                .choose(&existing)
                .cloned()
                .unwrap_or_else(|| Value::String(rng.alphanumeric(8)));
            map.insert(key, element);
            added += 1;
        }
        Value::Object(map)
    }
}

/// Remove every property
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectEmptyOperator;

impl Operator for ObjectEmptyOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Empty
    }

    fn is_applicable(&self, value: &Value) -> bool {
        properties_of(value).is_some_and(|map| !map.is_empty())
    }

    fn mutate(&self, _value: &Value, _rng: &mut MutationRng) -> Value {
        Value::Object(Map::new())
    }
}

/// Build the object mutator
///
/// # Errors
/// Fails on missing or malformed `operator.object.*` keys.
pub fn object_mutator(properties: &Properties) -> ConfigResult<Mutator> {
    Ok(MutatorBuilder::new(properties, MutatorKind::Object)?
        .operator(OperatorKind::RemoveObjectElement, |_, op| {
            let (min, max) = positive_range(op)?;
            Ok(RemoveObjectElementOperator::new(min, max))
        })?
        .operator(OperatorKind::RemoveElement, |_, op| {
            let (min, max) = positive_range(op)?;
            Ok(ObjectRemoveElementOperator::new(min, max))
        })?
        .operator(OperatorKind::AddElement, |_, op| {
            let (min, max) = positive_range(op)?;
            Ok(ObjectAddElementOperator::new(min, max))
        })?
        .operator(OperatorKind::Empty, |_, _| Ok(ObjectEmptyOperator))?
        .operator(OperatorKind::Null, |_, _| Ok(NullOperator))?
        .operator(OperatorKind::ChangeType, |_, _| Ok(ChangeTypeOperator))?
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn remove_object_element_only_touches_objects() {
        let op = RemoveObjectElementOperator::new(1, 1);
        let value = json!({"id": 1, "owner": {"name": "x"}, "tags": ["a"]});
        assert!(op.is_applicable(&value));
        assert!(!op.is_applicable(&json!({"id": 1})));

        let mutated = op.mutate(&value, &mut MutationRng::new(1));
        assert_eq!(mutated, json!({"id": 1, "tags": ["a"]}));
    }

    #[test]
    fn remove_object_element_removes_several() {
        let op = RemoveObjectElementOperator::new(2, 2);
        let value = json!({"a": {}, "b": 1, "c": {}, "d": {}});
        let mutated = op.mutate(&value, &mut MutationRng::new(6));
        let map = mutated.as_object().unwrap();
        assert_eq!(map.len(), 2);
        assert!(map.contains_key("b"));
    }

    #[test]
    fn remove_element_keeps_key_order() {
        let op = ObjectRemoveElementOperator::new(1, 1);
        let value = json!({"a": 1, "b": 2, "c": 3});
        let mutated = op.mutate(&value, &mut MutationRng::new(2));
        let keys: Vec<_> = mutated.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 2);
        let order: Vec<_> = ["a", "b", "c"]
            .iter()
            .filter(|k| keys.iter().any(|x| x == *k))
            .map(|k| (*k).to_string())
            .collect();
        assert_eq!(keys, order);
    }

    #[test]
    fn add_element_grows_object() {
        let op = ObjectAddElementOperator::new(2, 2);
        let mutated = op.mutate(&json!({"a": 1}), &mut MutationRng::new(2));
        let map = mutated.as_object().unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.get("a"), Some(&json!(1)));
        assert!(map
            .iter()
            .filter(|(k, _)| k.as_str() != "a")
            .all(|(_, v)| *v == json!(1)));
    }

    #[test]
    fn empty_object_is_not_emptied_again() {
        assert!(!ObjectEmptyOperator.is_applicable(&json!({})));
        assert!(ObjectEmptyOperator.is_applicable(&json!({"a": null})));
    }

    #[test]
    fn default_operator_order() {
        let mutator = object_mutator(&Properties::defaults().unwrap()).unwrap();
        let kinds: Vec<_> = mutator.operators().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                OperatorKind::RemoveObjectElement,
                OperatorKind::RemoveElement,
                OperatorKind::AddElement,
                OperatorKind::Empty,
                OperatorKind::Null,
                OperatorKind::ChangeType,
            ]
        );
    }
}
