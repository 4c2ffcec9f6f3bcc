//! Array operators

use super::common::{positive_range, ChangeTypeOperator, NullOperator};
use crate::config::Properties;
use crate::error::ConfigResult;
use crate::model::{MutatorKind, OperatorKind};
use crate::operator::{Mutator, MutatorBuilder, Operator};
use crate::rng::MutationRng;
use serde_json::Value;

fn elements(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items,
        _ => &[],
    }
}

/// Remove between `min` and `max` elements at random indices
///
/// Only applicable to arrays longer than `max`, so at least one element
/// always survives.
#[derive(Debug, Clone, Copy)]
pub struct ArrayRemoveElementOperator {
    min: usize,
    max: usize,
}

impl ArrayRemoveElementOperator {
    /// Create operator
    #[inline]
    #[must_use]
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
}

impl Operator for ArrayRemoveElementOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::RemoveElement
    }

    fn is_applicable(&self, value: &Value) -> bool {
        elements(value).len() > self.max
    }

    fn mutate(&self, value: &Value, rng: &mut MutationRng) -> Value {
        let mut items = elements(value).to_vec();
        let remove = rng.count(self.min, self.max).min(items.len());
        for _ in 0..remove {
            items.remove(rng.index(items.len()));
        }
        Value::Array(items)
    }
}

/// Remove every element
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayEmptyOperator;

impl Operator for ArrayEmptyOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Empty
    }

    fn is_applicable(&self, value: &Value) -> bool {
        !elements(value).is_empty()
    }

    fn mutate(&self, _value: &Value, _rng: &mut MutationRng) -> Value {
        Value::Array(Vec::new())
    }
}

/// Append between `min` and `max` copies of random existing elements
///
/// An empty array receives random strings instead.
#[derive(Debug, Clone, Copy)]
pub struct ArrayAddElementOperator {
    min: usize,
    max: usize,
}

impl ArrayAddElementOperator {
    /// Create operator
    #[inline]
    #[must_use]
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
}

impl Operator for ArrayAddElementOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::AddElement
    }

    fn mutate(&self, value: &Value, rng: &mut MutationRng) -> Value {
        let mut items = elements(value).to_vec();
        let add = rng.count(self.min, self.max);
        for _ in 0..add {
            let element = if items.is_empty() {
                Value::String(rng.alphanumeric(8))
            } else {
                items[rng.index(items.len())].clone()
            };
            items.push(element);
        }
        Value::Array(items)
    }
}

/// Move one element to a different index
#[derive(Debug, Clone, Copy, Default)]
pub struct DisorderElementsOperator;

impl Operator for DisorderElementsOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::DisorderElements
    }

    fn is_applicable(&self, value: &Value) -> bool {
        elements(value).len() > 1
    }

    fn mutate(&self, value: &Value, rng: &mut MutationRng) -> Value {
        let mut items = elements(value).to_vec();
        if items.len() < 2 {
            return Value::Array(items);
        }
        let from = rng.index(items.len());
        let mut to = rng.index(items.len() - 1);
        if to >= from {
            to += 1;
        }
        let element = items.remove(from);
        items.insert(to, element);
        Value::Array(items)
    }
}

/// Build the array mutator
///
/// Nested arrays use [`Mutator::effective_operators`] with
/// [`FIRST_LEVEL_ONLY`](crate::operator::FIRST_LEVEL_ONLY) excluded.
///
/// # Errors
/// Fails on missing or malformed `operator.array.*` keys.
pub fn array_mutator(properties: &Properties) -> ConfigResult<Mutator> {
    Ok(MutatorBuilder::new(properties, MutatorKind::Array)?
        .operator(OperatorKind::RemoveElement, |_, op| {
            let (min, max) = positive_range(op)?;
            Ok(ArrayRemoveElementOperator::new(min, max))
        })?
        .operator(OperatorKind::Empty, |_, _| Ok(ArrayEmptyOperator))?
        .operator(OperatorKind::AddElement, |_, op| {
            let (min, max) = positive_range(op)?;
            Ok(ArrayAddElementOperator::new(min, max))
        })?
        .operator(OperatorKind::DisorderElements, |_, _| Ok(DisorderElementsOperator))?
        .operator(OperatorKind::Null, |_, _| Ok(NullOperator))?
        .operator(OperatorKind::ChangeType, |_, _| Ok(ChangeTypeOperator))?
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn remove_element_needs_more_than_max() {
        let op = ArrayRemoveElementOperator::new(1, 2);
        assert!(!op.is_applicable(&json!([1, 2])));
        assert!(op.is_applicable(&json!([1, 2, 3])));
        assert!(!op.is_applicable(&json!({"a": 1})));
    }

    #[test]
    fn empty_and_disorder_applicability() {
        assert!(!ArrayEmptyOperator.is_applicable(&json!([])));
        assert!(ArrayEmptyOperator.is_applicable(&json!([0])));
        assert!(!DisorderElementsOperator.is_applicable(&json!([1])));
        assert!(DisorderElementsOperator.is_applicable(&json!([1, 2])));
    }

    #[test]
    fn add_element_to_empty_array_uses_strings() {
        let op = ArrayAddElementOperator::new(2, 2);
        let mutated = op.mutate(&json!([]), &mut MutationRng::new(3));
        let items = mutated.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(Value::is_string));
    }

    #[test]
    fn disorder_two_elements_swaps_them() {
        let mutated = DisorderElementsOperator.mutate(&json!(["a", "b"]), &mut MutationRng::new(0));
        assert_eq!(mutated, json!(["b", "a"]));
    }

    proptest! {
        #[test]
        fn remove_element_keeps_survivors_in_order(seed in any::<u64>(), len in 3_usize..20) {
            let original: Vec<usize> = (0..len).collect();
            let op = ArrayRemoveElementOperator::new(1, 2);
            let mutated = op.mutate(&json!(original), &mut MutationRng::new(seed));
            let kept: Vec<usize> = serde_json::from_value(mutated).unwrap();
            prop_assert!(kept.len() == len - 1 || kept.len() == len - 2);
            prop_assert!(kept.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn disorder_keeps_the_same_elements(seed in any::<u64>(), len in 2_usize..20) {
            let original: Vec<usize> = (0..len).collect();
            let mutated = DisorderElementsOperator.mutate(&json!(original), &mut MutationRng::new(seed));
            let mut moved: Vec<usize> = serde_json::from_value(mutated).unwrap();
            prop_assert_ne!(&moved, &original);
            moved.sort_unstable();
            prop_assert_eq!(moved, original);
        }
    }
}
