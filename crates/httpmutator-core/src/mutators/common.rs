//! Operators shared by several mutators

use crate::config::Section;
use crate::error::{ConfigError, ConfigResult};
use crate::model::OperatorKind;
use crate::operator::Operator;
use crate::rng::MutationRng;
use serde_json::{json, Value};

/// Replace any value with `null`
#[derive(Debug, Clone, Copy, Default)]
pub struct NullOperator;

impl Operator for NullOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Null
    }

    fn is_applicable(&self, value: &Value) -> bool {
        !value.is_null()
    }

    fn mutate(&self, _value: &Value, _rng: &mut MutationRng) -> Value {
        Value::Null
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetKind {
    Boolean,
    Long,
    Double,
    String,
    Object,
    Array,
}

const TARGETS: [TargetKind; 6] = [
    TargetKind::Boolean,
    TargetKind::Long,
    TargetKind::Double,
    TargetKind::String,
    TargetKind::Object,
    TargetKind::Array,
];

fn target_of(value: &Value) -> Option<TargetKind> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(TargetKind::Boolean),
        Value::Number(n) if n.is_f64() => Some(TargetKind::Double),
        Value::Number(_) => Some(TargetKind::Long),
        Value::String(_) => Some(TargetKind::String),
        Value::Object(_) => Some(TargetKind::Object),
        Value::Array(_) => Some(TargetKind::Array),
    }
}

/// Replace a value with one of a different JSON kind
///
/// The new kind is drawn uniformly from the kinds the value is not.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeTypeOperator;

impl Operator for ChangeTypeOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::ChangeType
    }

    fn mutate(&self, value: &Value, rng: &mut MutationRng) -> Value {
        let current = target_of(value);
        let candidates: Vec<TargetKind> = TARGETS
            .iter()
            .copied()
            .filter(|t| Some(*t) != current)
            .collect();
        let Some(target) = rng.choose(&candidates).copied() else {
            return Value::Null;
        };
        match target {
            TargetKind::Boolean => Value::Bool(rng.coin()),
            TargetKind::Long => json!(rng.long(0, 1000)),
            TargetKind::Double => json!(rng.double(0.0, 1000.0)),
            TargetKind::String => Value::String(match value {
                Value::String(s) => s.clone(),
                Value::Null => rng.alphanumeric(8),
                other => other.to_string(),
            }),
            TargetKind::Object => Value::Object(serde_json::Map::new()),
            TargetKind::Array => match value {
                Value::Null => Value::Array(Vec::new()),
                other => Value::Array(vec![other.clone()]),
            },
        }
    }
}

/// Read a string pool holding at least two distinct entries
///
/// Replacement operators re-draw until the value changes, which needs a
/// second candidate.
pub(crate) fn distinct_pool(section: &Section<'_>, name: &str) -> ConfigResult<Vec<String>> {
    let pool = section.list(name)?;
    let distinct = pool
        .iter()
        .enumerate()
        .filter(|(i, v)| !pool[..*i].contains(v))
        .count();
    if distinct < 2 {
        return Err(ConfigError::invalid(
            section.key(name),
            "needs at least two distinct values",
        ));
    }
    Ok(pool)
}

/// Read a `[min, max]` count range with `min >= 1`
pub(crate) fn positive_range(section: &Section<'_>) -> ConfigResult<(usize, usize)> {
    let (min, max) = section.count_range("min", "max")?;
    if min == 0 {
        return Err(ConfigError::invalid(section.key("min"), "must be at least 1"));
    }
    Ok((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Properties;
    use crate::model::kind_name;

    #[test]
    fn null_operator_skips_null() {
        assert!(!NullOperator.is_applicable(&Value::Null));
        assert!(NullOperator.is_applicable(&json!(0)));
        assert_eq!(
            NullOperator.mutate(&json!("x"), &mut MutationRng::default()),
            Value::Null
        );
    }

    #[test]
    fn change_type_always_changes_kind() {
        let mut rng = MutationRng::new(9);
        for value in [
            json!(true),
            json!(3),
            json!(2.5),
            json!("s"),
            json!({"a": 1}),
            json!([1]),
            Value::Null,
        ] {
            for _ in 0..25 {
                let mutated = ChangeTypeOperator.mutate(&value, &mut rng);
                assert_ne!(kind_name(&mutated), kind_name(&value), "{value} -> {mutated}");
            }
        }
    }

    #[test]
    fn pool_needs_two_distinct_values() {
        let props = Properties::empty()
            .with("p.same", vec!["a", "a"])
            .with("p.ok", vec!["a", "b"]);
        let section = Section::new(&props, "p");
        assert!(distinct_pool(&section, "same").is_err());
        assert_eq!(distinct_pool(&section, "ok").unwrap(), vec!["a", "b"]);
    }
}
