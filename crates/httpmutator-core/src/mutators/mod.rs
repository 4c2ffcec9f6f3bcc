//! Concrete operators and the configured mutator set
//!
//! Each submodule holds the operators for one part of a response and a
//! `*_mutator(&Properties)` constructor. [`MutatorSet`] builds all of them at
//! once and routes body values to the mutator of their JSON kind.

pub mod array;
pub mod common;
pub mod header;
pub mod object;
pub mod status;
pub mod value;

use crate::config::Properties;
use crate::error::ConfigResult;
use crate::operator::Mutator;
use serde_json::Value;

/// Every mutator the engine uses, built from one property set
#[derive(Debug)]
pub struct MutatorSet {
    /// Status code
    pub status_code: Mutator,
    /// Content-Type media type
    pub media_type: Mutator,
    /// Content-Type charset
    pub charset: Mutator,
    /// Location header
    pub location: Mutator,
    /// JSON objects
    pub object: Mutator,
    /// JSON arrays
    pub array: Mutator,
    /// Integers
    pub long: Mutator,
    /// Floats
    pub double: Mutator,
    /// Strings
    pub string: Mutator,
    /// Booleans
    pub boolean: Mutator,
    /// Nulls
    pub null: Mutator,
    /// Whether body mutation runs at all
    pub body_enabled: bool,
    /// Whether nested body values get their own groups
    pub recursive: bool,
}

impl MutatorSet {
    /// Build every mutator
    ///
    /// # Errors
    /// Fails on the first missing or malformed key.
    pub fn from_properties(properties: &Properties) -> ConfigResult<Self> {
        Ok(Self {
            status_code: status::status_code_mutator(properties)?,
            media_type: header::media_type_mutator(properties)?,
            charset: header::charset_mutator(properties)?,
            location: header::location_mutator(properties)?,
            object: object::object_mutator(properties)?,
            array: array::array_mutator(properties)?,
            long: value::long_mutator(properties)?,
            double: value::double_mutator(properties)?,
            string: value::string_mutator(properties)?,
            boolean: value::boolean_mutator(properties)?,
            null: value::null_mutator(properties)?,
            body_enabled: properties.flag("operator.body.enabled")?,
            recursive: properties.flag("operator.body.recursive")?,
        })
    }

    /// Mutator for a body value, or `None` for an unsupported number
    ///
    /// Numbers that fit neither `i64` nor `f64` (large unsigned integers)
    /// have no mutator.
    #[must_use]
    pub fn for_value(&self, value: &Value) -> Option<&Mutator> {
        match value {
            Value::Null => Some(&self.null),
            Value::Bool(_) => Some(&self.boolean),
            Value::Number(n) if n.is_i64() => Some(&self.long),
            Value::Number(n) if n.is_f64() => Some(&self.double),
            Value::Number(_) => None,
            Value::String(_) => Some(&self.string),
            Value::Array(_) => Some(&self.array),
            Value::Object(_) => Some(&self.object),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MutatorKind;
    use serde_json::json;

    #[test]
    fn routes_values_by_kind() {
        let set = MutatorSet::from_properties(&Properties::defaults().unwrap()).unwrap();
        let kind = |v: Value| set.for_value(&v).map(Mutator::kind);
        assert_eq!(kind(json!(1)), Some(MutatorKind::Long));
        assert_eq!(kind(json!(-1)), Some(MutatorKind::Long));
        assert_eq!(kind(json!(1.5)), Some(MutatorKind::Double));
        assert_eq!(kind(json!("s")), Some(MutatorKind::String));
        assert_eq!(kind(json!(false)), Some(MutatorKind::Boolean));
        assert_eq!(kind(Value::Null), Some(MutatorKind::Null));
        assert_eq!(kind(json!([])), Some(MutatorKind::Array));
        assert_eq!(kind(json!({})), Some(MutatorKind::Object));
        assert_eq!(kind(json!(u64::MAX)), None);
    }
}
