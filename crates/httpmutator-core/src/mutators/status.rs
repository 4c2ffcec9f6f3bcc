//! Status code operators

use super::common::distinct_pool;
use crate::config::{Properties, Section};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{MutatorKind, OperatorKind};
use crate::operator::{Mutator, MutatorBuilder, Operator};
use crate::rng::MutationRng;
use serde_json::Value;

/// Replace the status code with another one from a fixed class pool
#[derive(Debug, Clone)]
pub struct ReplaceStatusOperator {
    kind: OperatorKind,
    pool: Vec<u16>,
}

impl ReplaceStatusOperator {
    /// Create operator over `pool`
    ///
    /// # Errors
    /// Fails unless the pool holds two distinct valid status codes.
    pub fn new(kind: OperatorKind, pool: Vec<u16>) -> ConfigResult<Self> {
        let mut distinct = pool.clone();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() < 2 {
            return Err(ConfigError::invalid(
                kind.config_key(),
                "status pool needs at least two distinct codes",
            ));
        }
        Ok(Self { kind, pool })
    }

    /// Codes this operator draws from
    #[inline]
    #[must_use]
    pub fn pool(&self) -> &[u16] {
        &self.pool
    }

    fn from_section(kind: OperatorKind, section: &Section<'_>) -> ConfigResult<Self> {
        let pool = distinct_pool(section, "values")?
            .iter()
            .map(|raw| {
                raw.parse::<u16>()
                    .ok()
                    .filter(|c| (100..=599).contains(c))
                    .ok_or_else(|| {
                        ConfigError::invalid(section.key("values"), format!("{raw} is not a status code"))
                    })
            })
            .collect::<ConfigResult<Vec<_>>>()?;
        Self::new(kind, pool)
    }
}

impl Operator for ReplaceStatusOperator {
    fn kind(&self) -> OperatorKind {
        self.kind
    }

    fn mutate(&self, value: &Value, rng: &mut MutationRng) -> Value {
        let current = value.as_u64();
        let candidates: Vec<u16> = self
            .pool
            .iter()
            .copied()
            .filter(|c| Some(u64::from(*c)) != current)
            .collect();
        rng.choose(&candidates)
            .map_or_else(|| value.clone(), |code| Value::from(*code))
    }
}

/// Build the status code mutator
///
/// # Errors
/// Fails on missing or malformed `operator.sc.*` keys.
pub fn status_code_mutator(properties: &Properties) -> ConfigResult<Mutator> {
    let mut builder = MutatorBuilder::new(properties, MutatorKind::StatusCode)?;
    for kind in [
        OperatorKind::ReplaceWith2xx,
        OperatorKind::ReplaceWith4xx,
        OperatorKind::ReplaceWith5xx,
    ] {
        builder = builder.operator(kind, |_, op| ReplaceStatusOperator::from_section(kind, op))?;
    }
    Ok(builder.build())
}
