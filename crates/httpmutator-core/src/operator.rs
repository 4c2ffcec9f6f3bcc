//! Operator trait and the mutator container
//!
//! An [`Operator`] is one atomic, pure mutation of a JSON value. A
//! [`Mutator`] is the ordered set of operators enabled for one value kind.
//!
//! # Core Concepts
//!
//! - Disabled operators are simply never registered, so "absent" and
//!   "inapplicable" are the same skip condition for the engine.
//! - Mutators never change after construction. Per-call narrowing (header
//!   operators whose target is missing, nested containers) goes through
//!   [`Mutator::effective_operators`], a borrowed view.

use crate::config::{Properties, Section};
use crate::error::ConfigResult;
use crate::model::{MutatorKind, OperatorKind};
use crate::rng::MutationRng;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;

/// Atomic mutation of one value
pub trait Operator: Send + Sync + fmt::Debug {
    /// Which operator this is
    fn kind(&self) -> OperatorKind;

    /// Whether this operator can produce a meaningful mutant of `value`
    fn is_applicable(&self, _value: &Value) -> bool {
        true
    }

    /// Produce a mutated copy of `value`
    ///
    /// Must not depend on anything but `value`, the operator's own settings
    /// and `rng`.
    fn mutate(&self, value: &Value, rng: &mut MutationRng) -> Value;
}

/// Registered operator with its configured weight
#[derive(Debug)]
pub struct OperatorEntry {
    operator: Box<dyn Operator>,
    weight: f32,
}

impl OperatorEntry {
    /// Operator kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> OperatorKind {
        self.operator.kind()
    }

    /// Configured weight; metadata only, generation ignores it
    #[inline]
    #[must_use]
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// The operator itself
    #[inline]
    #[must_use]
    pub fn operator(&self) -> &dyn Operator {
        self.operator.as_ref()
    }
}

/// Ordered operators for one value kind
#[derive(Debug)]
pub struct Mutator {
    kind: MutatorKind,
    prob: f64,
    operators: IndexMap<OperatorKind, OperatorEntry>,
}

impl Mutator {
    /// Create mutator with no operators
    #[inline]
    #[must_use]
    pub fn new(kind: MutatorKind) -> Self {
        Self {
            kind,
            prob: 1.0,
            operators: IndexMap::new(),
        }
    }

    /// Set the probability gate threshold
    #[inline]
    #[must_use]
    pub fn with_prob(mut self, prob: f64) -> Self {
        self.prob = prob;
        self
    }

    /// Register an operator, replacing one of the same kind
    pub fn insert(&mut self, operator: impl Operator + 'static, weight: f32) {
        let kind = operator.kind();
        self.operators.insert(
            kind,
            OperatorEntry {
                operator: Box::new(operator),
                weight,
            },
        );
    }

    /// Mutator kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> MutatorKind {
        self.kind
    }

    /// Probability that a candidate mutation goes ahead
    #[inline]
    #[must_use]
    pub fn prob(&self) -> f64 {
        self.prob
    }

    /// True when no operator is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// Look up one operator
    #[inline]
    #[must_use]
    pub fn get(&self, kind: OperatorKind) -> Option<&OperatorEntry> {
        self.operators.get(&kind)
    }

    /// All registered operators, in registration order
    pub fn operators(&self) -> impl Iterator<Item = &OperatorEntry> {
        self.operators.values()
    }

    /// Registered operators minus `excluded`, in registration order
    pub fn effective_operators<'a>(
        &'a self,
        excluded: &'a [OperatorKind],
    ) -> impl Iterator<Item = &'a OperatorEntry> + 'a {
        self.operators
            .values()
            .filter(move |entry| !excluded.contains(&entry.kind()))
    }
}

/// Operators a container drops when it is mutated below the body root
pub const FIRST_LEVEL_ONLY: [OperatorKind; 2] = [OperatorKind::Null, OperatorKind::ChangeType];

/// Builds a [`Mutator`] from its configuration section
///
/// Operators whose `<prefix>.<op>.enabled` flag is false are skipped without
/// running their constructor. A disabled mutator builds empty.
#[derive(Debug)]
pub struct MutatorBuilder<'a> {
    section: Section<'a>,
    enabled: bool,
    mutator: Mutator,
}

impl<'a> MutatorBuilder<'a> {
    /// Start building the mutator of `kind`
    ///
    /// # Errors
    /// Fails when `enabled` or a present `prob` key is malformed.
    pub fn new(properties: &'a Properties, kind: MutatorKind) -> ConfigResult<Self> {
        let section = Section::new(properties, kind.config_prefix());
        let enabled = section.flag("enabled")?;
        let prob = section.float_or("prob", 1.0)?;
        Ok(Self {
            section,
            enabled,
            mutator: Mutator::new(kind).with_prob(prob),
        })
    }

    /// Treat the mutator as disabled when `condition` is false
    #[must_use]
    pub fn enabled_if(mut self, condition: bool) -> Self {
        self.enabled &= condition;
        self
    }

    /// Configuration section of the mutator
    #[inline]
    #[must_use]
    pub fn section(&self) -> &Section<'a> {
        &self.section
    }

    /// Register an operator if it is enabled
    ///
    /// `build` receives the operator's own section (`<prefix>.<op>`).
    ///
    /// # Errors
    /// Fails when the operator's keys are missing or malformed.
    pub fn operator<O, F>(mut self, kind: OperatorKind, build: F) -> ConfigResult<Self>
    where
        O: Operator + 'static,
        F: FnOnce(&Section<'a>, &Section<'a>) -> ConfigResult<O>,
    {
        if !self.enabled {
            return Ok(self);
        }
        let op_section = self.section.child(kind.config_key());
        if !op_section.flag("enabled")? {
            return Ok(self);
        }
        #[allow(clippy::cast_possible_truncation)]
        let weight = op_section.float("weight")? as f32;
        let operator = build(&self.section, &op_section)?;
        self.mutator.insert(operator, weight);
        Ok(self)
    }

    /// Finish building
    #[inline]
    #[must_use]
    pub fn build(self) -> Mutator {
        self.mutator
    }
}
