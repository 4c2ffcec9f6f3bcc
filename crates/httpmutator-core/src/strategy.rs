//! Mutant selection strategies
//!
//! A [`MutationStrategy`] decides which mutants of a group travel downstream.
//! Strategies only read the group; they never change it.

use crate::model::{Mutant, MutantGroup};
use crate::rng::MutationRng;
use std::fmt;
use std::str::FromStr;

/// Policy selecting mutants from one group
pub trait MutationStrategy: Send + fmt::Debug {
    /// Mutants to keep, in group order where more than one is kept
    fn select_mutants(&mut self, group: &MutantGroup) -> Vec<Mutant>;

    /// Strategy name (for logging and reports)
    fn name(&self) -> &'static str;
}

/// Keep every mutant
#[derive(Debug, Clone, Copy, Default)]
pub struct AllOperatorsStrategy;

impl MutationStrategy for AllOperatorsStrategy {
    fn select_mutants(&mut self, group: &MutantGroup) -> Vec<Mutant> {
        group.mutants().to_vec()
    }

    fn name(&self) -> &'static str {
        "all"
    }
}

/// Keep one mutant per group, chosen uniformly
#[derive(Debug, Clone)]
pub struct RandomSingleStrategy {
    rng: MutationRng,
}

impl RandomSingleStrategy {
    /// Create strategy with its own seeded generator
    #[inline]
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: MutationRng::new(seed),
        }
    }
}

impl MutationStrategy for RandomSingleStrategy {
    fn select_mutants(&mut self, group: &MutantGroup) -> Vec<Mutant> {
        self.rng
            .choose(group.mutants())
            .cloned()
            .into_iter()
            .collect()
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// Keep one mutant per group, chosen in proportion to operator weight
///
/// Falls back to a uniform pick when no mutant has a positive weight.
#[derive(Debug, Clone)]
pub struct WeightedRandomStrategy {
    rng: MutationRng,
}

impl WeightedRandomStrategy {
    /// Create strategy with its own seeded generator
    #[inline]
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: MutationRng::new(seed),
        }
    }
}

impl MutationStrategy for WeightedRandomStrategy {
    fn select_mutants(&mut self, group: &MutantGroup) -> Vec<Mutant> {
        let mutants = group.mutants();
        let weight = |m: &Mutant| f64::from(m.weight().max(0.0));
        let total: f64 = mutants.iter().map(weight).sum();
        if total <= 0.0 {
            return self.rng.choose(mutants).cloned().into_iter().collect();
        }
        let mut target = self.rng.unit() * total;
        for mutant in mutants {
            let w = weight(mutant);
            if w > 0.0 && target < w {
                return vec![mutant.clone()];
            }
            target -= w;
        }
        // rounding left `target` past the last bucket
        mutants
            .iter()
            .rev()
            .find(|m| weight(*m) > 0.0)
            .cloned()
            .into_iter()
            .collect()
    }

    fn name(&self) -> &'static str {
        "weighted"
    }
}

/// Strategy selector used by configuration and the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyName {
    /// [`AllOperatorsStrategy`]; also spelled `exhaustive`
    All,
    /// [`RandomSingleStrategy`] (default)
    #[default]
    Random,
    /// [`WeightedRandomStrategy`]
    Weighted,
}

impl StrategyName {
    /// Every accepted spelling
    pub const NAMES: [&'static str; 4] = ["all", "exhaustive", "random", "weighted"];

    /// Build the strategy; `seed` feeds the random ones
    #[must_use]
    pub fn build(self, seed: u64) -> Box<dyn MutationStrategy> {
        match self {
            Self::All => Box::new(AllOperatorsStrategy),
            Self::Random => Box::new(RandomSingleStrategy::new(seed)),
            Self::Weighted => Box::new(WeightedRandomStrategy::new(seed)),
        }
    }
}

impl FromStr for StrategyName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" | "exhaustive" => Ok(Self::All),
            "random" => Ok(Self::Random),
            "weighted" => Ok(Self::Weighted),
            other => Err(format!(
                "unknown strategy '{other}', expected one of: {}",
                Self::NAMES.join(", ")
            )),
        }
    }
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Random => "random",
            Self::Weighted => "weighted",
        })
    }
}
