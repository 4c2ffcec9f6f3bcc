//! Scalar operators: long, double, string, boolean and null values

use super::common::{distinct_pool, ChangeTypeOperator, NullOperator};
use crate::config::{Properties, Section};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{MutatorKind, OperatorKind};
use crate::operator::{Mutator, MutatorBuilder, Operator};
use crate::rng::MutationRng;
use serde_json::{json, Value};

/// Replace an integer with a uniform draw from `[min, max]`
#[derive(Debug, Clone, Copy)]
pub struct LongReplaceOperator {
    min: i64,
    max: i64,
}

impl LongReplaceOperator {
    /// Create operator; `min <= max` is checked by the builder
    #[inline]
    #[must_use]
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

impl Operator for LongReplaceOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Replace
    }

    fn mutate(&self, value: &Value, rng: &mut MutationRng) -> Value {
        let drawn = rng.long(self.min, self.max);
        // step off the original so the mutant differs whenever the range allows it
        let drawn = match value.as_i64() {
            Some(current) if current == drawn && self.min < self.max => {
                if drawn == self.max {
                    self.min
                } else {
                    drawn + 1
                }
            }
            _ => drawn,
        };
        json!(drawn)
    }
}

/// Add or subtract a fixed delta
#[derive(Debug, Clone, Copy)]
pub struct LongMutateOperator {
    delta: i64,
}

impl LongMutateOperator {
    /// Create operator
    #[inline]
    #[must_use]
    pub fn new(delta: i64) -> Self {
        Self { delta }
    }
}

impl Operator for LongMutateOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Mutate
    }

    fn mutate(&self, value: &Value, rng: &mut MutationRng) -> Value {
        let current = value.as_i64().unwrap_or_default();
        if rng.coin() {
            json!(current.saturating_add(self.delta))
        } else {
            json!(current.saturating_sub(self.delta))
        }
    }
}

/// Replace a float with a uniform draw from `[min, max)`
#[derive(Debug, Clone, Copy)]
pub struct DoubleReplaceOperator {
    min: f64,
    max: f64,
}

impl DoubleReplaceOperator {
    /// Create operator
    #[inline]
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

impl Operator for DoubleReplaceOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Replace
    }

    fn mutate(&self, _value: &Value, rng: &mut MutationRng) -> Value {
        json!(rng.double(self.min, self.max))
    }
}

/// Add or subtract a fixed delta
#[derive(Debug, Clone, Copy)]
pub struct DoubleMutateOperator {
    delta: f64,
}

impl DoubleMutateOperator {
    /// Create operator
    #[inline]
    #[must_use]
    pub fn new(delta: f64) -> Self {
        Self { delta }
    }
}

impl Operator for DoubleMutateOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Mutate
    }

    fn mutate(&self, value: &Value, rng: &mut MutationRng) -> Value {
        let current = value.as_f64().unwrap_or_default();
        let delta = if rng.coin() { self.delta } else { -self.delta };
        json!(saturating_sum(current, delta))
    }
}

/// `current + delta`, clamped to the finite range
fn saturating_sum(current: f64, delta: f64) -> f64 {
    let sum = current + delta;
    if sum.is_finite() {
        sum
    } else if sum > 0.0 {
        f64::MAX
    } else {
        f64::MIN
    }
}

/// Character classes for generated strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alphabet {
    /// Any printable ASCII character
    PrintableAscii,
    /// Letters and digits
    Alphanumeric,
    /// Letters only
    Letters,
    /// Digits only
    Digits,
}

impl Alphabet {
    /// Pick the alphabet from the string mutator flags
    #[must_use]
    pub fn from_flags(ascii: bool, letters: bool, numbers: bool) -> Self {
        match (ascii, letters, numbers) {
            (true, _, _) | (false, false, false) => Self::PrintableAscii,
            (false, true, true) => Self::Alphanumeric,
            (false, true, false) => Self::Letters,
            (false, false, true) => Self::Digits,
        }
    }

    /// Character from this alphabet other than `current`
    ///
    /// `first` is the draw already made. Collisions are redrawn a bounded
    /// number of times, then the next character of the class is used.
    pub fn redraw(self, current: char, first: char, rng: &mut MutationRng) -> char {
        let mut drawn = first;
        for _ in 0..8 {
            if drawn != current {
                return drawn;
            }
            drawn = self.generate(1, rng).chars().next().unwrap_or(current);
        }
        self.successor(current)
    }

    fn successor(self, current: char) -> char {
        let next = char::from_u32(u32::from(current) + 1).unwrap_or(' ');
        let letter = ('a'..'z').contains(&current) || ('A'..'Z').contains(&current);
        match self {
            Self::PrintableAscii if (' '..'~').contains(&current) => next,
            Self::PrintableAscii => ' ',
            Self::Digits if ('0'..'9').contains(&current) => next,
            Self::Digits => '0',
            Self::Alphanumeric if ('0'..'9').contains(&current) => next,
            Self::Letters | Self::Alphanumeric if letter => next,
            Self::Letters | Self::Alphanumeric if current == 'z' => 'A',
            Self::Letters | Self::Alphanumeric => 'a',
        }
    }

    /// Random string of exactly `len` characters
    pub fn generate(self, len: usize, rng: &mut MutationRng) -> String {
        match self {
            Self::PrintableAscii => rng.printable_ascii(len),
            Self::Alphanumeric => rng.alphanumeric(len),
            Self::Letters => rng.letters(len),
            Self::Digits => rng.digits(len),
        }
    }
}

/// Settings shared by the string operators
#[derive(Debug, Clone)]
pub struct StringSettings {
    /// Shortest generated string
    pub min_length: usize,
    /// Longest generated string
    pub max_length: usize,
    /// Characters used for generated strings
    pub alphabet: Alphabet,
}

impl StringSettings {
    fn from_section(section: &Section<'_>) -> ConfigResult<Self> {
        let (min_length, max_length) = section.child("length").count_range("min", "max")?;
        Ok(Self {
            min_length,
            max_length,
            alphabet: Alphabet::from_flags(
                section.flag("includeAscii")?,
                section.flag("includeLetters")?,
                section.flag("includeNumbers")?,
            ),
        })
    }
}

/// Replace a string with a fresh random one
#[derive(Debug, Clone)]
pub struct StringReplaceOperator {
    settings: StringSettings,
}

impl StringReplaceOperator {
    /// Create operator
    #[inline]
    #[must_use]
    pub fn new(settings: StringSettings) -> Self {
        Self { settings }
    }
}

impl Operator for StringReplaceOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Replace
    }

    fn mutate(&self, _value: &Value, rng: &mut MutationRng) -> Value {
        let len = rng.count(self.settings.min_length, self.settings.max_length);
        Value::String(self.settings.alphabet.generate(len, rng))
    }
}

/// Remove, add or replace a single character
#[derive(Debug, Clone)]
pub struct StringMutateOperator {
    alphabet: Alphabet,
}

impl StringMutateOperator {
    /// Create operator
    #[inline]
    #[must_use]
    pub fn new(alphabet: Alphabet) -> Self {
        Self { alphabet }
    }
}

impl Operator for StringMutateOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Mutate
    }

    fn mutate(&self, value: &Value, rng: &mut MutationRng) -> Value {
        let mut chars: Vec<char> = value.as_str().unwrap_or_default().chars().collect();
        let fresh = self.alphabet.generate(1, rng).chars().next().unwrap_or('x');
        let roll = rng.unit();
        if chars.is_empty() {
            chars.push(fresh);
        } else if roll < 1.0 / 3.0 {
            chars.remove(rng.index(chars.len()));
        } else if roll < 2.0 / 3.0 {
            let at = rng.index(chars.len() + 1);
            chars.insert(at, fresh);
        } else {
            let at = rng.index(chars.len());
            chars[at] = self.alphabet.redraw(chars[at], fresh, rng);
        }
        Value::String(chars.into_iter().collect())
    }
}

/// Replace a string with a boundary value
///
/// One of five outcomes with equal chance: empty (or a single space when
/// already empty), a minimum-length string, a maximum-length string, the
/// configured lowercase literal, the configured uppercase literal.
#[derive(Debug, Clone)]
pub struct StringBoundaryOperator {
    settings: StringSettings,
    lowercase: String,
    uppercase: String,
}

impl StringBoundaryOperator {
    /// Create operator
    #[inline]
    #[must_use]
    pub fn new(settings: StringSettings, lowercase: String, uppercase: String) -> Self {
        Self {
            settings,
            lowercase,
            uppercase,
        }
    }
}

impl Operator for StringBoundaryOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Boundary
    }

    fn mutate(&self, value: &Value, rng: &mut MutationRng) -> Value {
        let original = value.as_str().unwrap_or_default();
        let text = match rng.index(5) {
            0 if original.is_empty() => " ".to_string(),
            0 => String::new(),
            1 => rng.alphanumeric(self.settings.min_length),
            2 => rng.alphanumeric(self.settings.max_length),
            3 => self.lowercase.clone(),
            _ => self.uppercase.clone(),
        };
        Value::String(text)
    }
}

/// Insert one special-character sequence at a random position
#[derive(Debug, Clone)]
pub struct AddSpecialCharactersOperator {
    pool: Vec<String>,
}

impl AddSpecialCharactersOperator {
    /// Create operator over `pool`
    #[inline]
    #[must_use]
    pub fn new(pool: Vec<String>) -> Self {
        Self { pool }
    }
}

impl Operator for AddSpecialCharactersOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::AddSpecialCharacters
    }

    fn mutate(&self, value: &Value, rng: &mut MutationRng) -> Value {
        let original = value.as_str().unwrap_or_default();
        let Some(special) = rng.choose(&self.pool).cloned() else {
            return value.clone();
        };
        let boundaries: Vec<usize> = original
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(original.len()))
            .collect();
        let at = boundaries[rng.index(boundaries.len())];
        let mut text = String::with_capacity(original.len() + special.len());
        text.push_str(&original[..at]);
        text.push_str(&special);
        text.push_str(&original[at..]);
        Value::String(text)
    }
}

/// Invert a boolean
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanMutateOperator;

impl Operator for BooleanMutateOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Mutate
    }

    fn mutate(&self, value: &Value, _rng: &mut MutationRng) -> Value {
        Value::Bool(!value.as_bool().unwrap_or_default())
    }
}

/// Build the long mutator
///
/// # Errors
/// Fails on missing or malformed `operator.value.long.*` keys.
pub fn long_mutator(properties: &Properties) -> ConfigResult<Mutator> {
    Ok(MutatorBuilder::new(properties, MutatorKind::Long)?
        .operator(OperatorKind::Replace, |m, _| {
            let (min, max) = (m.integer("min")?, m.integer("max")?);
            if min > max {
                return Err(ConfigError::invalid(m.key("min"), "greater than max"));
            }
            Ok(LongReplaceOperator::new(min, max))
        })?
        .operator(OperatorKind::Mutate, |m, _| {
            Ok(LongMutateOperator::new(m.integer("delta")?))
        })?
        .operator(OperatorKind::Null, |_, _| Ok(NullOperator))?
        .operator(OperatorKind::ChangeType, |_, _| Ok(ChangeTypeOperator))?
        .build())
}

/// Build the double mutator
///
/// # Errors
/// Fails on missing or malformed `operator.value.double.*` keys.
pub fn double_mutator(properties: &Properties) -> ConfigResult<Mutator> {
    Ok(MutatorBuilder::new(properties, MutatorKind::Double)?
        .operator(OperatorKind::Replace, |m, _| {
            let (min, max) = (m.float("min")?, m.float("max")?);
            if !min.is_finite() || !max.is_finite() {
                return Err(ConfigError::invalid(m.key("min"), "bounds must be finite"));
            }
            if min > max {
                return Err(ConfigError::invalid(m.key("min"), "greater than max"));
            }
            // uniform sampling needs a representable width
            if !(max - min).is_finite() {
                return Err(ConfigError::invalid(m.key("max"), "range too wide"));
            }
            Ok(DoubleReplaceOperator::new(min, max))
        })?
        .operator(OperatorKind::Mutate, |m, _| {
            let delta = m.float("delta")?;
            if !delta.is_finite() {
                return Err(ConfigError::invalid(m.key("delta"), "must be finite"));
            }
            Ok(DoubleMutateOperator::new(delta))
        })?
        .operator(OperatorKind::Null, |_, _| Ok(NullOperator))?
        .operator(OperatorKind::ChangeType, |_, _| Ok(ChangeTypeOperator))?
        .build())
}

/// Build the string mutator
///
/// # Errors
/// Fails on missing or malformed `operator.value.string.*` keys.
pub fn string_mutator(properties: &Properties) -> ConfigResult<Mutator> {
    Ok(MutatorBuilder::new(properties, MutatorKind::String)?
        .operator(OperatorKind::Replace, |m, _| {
            Ok(StringReplaceOperator::new(StringSettings::from_section(m)?))
        })?
        .operator(OperatorKind::Mutate, |m, _| {
            Ok(StringMutateOperator::new(
                StringSettings::from_section(m)?.alphabet,
            ))
        })?
        .operator(OperatorKind::Boundary, |m, _| {
            Ok(StringBoundaryOperator::new(
                StringSettings::from_section(m)?,
                m.string("lowercase")?,
                m.string("uppercase")?,
            ))
        })?
        .operator(OperatorKind::AddSpecialCharacters, |_, op| {
            Ok(AddSpecialCharactersOperator::new(distinct_pool(op, "values")?))
        })?
        .operator(OperatorKind::Null, |_, _| Ok(NullOperator))?
        .operator(OperatorKind::ChangeType, |_, _| Ok(ChangeTypeOperator))?
        .build())
}

/// Build the boolean mutator
///
/// # Errors
/// Fails on missing or malformed `operator.value.boolean.*` keys.
pub fn boolean_mutator(properties: &Properties) -> ConfigResult<Mutator> {
    Ok(MutatorBuilder::new(properties, MutatorKind::Boolean)?
        .operator(OperatorKind::Mutate, |_, _| Ok(BooleanMutateOperator))?
        .operator(OperatorKind::Null, |_, _| Ok(NullOperator))?
        .operator(OperatorKind::ChangeType, |_, _| Ok(ChangeTypeOperator))?
        .build())
}

/// Build the null mutator
///
/// # Errors
/// Fails on missing or malformed `operator.value.null.*` keys.
pub fn null_mutator(properties: &Properties) -> ConfigResult<Mutator> {
    Ok(MutatorBuilder::new(properties, MutatorKind::Null)?
        .operator(OperatorKind::ChangeType, |_, _| Ok(ChangeTypeOperator))?
        .build())
}
