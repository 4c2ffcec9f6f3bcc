//! Seeded randomness for mutation
//!
//! One [`MutationRng`] is owned by the engine and lent to every operator, so
//! a fixed seed reproduces the exact same mutant stream.

use rand::distributions::Alphanumeric;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Seed used when none is given
pub const DEFAULT_SEED: u64 = 42;

/// Deterministic random source for operators
#[derive(Debug, Clone)]
pub struct MutationRng {
    seed: u64,
    inner: StdRng,
}

impl MutationRng {
    /// Create generator from seed
    #[inline]
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: StdRng::seed_from_u64(seed),
        }
    }

    /// Seed the generator was last (re)seeded with
    #[inline]
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restart the sequence from a new seed
    pub fn reseed(&mut self, seed: u64) {
        *self = Self::new(seed);
    }

    /// Uniform index in `0..len`; `len` must be non-zero
    #[inline]
    pub fn index(&mut self, len: usize) -> usize {
        self.inner.gen_range(0..len)
    }

    /// Uniform count in `min..=max`
    #[inline]
    pub fn count(&mut self, min: usize, max: usize) -> usize {
        self.inner.gen_range(min..=max)
    }

    /// Uniform integer in `min..=max`
    #[inline]
    pub fn long(&mut self, min: i64, max: i64) -> i64 {
        self.inner.gen_range(min..=max)
    }

    /// Uniform float in `min..max` (or `min` when the range is empty)
    #[inline]
    pub fn double(&mut self, min: f64, max: f64) -> f64 {
        if min < max {
            self.inner.gen_range(min..max)
        } else {
            min
        }
    }

    /// Uniform float in `[0, 1)`
    #[inline]
    pub fn unit(&mut self) -> f64 {
        self.inner.gen()
    }

    /// Fair coin
    #[inline]
    pub fn coin(&mut self) -> bool {
        self.inner.gen()
    }

    /// Probability gate: true means the mutation is skipped
    ///
    /// No draw is made for `prob >= 1.0` so the default threshold leaves the
    /// random sequence untouched.
    pub fn should_skip(&mut self, prob: f64) -> bool {
        if prob >= 1.0 {
            return false;
        }
        self.unit() >= prob
    }

    /// Pick an element; `None` for an empty slice
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            Some(&items[self.index(items.len())])
        }
    }

    /// Letters and digits only
    pub fn alphanumeric(&mut self, len: usize) -> String {
        (&mut self.inner)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }

    /// Printable ASCII (`0x20..0x7f`)
    pub fn printable_ascii(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| char::from(self.inner.gen_range(0x20_u8..0x7f)))
            .collect()
    }

    /// ASCII letters only
    pub fn letters(&mut self, len: usize) -> String {
        const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
        (0..len)
            .map(|_| char::from(LETTERS[self.index(LETTERS.len())]))
            .collect()
    }

    /// ASCII digits only
    pub fn digits(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| char::from(b'0' + self.inner.gen_range(0_u8..10)))
            .collect()
    }
}

impl Default for MutationRng {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}
