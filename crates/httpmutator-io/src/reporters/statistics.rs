use super::{csv_field, MutantReporter};
use crate::error::{WriteError, WriteResult};
use crate::exchange::HttpExchange;
use httpmutator_core::{Mutant, MutatorKind, OperatorKind};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

type Combination = (MutatorKind, OperatorKind);

/// Counts of mutator/operator combinations, overall and per exchange
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationStatistics {
    global: BTreeMap<Combination, usize>,
    per_exchange: IndexMap<String, BTreeMap<Combination, usize>>,
    total: usize,
}

impl MutationStatistics {
    /// Create empty statistics
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one mutant of exchange `id`
    pub fn record(&mut self, id: &str, mutant: &Mutant) {
        let key = (mutant.mutator(), mutant.operator());
        *self.global.entry(key).or_insert(0) += 1;
        *self
            .per_exchange
            .entry(id.to_string())
            .or_default()
            .entry(key)
            .or_insert(0) += 1;
        self.total += 1;
    }

    /// Mutants counted
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Distinct combinations seen
    #[inline]
    #[must_use]
    pub fn unique_combinations(&self) -> usize {
        self.global.len()
    }

    /// Count of one combination over all exchanges
    #[must_use]
    pub fn count(&self, mutator: MutatorKind, operator: OperatorKind) -> usize {
        self.global.get(&(mutator, operator)).copied().unwrap_or(0)
    }

    /// Count of one combination within exchange `id`
    #[must_use]
    pub fn exchange_count(&self, id: &str, mutator: MutatorKind, operator: OperatorKind) -> usize {
        self.per_exchange
            .get(id)
            .and_then(|counts| counts.get(&(mutator, operator)))
            .copied()
            .unwrap_or(0)
    }

    /// Exchange ids in first-seen order
    pub fn exchanges(&self) -> impl Iterator<Item = &str> {
        self.per_exchange.keys().map(String::as_str)
    }

    /// `(mutator, operator, count)` rows ordered by mutator then operator
    pub fn rows(&self) -> impl Iterator<Item = (MutatorKind, OperatorKind, usize)> + '_ {
        self.global.iter().map(|(&(m, o), &count)| (m, o, count))
    }

    /// Write `mutator,operator,count` CSV
    ///
    /// # Errors
    /// Fails when the output fails.
    pub fn write_csv(&self, out: &mut impl Write) -> std::io::Result<()> {
        writeln!(out, "mutator,operator,count")?;
        for (mutator, operator, count) in self.rows() {
            writeln!(
                out,
                "{},{},{count}",
                csv_field(mutator.name()),
                csv_field(operator.name())
            )?;
        }
        Ok(())
    }
}

/// Writes [`MutationStatistics`] as CSV once the run finishes
#[derive(Debug)]
pub struct StatisticsReporter<W: Write> {
    out: Option<W>,
    statistics: MutationStatistics,
}

impl StatisticsReporter<BufWriter<File>> {
    /// Create (or truncate) a file
    ///
    /// # Errors
    /// Fails when the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> WriteResult<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> StatisticsReporter<W> {
    /// Create reporter over any output
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out: Some(out),
            statistics: MutationStatistics::new(),
        }
    }

    /// Statistics gathered so far
    #[inline]
    #[must_use]
    pub fn statistics(&self) -> &MutationStatistics {
        &self.statistics
    }

    /// Write the report and hand back the output
    ///
    /// # Errors
    /// Fails when writing fails or the report was already written.
    pub fn into_inner(mut self) -> WriteResult<W> {
        self.write_report()
    }

    fn write_report(&mut self) -> WriteResult<W> {
        let mut out = self
            .out
            .take()
            .ok_or(WriteError::Closed("statistics reporter"))?;
        self.statistics.write_csv(&mut out)?;
        out.flush()?;
        Ok(out)
    }
}

impl<W: Write + Send + std::fmt::Debug> MutantReporter for StatisticsReporter<W> {
    fn on_mutant(&mut self, exchange: &HttpExchange, mutant: &Mutant) {
        self.statistics.record(exchange.id(), mutant);
    }

    fn on_finished(&mut self) -> WriteResult<()> {
        self.write_report()?;
        tracing::debug!(
            total = self.statistics.total(),
            unique = self.statistics.unique_combinations(),
            "statistics report written"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stats"
    }
}
