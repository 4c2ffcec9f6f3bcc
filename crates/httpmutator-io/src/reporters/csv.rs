use super::{csv_field, MutantReporter};
use crate::error::{WriteError, WriteResult};
use crate::exchange::HttpExchange;
use httpmutator_core::Mutant;
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Per-exchange usage table of `Mutator:Operator` combinations
///
/// Columns are sorted, rows follow the order exchanges were first seen and a
/// trailing `TOTAL` row sums every column.
#[derive(Debug)]
pub struct CsvReporter<W: Write> {
    out: Option<W>,
    columns: BTreeSet<String>,
    rows: IndexMap<String, BTreeMap<String, usize>>,
}

impl CsvReporter<BufWriter<File>> {
    /// Create (or truncate) a file
    ///
    /// # Errors
    /// Fails when the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> WriteResult<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> CsvReporter<W> {
    /// Create reporter over any output
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out: Some(out),
            columns: BTreeSet::new(),
            rows: IndexMap::new(),
        }
    }

    /// Write the table and hand back the output
    ///
    /// # Errors
    /// Fails when writing fails or the table was already written.
    pub fn into_inner(mut self) -> WriteResult<W> {
        self.write_table()
    }

    fn write_table(&mut self) -> WriteResult<W> {
        let mut out = self.out.take().ok_or(WriteError::Closed("csv reporter"))?;

        let header: Vec<String> = std::iter::once("exchange".to_string())
            .chain(self.columns.iter().map(|c| csv_field(c)))
            .collect();
        writeln!(out, "{}", header.join(","))?;

        let mut totals = vec![0_usize; self.columns.len()];
        for (id, counts) in &self.rows {
            let mut line = vec![csv_field(id)];
            for (i, column) in self.columns.iter().enumerate() {
                let count = counts.get(column).copied().unwrap_or(0);
                totals[i] += count;
                line.push(count.to_string());
            }
            writeln!(out, "{}", line.join(","))?;
        }

        let total: Vec<String> = std::iter::once("TOTAL".to_string())
            .chain(totals.iter().map(usize::to_string))
            .collect();
        writeln!(out, "{}", total.join(","))?;
        out.flush()?;
        Ok(out)
    }
}

impl<W: Write + Send + std::fmt::Debug> MutantReporter for CsvReporter<W> {
    fn on_mutant(&mut self, exchange: &HttpExchange, mutant: &Mutant) {
        let column = format!("{}:{}", mutant.mutator().name(), mutant.operator().name());
        *self
            .rows
            .entry(exchange.id().to_string())
            .or_default()
            .entry(column.clone())
            .or_insert(0) += 1;
        self.columns.insert(column);
    }

    fn on_finished(&mut self) -> WriteResult<()> {
        self.write_table()?;
        tracing::debug!(exchanges = self.rows.len(), "csv report written");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}
