//! Mutant reporters
//!
//! Reporters observe every selected mutant and write a summary once the run
//! finishes.

mod csv;
mod statistics;

pub use csv::CsvReporter;
pub use statistics::{MutationStatistics, StatisticsReporter};

use crate::error::WriteResult;
use crate::exchange::HttpExchange;
use httpmutator_core::Mutant;
use std::fmt;
use std::str::FromStr;

/// Observer of selected mutants
pub trait MutantReporter: Send + fmt::Debug {
    /// Count one mutant of `exchange`
    fn on_mutant(&mut self, exchange: &HttpExchange, mutant: &Mutant);

    /// Write the report
    ///
    /// # Errors
    /// Fails when the report cannot be written or was already written.
    fn on_finished(&mut self) -> WriteResult<()>;

    /// Reporter name (for logging)
    fn name(&self) -> &'static str;
}

/// Reporter selector used by the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReporterKind {
    /// Per-exchange `Mutator:Operator` usage table
    Csv,
    /// `mutator,operator,count` totals
    Stats,
    /// No report
    None,
}

impl ReporterKind {
    /// Every accepted spelling
    pub const NAMES: [&'static str; 3] = ["csv", "stats", "none"];
}

impl FromStr for ReporterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "stats" | "statistics" => Ok(Self::Stats),
            "none" => Ok(Self::None),
            other => Err(format!(
                "unknown reporter '{other}', expected one of: {}",
                Self::NAMES.join(", ")
            )),
        }
    }
}

/// Quote a CSV field when it holds a separator, quote or line break
pub(crate) fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_only_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn parses_reporter_names() {
        assert_eq!("CSV".parse::<ReporterKind>(), Ok(ReporterKind::Csv));
        assert_eq!("stats".parse::<ReporterKind>(), Ok(ReporterKind::Stats));
        assert!("html".parse::<ReporterKind>().is_err());
    }
}
