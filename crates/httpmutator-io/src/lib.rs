//! HttpMutator I/O
//!
//! Everything around the mutation engine: input readers, mutant writers,
//! usage reporters and the [`HttpMutator`] pipeline that connects them.
//!
//! # Core Concepts
//!
//! - [`HttpExchange`]: a recorded response, its optional request and an id
//! - [`ExchangeReader`]: lazily reads exchanges from JSONL or HAR input
//! - [`MutantWriter`]: persists kept mutants as JSONL, HAR or zstd shards
//! - [`MutantReporter`]: summarizes kept mutants as CSV
//! - [`HttpMutator`]: engine + strategy + writers + reporters
//!
//! # Example
//!
//! ```rust
//! use httpmutator_core::{AllOperatorsStrategy, Engine};
//! use httpmutator_io::{HttpMutator, JsonlWriter};
//! use serde_json::json;
//!
//! let mut mutator = HttpMutator::new(Engine::with_defaults().unwrap())
//!     .with_strategy(Box::new(AllOperatorsStrategy))
//!     .add_writer(Box::new(JsonlWriter::new(std::io::sink(), true)));
//!
//! mutator
//!     .process_document(&json!({"Status Code": 200, "Body": [1, 2, 3]}), None)
//!     .unwrap();
//! let summary = mutator.finish().unwrap();
//! assert!(summary.mutants > 0);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod exchange;
pub mod har;
mod pipeline;
pub mod readers;
pub mod reporters;
pub mod writers;

pub use error::{
    PipelineError, PipelineResult, ReadError, ReadResult, WriteError, WriteResult,
};
pub use exchange::{HttpExchange, Request};
pub use pipeline::{HttpMutator, PipelineSummary, IN_MEMORY_ID};
pub use readers::{ExchangeIter, ExchangeReader, HarReader, InputFormat, JsonlReader};
pub use reporters::{
    CsvReporter, MutantReporter, MutationStatistics, ReporterKind, StatisticsReporter,
};
pub use writers::{HarWriter, JsonlWriter, MutantWriter, ShardLimits, ShardedZstdWriter};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
