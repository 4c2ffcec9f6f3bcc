//! Mutant writers
//!
//! Writers receive every selected mutant together with the exchange it came
//! from. [`MutantWriter::close`] flushes whatever is buffered; writing after
//! close fails with [`WriteError::Closed`](crate::WriteError::Closed).
//!
//! - [`JsonlWriter`]: one canonical document per line
//! - [`HarWriter`]: one HAR 1.2 archive
//! - [`ShardedZstdWriter`]: zstd-compressed JSONL split into shards

mod har;
mod jsonl;
mod sharded;

pub use har::HarWriter;
pub use jsonl::{JsonlWriter, FLUSH_THRESHOLD};
pub use sharded::{ShardLimits, ShardedZstdWriter, SHARD_EXTENSION};

use crate::error::WriteResult;
use crate::exchange::HttpExchange;
use httpmutator_core::Mutant;
use serde_json::{Map, Value};
use std::fmt;

/// Metadata field: id of the exchange the mutant came from
pub const META_ORIGINAL_ID: &str = "_hm_original_id";
/// Metadata field: mutation site
pub const META_JSON_PATH: &str = "_hm_original_json_path";
/// Metadata field: mutator name
pub const META_MUTATOR: &str = "_hm_mutator";
/// Metadata field: operator name
pub const META_OPERATOR: &str = "_hm_operator";

/// Sink for selected mutants
pub trait MutantWriter: Send + fmt::Debug {
    /// Record one mutant of `exchange`
    ///
    /// # Errors
    /// Fails on I/O errors or when the writer is closed.
    fn write(&mut self, exchange: &HttpExchange, mutant: &Mutant) -> WriteResult<()>;

    /// Flush and release the output
    ///
    /// # Errors
    /// Fails on I/O errors or when the writer is already closed.
    fn close(&mut self) -> WriteResult<()>;

    /// Writer name (for logging)
    fn name(&self) -> &'static str;
}

/// `_hm_*` fields describing where a mutant came from
pub(crate) fn metadata(exchange: &HttpExchange, mutant: &Mutant) -> Map<String, Value> {
    let mut meta = Map::new();
    meta.insert(META_ORIGINAL_ID.into(), Value::from(exchange.id()));
    meta.insert(META_JSON_PATH.into(), Value::from(mutant.location()));
    meta.insert(META_MUTATOR.into(), Value::from(mutant.mutator().name()));
    meta.insert(META_OPERATOR.into(), Value::from(mutant.operator().name()));
    meta
}
