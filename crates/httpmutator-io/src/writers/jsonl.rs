use super::{metadata, MutantWriter};
use crate::error::{WriteError, WriteResult};
use crate::exchange::HttpExchange;
use httpmutator_core::Mutant;
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Bytes buffered before the writer flushes to its output
pub const FLUSH_THRESHOLD: usize = 1 << 20;

/// Writes one canonical response document per line
#[derive(Debug)]
pub struct JsonlWriter<W: Write> {
    out: Option<BufWriter<W>>,
    include_meta: bool,
    written: usize,
}

impl JsonlWriter<File> {
    /// Create (or truncate) a file
    ///
    /// # Errors
    /// Fails when the file cannot be created.
    pub fn create(path: impl AsRef<Path>, include_meta: bool) -> WriteResult<Self> {
        Ok(Self::new(File::create(path)?, include_meta))
    }
}

impl<W: Write> JsonlWriter<W> {
    /// Create writer over any output
    #[must_use]
    pub fn new(out: W, include_meta: bool) -> Self {
        Self {
            out: Some(BufWriter::with_capacity(FLUSH_THRESHOLD, out)),
            include_meta,
            written: 0,
        }
    }

    /// Mutants written so far
    #[inline]
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }

    /// Close and hand back the output
    ///
    /// # Errors
    /// Fails when flushing fails or the writer is already closed.
    pub fn into_inner(mut self) -> WriteResult<W> {
        let out = self.out.take().ok_or(WriteError::Closed("jsonl writer"))?;
        out.into_inner().map_err(|e| WriteError::Io(e.into_error()))
    }
}

impl<W: Write + Send + std::fmt::Debug> MutantWriter for JsonlWriter<W> {
    fn write(&mut self, exchange: &HttpExchange, mutant: &Mutant) -> WriteResult<()> {
        let out = self.out.as_mut().ok_or(WriteError::Closed("jsonl writer"))?;
        let mut document = mutant.response().to_value();
        if self.include_meta {
            if let Value::Object(fields) = &mut document {
                fields.extend(metadata(exchange, mutant));
            }
        }
        serde_json::to_writer(&mut *out, &document)?;
        out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn close(&mut self) -> WriteResult<()> {
        let mut out = self.out.take().ok_or(WriteError::Closed("jsonl writer"))?;
        out.flush()?;
        tracing::debug!(mutants = self.written, "jsonl writer closed");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "jsonl"
    }
}
