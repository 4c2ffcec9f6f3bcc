use super::{metadata, MutantWriter};
use crate::error::{WriteError, WriteResult};
use crate::exchange::HttpExchange;
use crate::har::{request_to_har, response_to_har, HAR_VERSION, HTTP_VERSION};
use chrono::{DateTime, SecondsFormat, Utc};
use httpmutator_core::Mutant;
use serde_json::{json, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Host used for requests synthesized for response-only exchanges
pub const SYNTHETIC_HOST: &str = "httpmutator.local";

/// Collects mutants as HAR 1.2 entries and writes one archive on close
#[derive(Debug)]
pub struct HarWriter<W: Write> {
    out: Option<W>,
    entries: Vec<Value>,
    started: DateTime<Utc>,
}

impl HarWriter<BufWriter<File>> {
    /// Create (or truncate) a file
    ///
    /// # Errors
    /// Fails when the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> WriteResult<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> HarWriter<W> {
    /// Create writer over any output
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out: Some(out),
            entries: Vec::new(),
            started: Utc::now(),
        }
    }

    /// Stamp every entry with `started` instead of the creation time
    #[must_use]
    pub fn with_started_at(mut self, started: DateTime<Utc>) -> Self {
        self.started = started;
        self
    }

    /// Entries collected so far
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was collected
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the archive and hand back the output
    ///
    /// # Errors
    /// Fails when writing fails or the writer is already closed.
    pub fn into_inner(mut self) -> WriteResult<W> {
        self.flush_document()
    }

    fn flush_document(&mut self) -> WriteResult<W> {
        let mut out = self.out.take().ok_or(WriteError::Closed("har writer"))?;
        let document = json!({
            "log": {
                "version": HAR_VERSION,
                "creator": {"name": "HttpMutator", "version": httpmutator_core::VERSION},
                "entries": std::mem::take(&mut self.entries),
            }
        });
        serde_json::to_writer_pretty(&mut out, &document)?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(out)
    }
}

impl<W: Write + Send + std::fmt::Debug> MutantWriter for HarWriter<W> {
    fn write(&mut self, exchange: &HttpExchange, mutant: &Mutant) -> WriteResult<()> {
        if self.out.is_none() {
            return Err(WriteError::Closed("har writer"));
        }
        let request = exchange
            .request()
            .map_or_else(|| synthetic_request(exchange, mutant), request_to_har);

        let mut entry = json!({
            "startedDateTime": self.started.to_rfc3339_opts(SecondsFormat::Millis, true),
            "time": 0,
            "request": request,
            "response": response_to_har(mutant.response()),
            "cache": {},
            "timings": {"send": 0, "wait": 0, "receive": 0},
        });
        if let Value::Object(fields) = &mut entry {
            fields.extend(metadata(exchange, mutant));
        }
        self.entries.push(entry);
        Ok(())
    }

    fn close(&mut self) -> WriteResult<()> {
        let entries = self.entries.len();
        self.flush_document()?;
        tracing::debug!(entries, "har writer closed");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "har"
    }
}

/// `GET http://httpmutator.local/exchange/<id>?mutator=..&operator=..&jsonpath=..`
fn synthetic_request(exchange: &HttpExchange, mutant: &Mutant) -> Value {
    json!({
        "method": "GET",
        "url": synthetic_url(exchange.id(), mutant),
        "httpVersion": HTTP_VERSION,
        "cookies": [],
        "headers": [],
        "queryString": [
            {"name": "mutator", "value": mutant.mutator().name()},
            {"name": "operator", "value": mutant.operator().name()},
            {"name": "jsonpath", "value": mutant.location()},
        ],
        "headersSize": -1,
        "bodySize": 0,
    })
}

fn synthetic_url(id: &str, mutant: &Mutant) -> String {
    let id: String = url::form_urlencoded::byte_serialize(id.as_bytes()).collect();
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("mutator", mutant.mutator().name())
        .append_pair("operator", mutant.operator().name())
        .append_pair("jsonpath", mutant.location())
        .finish();
    format!("http://{SYNTHETIC_HOST}/exchange/{id}?{query}")
}
