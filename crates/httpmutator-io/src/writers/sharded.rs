use super::{metadata, MutantWriter, FLUSH_THRESHOLD, META_ORIGINAL_ID};
use crate::error::{WriteError, WriteResult};
use crate::exchange::HttpExchange;
use httpmutator_core::Mutant;
use serde_json::Value;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File extension of committed shards
pub const SHARD_EXTENSION: &str = "jsonl.zst";

/// When a shard is closed and the next one started
///
/// A shard rotates after the write that reaches either limit, so one
/// oversized line still lands in a shard of its own. A limit of zero
/// behaves like one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardLimits {
    /// Lines per shard
    pub max_lines: u64,
    /// Uncompressed bytes per shard (approximate, checked after each line)
    pub max_uncompressed_bytes: u64,
    /// zstd compression level
    pub level: i32,
}

impl Default for ShardLimits {
    fn default() -> Self {
        Self {
            max_lines: 50_000,
            max_uncompressed_bytes: 1 << 30,
            level: 3,
        }
    }
}

struct OpenShard {
    encoder: zstd::Encoder<'static, BufWriter<File>>,
    tmp: PathBuf,
    path: PathBuf,
    lines: u64,
    bytes: u64,
}

impl OpenShard {
    fn open(path: PathBuf, level: i32) -> WriteResult<Self> {
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        let file = BufWriter::with_capacity(FLUSH_THRESHOLD, File::create(&tmp)?);
        Ok(Self {
            encoder: zstd::Encoder::new(file, level)?,
            tmp,
            path,
            lines: 0,
            bytes: 0,
        })
    }

    fn is_full(&self, limits: &ShardLimits) -> bool {
        self.lines >= limits.max_lines || self.bytes >= limits.max_uncompressed_bytes
    }

    /// Finish the frame and move the shard to its final name
    fn commit(self) -> WriteResult<PathBuf> {
        let mut file = self.encoder.finish()?;
        file.flush()?;
        drop(file);
        fs::rename(&self.tmp, &self.path)?;
        Ok(self.path)
    }
}

impl fmt::Debug for OpenShard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenShard")
            .field("path", &self.path)
            .field("lines", &self.lines)
            .field("bytes", &self.bytes)
            .finish_non_exhaustive()
    }
}

/// Writes mutants as zstd-compressed JSONL split across shard files
///
/// Shards are named `<prefix>-00000.jsonl.zst`, `<prefix>-00001.jsonl.zst`
/// and so on. Each one is written as `<name>.tmp` and renamed once its
/// frame is complete, so a file with the final name is always readable.
/// Every line carries `_hm_original_id`; the other `_hm_*` fields are added
/// when `include_meta` is set.
#[derive(Debug)]
pub struct ShardedZstdWriter {
    dir: PathBuf,
    prefix: String,
    limits: ShardLimits,
    include_meta: bool,
    current: Option<OpenShard>,
    shards: Vec<PathBuf>,
    written: usize,
    closed: bool,
}

impl ShardedZstdWriter {
    /// Create writer for shards under `dir` (created when missing)
    ///
    /// # Errors
    /// Fails when the directory cannot be created.
    pub fn create(
        dir: impl AsRef<Path>,
        prefix: impl Into<String>,
        include_meta: bool,
    ) -> WriteResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            prefix: prefix.into(),
            limits: ShardLimits::default(),
            include_meta,
            current: None,
            shards: Vec::new(),
            written: 0,
            closed: false,
        })
    }

    /// Replace the rotation limits
    #[must_use]
    pub fn with_limits(mut self, limits: ShardLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Shards committed so far, in order
    #[inline]
    #[must_use]
    pub fn shards(&self) -> &[PathBuf] {
        &self.shards
    }

    /// Mutants written so far
    #[inline]
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }

    fn next_shard(&self) -> WriteResult<OpenShard> {
        let name = format!("{}-{:05}.{SHARD_EXTENSION}", self.prefix, self.shards.len());
        OpenShard::open(self.dir.join(name), self.limits.level)
    }

    fn commit(&mut self, shard: OpenShard) -> WriteResult<()> {
        let (lines, bytes) = (shard.lines, shard.bytes);
        let path = shard.commit()?;
        debug!(path = %path.display(), lines, bytes, "shard committed");
        self.shards.push(path);
        Ok(())
    }
}

impl MutantWriter for ShardedZstdWriter {
    fn write(&mut self, exchange: &HttpExchange, mutant: &Mutant) -> WriteResult<()> {
        if self.closed {
            return Err(WriteError::Closed("sharded zstd writer"));
        }
        let mut document = mutant.response().to_value();
        if let Value::Object(fields) = &mut document {
            if self.include_meta {
                fields.extend(metadata(exchange, mutant));
            } else {
                fields.insert(META_ORIGINAL_ID.into(), Value::from(exchange.id()));
            }
        }
        let mut line = serde_json::to_vec(&document)?;
        line.push(b'\n');

        let mut shard = match self.current.take() {
            Some(shard) => shard,
            None => self.next_shard()?,
        };
        shard.encoder.write_all(&line)?;
        shard.lines += 1;
        shard.bytes = shard
            .bytes
            .saturating_add(u64::try_from(line.len()).unwrap_or(u64::MAX));
        self.written += 1;

        if shard.is_full(&self.limits) {
            self.commit(shard)
        } else {
            self.current = Some(shard);
            Ok(())
        }
    }

    fn close(&mut self) -> WriteResult<()> {
        if self.closed {
            return Err(WriteError::Closed("sharded zstd writer"));
        }
        self.closed = true;
        if let Some(shard) = self.current.take() {
            self.commit(shard)?;
        }
        debug!(
            shards = self.shards.len(),
            mutants = self.written,
            "sharded zstd writer closed"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "zstd"
    }
}
