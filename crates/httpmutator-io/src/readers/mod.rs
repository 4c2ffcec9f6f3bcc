//! Exchange readers
//!
//! A reader turns a byte stream into a lazy sequence of [`HttpExchange`]s.
//! Each item is read on demand, so large inputs never sit in memory as a
//! whole (the HAR reader is the exception: HAR is one JSON document).

mod har;
mod jsonl;

pub use har::HarReader;
pub use jsonl::JsonlReader;

use crate::error::ReadResult;
use crate::exchange::HttpExchange;
use std::fmt;
use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;

/// Lazy sequence of exchanges
pub type ExchangeIter<'a> = Box<dyn Iterator<Item = ReadResult<HttpExchange>> + 'a>;

/// Source of exchanges in one input format
pub trait ExchangeReader: Send + Sync + fmt::Debug {
    /// Format this reader understands
    fn format(&self) -> InputFormat;

    /// Exchanges contained in `input`, in input order
    fn exchanges<'a>(&self, input: Box<dyn BufRead + 'a>) -> ExchangeIter<'a>;
}

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// One canonical response document per line
    Jsonl,
    /// HTTP Archive 1.2
    Har,
}

impl InputFormat {
    /// Every accepted spelling
    pub const NAMES: [&'static str; 2] = ["jsonl", "har"];

    /// Infer from a file name: `.jsonl`, `.har` or `.har.json`
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".jsonl") {
            Some(Self::Jsonl)
        } else if name.ends_with(".har") || name.ends_with(".har.json") {
            Some(Self::Har)
        } else {
            None
        }
    }

    /// Reader for this format
    #[must_use]
    pub fn reader(self) -> Box<dyn ExchangeReader> {
        match self {
            Self::Jsonl => Box::new(JsonlReader),
            Self::Har => Box::new(HarReader),
        }
    }
}

impl FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jsonl" => Ok(Self::Jsonl),
            "har" => Ok(Self::Har),
            other => Err(format!(
                "unknown input format '{other}', expected one of: {}",
                Self::NAMES.join(", ")
            )),
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Jsonl => "jsonl",
            Self::Har => "har",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_format_from_extension() {
        assert_eq!(InputFormat::from_path(Path::new("a/b.jsonl")), Some(InputFormat::Jsonl));
        assert_eq!(InputFormat::from_path(Path::new("trace.HAR")), Some(InputFormat::Har));
        assert_eq!(InputFormat::from_path(Path::new("trace.har.json")), Some(InputFormat::Har));
        assert_eq!(InputFormat::from_path(Path::new("trace.json")), None);
    }

    #[test]
    fn parses_names() {
        assert_eq!("HAR".parse::<InputFormat>(), Ok(InputFormat::Har));
        assert!("csv".parse::<InputFormat>().is_err());
        assert_eq!(InputFormat::Jsonl.reader().format(), InputFormat::Jsonl);
    }
}
