use super::{ExchangeIter, ExchangeReader, InputFormat};
use crate::error::{ReadError, ReadResult};
use crate::exchange::HttpExchange;
use crate::har::{request_from_har, response_from_har};
use serde_json::Value;
use std::io::BufRead;

/// Reads the entries of an HTTP Archive
///
/// `log.entries` is required. Each entry needs a `response`; its `request`
/// is kept when present. The id is the entry's `id` (or `_id`) field, or else
/// the 1-based entry index.
#[derive(Debug, Clone, Copy, Default)]
pub struct HarReader;

impl ExchangeReader for HarReader {
    fn format(&self) -> InputFormat {
        InputFormat::Har
    }

    fn exchanges<'a>(&self, input: Box<dyn BufRead + 'a>) -> ExchangeIter<'a> {
        match entries(input) {
            Ok(entries) => Box::new(
                entries
                    .into_iter()
                    .enumerate()
                    .map(|(i, entry)| parse_entry(&entry, i + 1)),
            ),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }
}

fn entries(input: Box<dyn BufRead + '_>) -> ReadResult<Vec<Value>> {
    let mut document: Value =
        serde_json::from_reader(input).map_err(|e| match e.classify() {
            serde_json::error::Category::Io => ReadError::Io(e.into()),
            _ => ReadError::InvalidHar(e.to_string()),
        })?;
    match document
        .get_mut("log")
        .and_then(|log| log.get_mut("entries"))
        .map(Value::take)
    {
        Some(Value::Array(entries)) => Ok(entries),
        Some(_) => Err(ReadError::InvalidHar("log.entries must be an array".into())),
        None => Err(ReadError::InvalidHar("missing log.entries".into())),
    }
}

fn parse_entry(entry: &Value, index: usize) -> ReadResult<HttpExchange> {
    let record = format!("entry {index}");
    let response = entry
        .get("response")
        .ok_or_else(|| ReadError::InvalidHar(format!("{record} has no response")))?;
    let response =
        response_from_har(response).map_err(|e| ReadError::invalid_response(&record, e))?;
    let request = entry.get("request").and_then(request_from_har);
    let id = ["id", "_id"]
        .iter()
        .find_map(|key| match entry.get(*key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| index.to_string());
    Ok(HttpExchange::new(request, response, id))
}
