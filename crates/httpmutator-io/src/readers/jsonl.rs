use super::{ExchangeIter, ExchangeReader, InputFormat};
use crate::error::{ReadError, ReadResult};
use crate::exchange::HttpExchange;
use httpmutator_core::Response;
use serde_json::Value;
use std::io::BufRead;

/// Reads one canonical response document per line
///
/// Blank lines are skipped. The exchange id is the document's `id` field
/// (string or number) or else the 1-based line number.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonlReader;

impl ExchangeReader for JsonlReader {
    fn format(&self) -> InputFormat {
        InputFormat::Jsonl
    }

    fn exchanges<'a>(&self, input: Box<dyn BufRead + 'a>) -> ExchangeIter<'a> {
        Box::new(JsonlExchanges {
            lines: input,
            line: 0,
            done: false,
        })
    }
}

struct JsonlExchanges<'a> {
    lines: Box<dyn BufRead + 'a>,
    line: usize,
    done: bool,
}

impl JsonlExchanges<'_> {
    fn next_line(&mut self) -> Option<ReadResult<String>> {
        let mut buffer = String::new();
        loop {
            buffer.clear();
            match self.lines.read_line(&mut buffer) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line += 1;
                    if !buffer.trim().is_empty() {
                        return Some(Ok(buffer));
                    }
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

impl Iterator for JsonlExchanges<'_> {
    type Item = ReadResult<HttpExchange>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = match self.next_line()? {
            Ok(text) => parse_line(&text, self.line),
            Err(e) => Err(e),
        };
        if matches!(item, Err(ReadError::Io(_))) {
            self.done = true;
        }
        Some(item)
    }
}

fn parse_line(text: &str, line: usize) -> ReadResult<HttpExchange> {
    let document: Value = serde_json::from_str(text).map_err(|e| ReadError::InvalidJson {
        line,
        reason: e.to_string(),
    })?;
    let response = Response::from_value(&document)
        .map_err(|e| ReadError::invalid_response(format!("line {line}"), e))?;
    let id = match document.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => line.to_string(),
    };
    Ok(HttpExchange::response_only(response, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read(text: &str) -> Vec<ReadResult<HttpExchange>> {
        JsonlReader
            .exchanges(Box::new(Cursor::new(text.to_string())))
            .collect()
    }

    #[test]
    fn reads_documents_and_skips_blank_lines() {
        let text = "{\"Status Code\":200,\"Body\":{\"a\":1}}\n\n  \n{\"Status Code\":404,\"id\":\"x\"}\n";
        let exchanges: Vec<_> = read(text).into_iter().map(Result::unwrap).collect();
        assert_eq!(exchanges.len(), 2);
        assert_eq!(exchanges[0].id(), "1");
        assert_eq!(exchanges[1].id(), "x");
        assert_eq!(exchanges[1].response().status_code(), 404);
    }

    #[test]
    fn numeric_id_is_used() {
        let exchanges = read("{\"Status Code\":200,\"id\":7}");
        assert_eq!(exchanges[0].as_ref().unwrap().id(), "7");
    }

    #[test]
    fn errors_name_the_line() {
        let items = read("{\"Status Code\":200}\n\nnot json\n{\"Body\":1}\n");
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(ReadError::InvalidJson { line: 3, .. })));
        match &items[2] {
            Err(ReadError::InvalidResponse { record, .. }) => assert_eq!(record, "line 4"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
