//! File-to-file runs of the mutation pipeline

use httpmutator_core::{AllOperatorsStrategy, RandomSingleStrategy, STATUS_CODE_LOCATION};
use httpmutator_io::{
    CsvReporter, HarReader, HarWriter, HttpMutator, InputFormat, JsonlReader, JsonlWriter,
    PipelineError, ReadError, StatisticsReporter,
};
use httpmutator_test_utils::{
    engine, har_document, har_entry, jsonl_document, rich_document, scenario_document,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;
use std::io::{BufReader, Cursor};
use std::path::Path;

fn read_lines(path: &Path) -> Vec<Value> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn jsonl_input_produces_every_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("responses.jsonl");
    fs::write(&input, jsonl_document(&[scenario_document(), rich_document()])).unwrap();
    let jsonl = dir.path().join("out-mutants.jsonl");
    let har = dir.path().join("out-mutants.har");
    let report = dir.path().join("out-report.csv");
    let stats = dir.path().join("out-stats.csv");

    let mut mutator = HttpMutator::new(engine(42))
        .with_strategy(Box::new(AllOperatorsStrategy))
        .add_writer(Box::new(JsonlWriter::create(&jsonl, true).unwrap()))
        .add_writer(Box::new(HarWriter::create(&har).unwrap()))
        .add_reporter(Box::new(CsvReporter::create(&report).unwrap()))
        .add_reporter(Box::new(StatisticsReporter::create(&stats).unwrap()));

    let reader = InputFormat::from_path(&input).unwrap().reader();
    let file = BufReader::new(fs::File::open(&input).unwrap());
    let summary = mutator.mutate_stream(reader.as_ref(), Box::new(file)).unwrap();

    assert_eq!(summary.exchanges, 2);
    assert_eq!(summary.statistics.total(), summary.mutants);

    let documents = read_lines(&jsonl);
    assert_eq!(documents.len(), summary.mutants);
    assert_eq!(documents[0]["_hm_original_id"], "1");
    assert_eq!(documents[0]["_hm_original_json_path"], STATUS_CODE_LOCATION);
    assert!(documents.iter().any(|d| d["_hm_original_id"] == "2"));

    let archive: Value = serde_json::from_str(&fs::read_to_string(&har).unwrap()).unwrap();
    let entries = archive["log"]["entries"].as_array().unwrap();
    assert_eq!(entries.len(), summary.mutants);
    assert!(entries[0]["request"]["url"]
        .as_str()
        .unwrap()
        .starts_with("http://httpmutator.local/exchange/1?"));

    let table = fs::read_to_string(&report).unwrap();
    let rows: Vec<&str> = table.lines().collect();
    assert!(rows[0].starts_with("exchange,"));
    assert!(rows[1].starts_with("1,"));
    assert!(rows[2].starts_with("2,"));
    assert!(rows[3].starts_with("TOTAL,"));

    let stats = fs::read_to_string(&stats).unwrap();
    let counted: usize = stats
        .lines()
        .skip(1)
        .map(|line| line.rsplit(',').next().unwrap().parse::<usize>().unwrap())
        .sum();
    assert_eq!(counted, summary.mutants);
}

#[test]
fn har_input_keeps_original_requests() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out-mutants.har");
    let input = har_document(vec![
        har_entry(200, &[("Content-Type", "application/json")], Some("{\"a\":1}")),
        har_entry(204, &[], None),
    ]);
    let mut mutator = HttpMutator::new(engine(7))
        .with_strategy(Box::new(RandomSingleStrategy::new(7)))
        .add_writer(Box::new(HarWriter::create(&output).unwrap()));
    let summary = mutator
        .mutate_stream(&HarReader, Box::new(Cursor::new(input)))
        .unwrap();
    assert_eq!(summary.exchanges, 2);

    let archive: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let entries = archive["log"]["entries"].as_array().unwrap();
    assert_eq!(entries.len(), summary.mutants);
    for entry in entries {
        assert_eq!(entry["request"]["url"], "https://api.example.test/orders/17");
    }
}

fn run_jsonl(input: &str, seed: u64, output: &Path) -> Result<(), PipelineError> {
    let mut mutator = HttpMutator::new(engine(seed))
        .with_strategy(Box::new(RandomSingleStrategy::new(seed)))
        .add_writer(Box::new(JsonlWriter::create(output, false).unwrap()));
    mutator
        .mutate_stream(&JsonlReader, Box::new(Cursor::new(input.to_string())))
        .map(drop)
}

#[test]
fn same_seed_writes_identical_output() {
    let dir = tempfile::tempdir().unwrap();
    let (first, second) = (dir.path().join("a.jsonl"), dir.path().join("b.jsonl"));
    let input = jsonl_document(&[rich_document(), scenario_document()]);
    run_jsonl(&input, 11, &first).unwrap();
    run_jsonl(&input, 11, &second).unwrap();
    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn malformed_line_stops_the_run_and_still_closes_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out-mutants.jsonl");
    let input = format!("{}\n{{oops\n", scenario_document());
    let err = run_jsonl(&input, 1, &output).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Read(ReadError::InvalidJson { line: 2, .. })
    ));
    // mutants of the first line were flushed on close
    assert_eq!(read_lines(&output).len(), 4);
}

#[test]
fn unsupported_body_number_is_fatal_for_the_exchange() {
    let input = jsonl_document(&[json!({"Status Code": 200, "Body": {"n": u64::MAX}})]);
    let mut mutator = HttpMutator::new(engine(1)).with_strategy(Box::new(AllOperatorsStrategy));
    let err = mutator
        .mutate_stream(&JsonlReader, Box::new(Cursor::new(input)))
        .unwrap_err();
    assert!(matches!(err, PipelineError::Engine { ref id, .. } if id == "1"));
}
