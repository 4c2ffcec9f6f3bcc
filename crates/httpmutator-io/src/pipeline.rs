//! Streaming pipeline from exchanges to written mutants
//!
//! [`HttpMutator`] wires an [`Engine`], a [`MutationStrategy`], writers and
//! reporters together. Each exchange is expanded into mutant groups, the
//! strategy keeps some mutants of every group, and each kept mutant is handed
//! to every writer, then every reporter, then the optional callback.

use crate::error::{PipelineError, PipelineResult};
use crate::exchange::HttpExchange;
use crate::readers::ExchangeReader;
use crate::reporters::{MutantReporter, MutationStatistics};
use crate::writers::MutantWriter;
use httpmutator_core::{Engine, EngineError, Mutant, MutationStrategy, Response};
use serde_json::Value;
use std::fmt;
use std::io::BufRead;
use tracing::{debug, info, warn};

/// Id given to in-memory documents without a label or `id` field
pub const IN_MEMORY_ID: &str = "in-memory";

type MutantCallback = Box<dyn FnMut(&HttpExchange, &Mutant) + Send>;

/// Totals of one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineSummary {
    /// Exchanges processed
    pub exchanges: usize,
    /// Mutant groups produced by the engine
    pub groups: usize,
    /// Mutants kept by the strategy
    pub mutants: usize,
    /// Kept mutants by mutator and operator
    pub statistics: MutationStatistics,
}

/// Mutation pipeline facade
pub struct HttpMutator {
    engine: Engine,
    strategy: Option<Box<dyn MutationStrategy>>,
    writers: Vec<Box<dyn MutantWriter>>,
    reporters: Vec<Box<dyn MutantReporter>>,
    on_mutant: Option<MutantCallback>,
    summary: PipelineSummary,
}

impl HttpMutator {
    /// Create pipeline around `engine`; a strategy must be set before use
    #[must_use]
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            strategy: None,
            writers: Vec::new(),
            reporters: Vec::new(),
            on_mutant: None,
            summary: PipelineSummary::default(),
        }
    }

    /// Set the selection strategy
    #[must_use]
    pub fn with_strategy(mut self, strategy: Box<dyn MutationStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Add a writer; writers receive mutants in the order they were added
    #[must_use]
    pub fn add_writer(mut self, writer: Box<dyn MutantWriter>) -> Self {
        self.writers.push(writer);
        self
    }

    /// Add a reporter
    #[must_use]
    pub fn add_reporter(mut self, reporter: Box<dyn MutantReporter>) -> Self {
        self.reporters.push(reporter);
        self
    }

    /// Call `callback` for every kept mutant, after writers and reporters
    #[must_use]
    pub fn on_mutant<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&HttpExchange, &Mutant) + Send + 'static,
    {
        self.on_mutant = Some(Box::new(callback));
        self
    }

    /// Engine in use
    #[inline]
    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Totals so far
    #[inline]
    #[must_use]
    pub fn summary(&self) -> &PipelineSummary {
        &self.summary
    }

    /// Mutate one exchange and dispatch the kept mutants
    ///
    /// Returns the number of mutants kept.
    ///
    /// # Errors
    /// Fails without a strategy, on an engine failure, or when a writer fails.
    pub fn process(&mut self, exchange: &HttpExchange) -> PipelineResult<usize> {
        let strategy = self
            .strategy
            .as_mut()
            .ok_or(PipelineError::MissingStrategy)?;

        let mut kept = 0;
        for group in self.engine.groups(exchange.response()) {
            let group = group.map_err(|source| PipelineError::Engine {
                id: exchange.id().to_string(),
                source,
            })?;
            self.summary.groups += 1;
            for mutant in strategy.select_mutants(&group) {
                for writer in &mut self.writers {
                    writer.write(exchange, &mutant)?;
                }
                for reporter in &mut self.reporters {
                    reporter.on_mutant(exchange, &mutant);
                }
                if let Some(callback) = self.on_mutant.as_mut() {
                    callback(exchange, &mutant);
                }
                self.summary.statistics.record(exchange.id(), &mutant);
                kept += 1;
            }
        }

        self.summary.exchanges += 1;
        self.summary.mutants += kept;
        debug!(id = exchange.id(), mutants = kept, "exchange processed");
        Ok(kept)
    }

    /// Process a canonical response document held in memory
    ///
    /// The exchange id is `label`, else the document's `id` field, else
    /// [`IN_MEMORY_ID`].
    ///
    /// # Errors
    /// Fails when the document is not a valid response, or as [`Self::process`].
    pub fn process_document(&mut self, document: &Value, label: Option<&str>) -> PipelineResult<usize> {
        let id = label
            .map(str::to_string)
            .or_else(|| match document.get("id") {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| IN_MEMORY_ID.to_string());
        let response = Response::from_value(document).map_err(|e| PipelineError::Engine {
            id: id.clone(),
            source: EngineError::Input(e),
        })?;
        self.process(&HttpExchange::response_only(response, id))
    }

    /// Kept mutant responses of one response, bypassing writers and reporters
    ///
    /// # Errors
    /// Fails without a strategy or on an engine failure.
    pub fn mutate(&mut self, response: &Response) -> PipelineResult<Vec<Response>> {
        let strategy = self
            .strategy
            .as_mut()
            .ok_or(PipelineError::MissingStrategy)?;
        let mut responses = Vec::new();
        for group in self.engine.groups(response) {
            let group = group.map_err(|source| PipelineError::Engine {
                id: IN_MEMORY_ID.to_string(),
                source,
            })?;
            responses.extend(
                strategy
                    .select_mutants(&group)
                    .into_iter()
                    .map(Mutant::into_response),
            );
        }
        Ok(responses)
    }

    /// Read every exchange from `input`, process it, then [`Self::finish`]
    ///
    /// # Errors
    /// Stops at the first read, engine or write failure. Outputs are still
    /// closed in that case; the original failure is returned.
    pub fn mutate_stream<'a>(
        &mut self,
        reader: &dyn ExchangeReader,
        input: Box<dyn BufRead + 'a>,
    ) -> PipelineResult<PipelineSummary> {
        if self.strategy.is_none() {
            return Err(PipelineError::MissingStrategy);
        }
        info!(format = %reader.format(), "reading exchanges");
        let outcome = reader
            .exchanges(input)
            .try_for_each(|exchange| self.process(&exchange?).map(drop));
        match outcome {
            Ok(()) => self.finish(),
            Err(e) => {
                if let Err(close) = self.finish() {
                    warn!(error = %close, "closing outputs after failure also failed");
                }
                Err(e)
            }
        }
    }

    /// Close every writer, then let every reporter write its report
    ///
    /// All outputs are attempted even when one fails; the first failure is
    /// returned. Outputs are released, so a second call only returns totals.
    ///
    /// # Errors
    /// The first writer or reporter failure.
    pub fn finish(&mut self) -> PipelineResult<PipelineSummary> {
        let mut first_error = None;
        for mut writer in self.writers.drain(..) {
            if let Err(e) = writer.close() {
                warn!(writer = writer.name(), error = %e, "writer failed to close");
                first_error.get_or_insert(e);
            }
        }
        for mut reporter in self.reporters.drain(..) {
            if let Err(e) = reporter.on_finished() {
                warn!(reporter = reporter.name(), error = %e, "reporter failed to finish");
                first_error.get_or_insert(e);
            }
        }
        if let Some(e) = first_error {
            return Err(e.into());
        }

        info!(
            exchanges = self.summary.exchanges,
            groups = self.summary.groups,
            mutants = self.summary.mutants,
            combinations = self.summary.statistics.unique_combinations(),
            "mutation run finished"
        );
        Ok(self.summary.clone())
    }
}

impl fmt::Debug for HttpMutator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpMutator")
            .field("engine", &self.engine)
            .field("strategy", &self.strategy.as_ref().map(|s| s.name()))
            .field("writers", &self.writers.len())
            .field("reporters", &self.reporters.len())
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{WriteError, WriteResult};
    use httpmutator_core::{AllOperatorsStrategy, Properties, RandomSingleStrategy};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn engine() -> Engine {
        Engine::new(&Properties::defaults().unwrap(), 42).unwrap()
    }

    fn document() -> Value {
        json!({
            "Status Code": 200,
            "Headers": {"Content-Type": "application/json"},
            "Body": {"a": 1}
        })
    }

    #[derive(Debug, Default)]
    struct FailingWriter {
        closed: bool,
    }

    impl MutantWriter for FailingWriter {
        fn write(&mut self, _: &HttpExchange, _: &Mutant) -> WriteResult<()> {
            Err(WriteError::Closed("failing writer"))
        }

        fn close(&mut self) -> WriteResult<()> {
            self.closed = true;
            Ok(())
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[test]
    fn refuses_to_run_without_strategy() {
        let mut mutator = HttpMutator::new(engine());
        assert!(matches!(
            mutator.process_document(&document(), None),
            Err(PipelineError::MissingStrategy)
        ));
        let response = Response::from_value(&document()).unwrap();
        assert!(matches!(mutator.mutate(&response), Err(PipelineError::MissingStrategy)));
    }

    #[test]
    fn random_strategy_keeps_one_mutant_per_group() {
        let mut mutator =
            HttpMutator::new(engine()).with_strategy(Box::new(RandomSingleStrategy::new(1)));
        let response = Response::from_value(&document()).unwrap();
        // status code, media type, body, body/a
        assert_eq!(mutator.mutate(&response).unwrap().len(), 4);
    }

    #[test]
    fn callback_sees_every_kept_mutant_with_resolved_id() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut mutator = HttpMutator::new(engine())
            .with_strategy(Box::new(AllOperatorsStrategy))
            .on_mutant(move |exchange, mutant| {
                sink.lock()
                    .unwrap()
                    .push((exchange.id().to_string(), mutant.location().to_string()));
            });

        let kept = mutator.process_document(&document(), None).unwrap();
        let mut labelled = document();
        labelled["id"] = json!(9);
        mutator.process_document(&labelled, None).unwrap();
        mutator.process_document(&document(), Some("label")).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), mutator.summary().mutants);
        assert_eq!(seen[0].0, IN_MEMORY_ID);
        assert!(seen.iter().any(|(id, _)| id == "9"));
        assert_eq!(seen.last().unwrap().0, "label");
        assert_eq!(mutator.summary().exchanges, 3);
        assert!(kept > 4);
    }

    #[test]
    fn invalid_document_names_the_exchange() {
        let mut mutator =
            HttpMutator::new(engine()).with_strategy(Box::new(AllOperatorsStrategy));
        let err = mutator
            .process_document(&json!({"Body": 1}), Some("broken"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Engine { ref id, .. } if id == "broken"));
    }

    #[test]
    fn writer_failure_stops_processing() {
        let mut mutator = HttpMutator::new(engine())
            .with_strategy(Box::new(AllOperatorsStrategy))
            .add_writer(Box::new(FailingWriter::default()));
        assert!(matches!(
            mutator.process_document(&document(), None),
            Err(PipelineError::Write(WriteError::Closed(_)))
        ));
        assert!(mutator.finish().is_ok());
    }
}
