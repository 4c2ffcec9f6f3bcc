//! Mutation engine
//!
//! The engine walks a canonical response in a fixed order and produces one
//! [`MutantGroup`] per mutation site:
//!
//! 1. `Status Code`
//! 2. `Headers/content-type/mediaType`, `Headers/content-type/charset`
//! 3. `Headers/location`
//! 4. `Body`, then (when recursive) every nested body value in document
//!    order, e.g. `Body/items/0/price`
//!
//! Groups are produced lazily by [`MutantGroups`], so only one group is
//! alive at a time. Every operator draws from the engine's single
//! [`MutationRng`]; the same input, configuration and seed always yield the
//! same groups.

use crate::assembly;
use crate::config::Properties;
use crate::content_type::ContentTypeComponents;
use crate::error::{AssemblyError, ConfigResult, EngineResult, InputError};
use crate::model::{
    Mutant, MutantGroup, OperatorKind, Response, CHARSET_LOCATION, LOCATION_LOCATION,
    MEDIA_TYPE_LOCATION, STATUS_CODE_LOCATION,
};
use crate::mutators::MutatorSet;
use crate::operator::{Mutator, FIRST_LEVEL_ONLY};
use crate::rng::{MutationRng, DEFAULT_SEED};
use serde_json::Value;
use tracing::{debug, warn};

const CONTENT_TYPE: &str = "content-type";
const LOCATION: &str = "location";

/// Generates mutant groups for canonical responses
#[derive(Debug)]
pub struct Engine {
    mutators: MutatorSet,
    rng: MutationRng,
}

impl Engine {
    /// Create engine from configuration and seed
    ///
    /// # Errors
    /// Fails when any mutator cannot be built from `properties`.
    pub fn new(properties: &Properties, seed: u64) -> ConfigResult<Self> {
        Ok(Self::from_parts(
            MutatorSet::from_properties(properties)?,
            MutationRng::new(seed),
        ))
    }

    /// Engine with built-in defaults and seed 42
    ///
    /// # Errors
    /// Only fails if the embedded defaults are broken.
    pub fn with_defaults() -> ConfigResult<Self> {
        Self::new(&Properties::defaults()?, DEFAULT_SEED)
    }

    /// Create engine from prepared parts
    #[inline]
    #[must_use]
    pub fn from_parts(mutators: MutatorSet, rng: MutationRng) -> Self {
        Self { mutators, rng }
    }

    /// Restart the random sequence
    pub fn reseed(&mut self, seed: u64) {
        self.rng.reseed(seed);
    }

    /// Random generator state
    #[inline]
    #[must_use]
    pub fn rng(&self) -> &MutationRng {
        &self.rng
    }

    /// Configured mutators
    #[inline]
    #[must_use]
    pub fn mutators(&self) -> &MutatorSet {
        &self.mutators
    }

    /// Lazily generate the groups of `response`
    pub fn groups(&mut self, response: &Response) -> MutantGroups<'_> {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .map(ContentTypeComponents::parse);
        MutantGroups {
            engine: self,
            original: response.clone(),
            content_type,
            stage: Stage::StatusCode,
            body_sites: Vec::new(),
        }
    }

    /// Validate a canonical JSON document and generate its groups
    ///
    /// # Errors
    /// Fails when the document is not a valid canonical response.
    pub fn groups_from_value(&mut self, document: &Value) -> Result<MutantGroups<'_>, InputError> {
        let response = Response::from_value(document)?;
        Ok(self.groups(&response))
    }

    /// Push every group of `response` into `sink`
    ///
    /// Returns the number of groups delivered.
    ///
    /// # Errors
    /// Stops at the first input error; groups already delivered stay
    /// delivered.
    pub fn for_each_group<F>(&mut self, response: &Response, mut sink: F) -> EngineResult<usize>
    where
        F: FnMut(MutantGroup),
    {
        let mut delivered = 0;
        for group in self.groups(response) {
            sink(group?);
            delivered += 1;
        }
        Ok(delivered)
    }

    /// Collect every group of `response`
    ///
    /// # Errors
    /// See [`for_each_group`](Self::for_each_group).
    pub fn collect_groups(&mut self, response: &Response) -> EngineResult<Vec<MutantGroup>> {
        self.groups(response).collect()
    }

    /// Apply the applicable operators of `mutator` to `value`
    fn run_mutator<A>(
        &mut self,
        mutator_of: fn(&MutatorSet) -> &Mutator,
        excluded: &[OperatorKind],
        location: &str,
        value: &Value,
        assemble: A,
    ) -> MutantGroup
    where
        A: Fn(Value) -> Result<Response, AssemblyError>,
    {
        let mutator = mutator_of(&self.mutators);
        let mut mutants = Vec::new();
        for entry in mutator.effective_operators(excluded) {
            let operator = entry.operator();
            if !operator.is_applicable(value) || self.rng.should_skip(mutator.prob()) {
                continue;
            }
            let mutated = operator.mutate(value, &mut self.rng);
            match assemble(mutated) {
                Ok(response) => mutants.push(Mutant::new(
                    location,
                    response,
                    mutator.kind(),
                    entry.kind(),
                    entry.weight(),
                )),
                Err(error) => warn!(
                    location,
                    mutator = %mutator.kind(),
                    operator = %entry.kind(),
                    %error,
                    "dropping mutant that cannot be assembled"
                ),
            }
        }
        MutantGroup::new(location, mutants)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    StatusCode,
    MediaType,
    Charset,
    Location,
    BodyRoot,
    BodyNested,
    Done,
}

/// Lazy, single-pass sequence of mutant groups for one response
///
/// Empty groups are never yielded. After an error the iterator is
/// exhausted.
#[derive(Debug)]
pub struct MutantGroups<'e> {
    engine: &'e mut Engine,
    original: Response,
    content_type: Option<ContentTypeComponents>,
    stage: Stage,
    body_sites: Vec<String>,
}

impl MutantGroups<'_> {
    /// Response being mutated
    #[inline]
    #[must_use]
    pub fn original(&self) -> &Response {
        &self.original
    }

    fn status_group(&mut self) -> MutantGroup {
        let original = &self.original;
        let value = Value::from(original.status_code());
        self.engine.run_mutator(
            |m| &m.status_code,
            &[],
            STATUS_CODE_LOCATION,
            &value,
            |mutated| assembly::with_status(original, &mutated),
        )
    }

    fn media_type_group(&mut self) -> Option<MutantGroup> {
        let components = self.content_type.as_ref()?;
        let original = &self.original;
        let value = components
            .media_type
            .clone()
            .map_or(Value::Null, Value::String);
        let excluded = absent_target(&value);
        Some(self.engine.run_mutator(
            |m| &m.media_type,
            excluded,
            MEDIA_TYPE_LOCATION,
            &value,
            |mutated| {
                let rebuilt = components.with_media_type(component_text(mutated));
                assembly::with_header(original, CONTENT_TYPE, &Value::String(rebuilt.to_string()))
            },
        ))
    }

    fn charset_group(&mut self) -> Option<MutantGroup> {
        let components = self.content_type.as_ref()?;
        let original = &self.original;
        let value = components
            .charset
            .clone()
            .map_or(Value::Null, Value::String);
        let excluded = absent_target(&value);
        Some(self.engine.run_mutator(
            |m| &m.charset,
            excluded,
            CHARSET_LOCATION,
            &value,
            |mutated| {
                let rebuilt = components.with_charset(component_text(mutated));
                assembly::with_header(original, CONTENT_TYPE, &Value::String(rebuilt.to_string()))
            },
        ))
    }

    fn location_group(&mut self) -> Option<MutantGroup> {
        let original = &self.original;
        let value = Value::String(original.headers().get(LOCATION)?.to_string());
        Some(self.engine.run_mutator(
            |m| &m.location,
            absent_target(&value),
            LOCATION_LOCATION,
            &value,
            |mutated| assembly::with_header(original, LOCATION, &mutated),
        ))
    }

    /// Group for the body site at `pointer`; queues its children
    fn body_group(&mut self, pointer: &str) -> EngineResult<Option<MutantGroup>> {
        let original = &self.original;
        let Some(value) = original.body().pointer(pointer) else {
            return Ok(None);
        };
        let is_root = pointer.is_empty();

        if self.engine.mutators.recursive {
            let children: Vec<String> = match value {
                Value::Object(map) => map
                    .keys()
                    .map(|k| assembly::child_pointer(pointer, k))
                    .collect(),
                Value::Array(items) => (0..items.len())
                    .map(|i| assembly::child_pointer(pointer, &i.to_string()))
                    .collect(),
                _ => Vec::new(),
            };
            self.body_sites.extend(children.into_iter().rev());
        }

        if is_root && value.is_null() {
            debug!("null body, no body mutants");
            return Ok(None);
        }

        let location = assembly::body_location(pointer);
        let mutator_of: fn(&MutatorSet) -> &Mutator = match value {
            Value::Null => |m| &m.null,
            Value::Bool(_) => |m| &m.boolean,
            Value::Number(n) if n.is_i64() => |m| &m.long,
            Value::Number(n) if n.is_f64() => |m| &m.double,
            Value::Number(_) => {
                return Err(InputError::UnsupportedBodyKind {
                    path: location,
                    value: value.to_string(),
                }
                .into())
            }
            Value::String(_) => |m| &m.string,
            Value::Array(_) => |m| &m.array,
            Value::Object(_) => |m| &m.object,
        };
        let excluded: &[OperatorKind] = if !is_root && (value.is_object() || value.is_array()) {
            &FIRST_LEVEL_ONLY
        } else {
            &[]
        };
        let group = self.engine.run_mutator(
            mutator_of,
            excluded,
            &location,
            value,
            |mutated| assembly::with_body_at(original, pointer, mutated),
        );
        Ok(Some(group))
    }

    fn advance(&mut self) -> EngineResult<Option<MutantGroup>> {
        loop {
            let group = match self.stage {
                Stage::StatusCode => {
                    self.stage = Stage::MediaType;
                    Some(self.status_group())
                }
                Stage::MediaType => {
                    self.stage = Stage::Charset;
                    self.media_type_group()
                }
                Stage::Charset => {
                    self.stage = Stage::Location;
                    self.charset_group()
                }
                Stage::Location => {
                    self.stage = Stage::BodyRoot;
                    self.location_group()
                }
                Stage::BodyRoot => {
                    self.stage = Stage::BodyNested;
                    if self.engine.mutators.body_enabled {
                        self.body_group("")?
                    } else {
                        self.stage = Stage::Done;
                        None
                    }
                }
                Stage::BodyNested => match self.body_sites.pop() {
                    Some(pointer) => self.body_group(&pointer)?,
                    None => {
                        self.stage = Stage::Done;
                        None
                    }
                },
                Stage::Done => return Ok(None),
            };
            match group {
                Some(group) if !group.is_empty() => {
                    debug!(
                        identifier = group.identifier(),
                        mutants = group.len(),
                        "mutant group ready"
                    );
                    return Ok(Some(group));
                }
                _ => {}
            }
        }
    }
}

impl Iterator for MutantGroups<'_> {
    type Item = EngineResult<MutantGroup>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(group) => group.map(Ok),
            Err(error) => {
                self.stage = Stage::Done;
                self.body_sites.clear();
                Some(Err(error))
            }
        }
    }
}

impl std::iter::FusedIterator for MutantGroups<'_> {}

/// `[Null]` when the header target is missing, so it is not "removed" again
fn absent_target(value: &Value) -> &'static [OperatorKind] {
    const NULL_ONLY: [OperatorKind; 1] = [OperatorKind::Null];
    if value.is_null() {
        &NULL_ONLY
    } else {
        &[]
    }
}

fn component_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() && s != "null" => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Headers, MutatorKind};
    use serde_json::json;

    fn response(headers: &[(&str, &str)], body: Value) -> Response {
        Response::new(200, headers.iter().copied().collect(), body).unwrap()
    }

    fn identifiers(groups: &[MutantGroup]) -> Vec<&str> {
        groups.iter().map(MutantGroup::identifier).collect()
    }

    #[test]
    fn group_order_follows_response_layout() {
        let mut engine = Engine::with_defaults().unwrap();
        let original = response(
            &[("Content-Type", "text/html; charset=UTF-8"), ("Location", "/x")],
            json!({"a": 1}),
        );
        let groups = engine.collect_groups(&original).unwrap();
        assert_eq!(
            identifiers(&groups),
            vec![
                "Status Code",
                "Headers/content-type/mediaType",
                "Headers/content-type/charset",
                "Headers/location",
                "Body",
                "Body/a"
            ]
        );
    }

    #[test]
    fn empty_headers_and_null_body_give_status_only() {
        let mut engine = Engine::with_defaults().unwrap();
        let groups = engine
            .collect_groups(&response(&[], Value::Null))
            .unwrap();
        assert_eq!(identifiers(&groups), vec!["Status Code"]);
    }

    #[test]
    fn nested_containers_skip_null_and_change_type() {
        let mut engine = Engine::with_defaults().unwrap();
        let groups = engine
            .collect_groups(&response(&[], json!({"items": [1, 2]})))
            .unwrap();
        let nested = groups
            .iter()
            .find(|g| g.identifier() == "Body/items")
            .unwrap();
        assert!(nested.mutants().iter().all(|m| !matches!(
            m.operator(),
            OperatorKind::Null | OperatorKind::ChangeType
        )));
        let root = groups.iter().find(|g| g.identifier() == "Body").unwrap();
        assert!(root
            .mutants()
            .iter()
            .any(|m| m.operator() == OperatorKind::Null));
    }

    #[test]
    fn non_recursive_body_has_single_group() {
        let props = Properties::defaults()
            .unwrap()
            .with("operator.body.recursive", false);
        let mut engine = Engine::new(&props, 1).unwrap();
        let groups = engine
            .collect_groups(&response(&[], json!({"a": {"b": [true]}})))
            .unwrap();
        assert_eq!(identifiers(&groups), vec!["Status Code", "Body"]);
    }

    #[test]
    fn unsupported_number_is_fatal_and_fuses() {
        let mut engine = Engine::with_defaults().unwrap();
        let original = response(&[], json!({"big": u64::MAX}));
        let mut groups = engine.groups(&original);
        assert!(groups.next().unwrap().is_ok());
        assert!(groups.next().unwrap().is_ok());
        let err = groups.next().unwrap().unwrap_err();
        assert!(err.to_string().contains("Body/big"));
        assert!(groups.next().is_none());
    }

    #[test]
    fn header_mutants_keep_field_name_and_other_params() {
        let mut engine = Engine::with_defaults().unwrap();
        let original = response(&[("content-TYPE", "text/html; charset=UTF-8; version=2")], Value::Null);
        let groups = engine.collect_groups(&original).unwrap();
        let charset = groups
            .iter()
            .find(|g| g.identifier() == CHARSET_LOCATION)
            .unwrap();
        for mutant in charset.mutants() {
            let headers: &Headers = mutant.response().headers();
            assert_eq!(headers.field_name("content-type"), Some("content-TYPE"));
            let value = headers.get("content-type").unwrap();
            assert!(value.starts_with("text/html"));
            assert!(value.ends_with("version=2"));
            assert_eq!(mutant.mutator(), MutatorKind::Charset);
        }
        let null = charset
            .mutants()
            .iter()
            .find(|m| m.operator() == OperatorKind::Null)
            .unwrap();
        assert_eq!(
            null.response().headers().get("content-type"),
            Some("text/html; version=2")
        );
    }

    #[test]
    fn location_null_removes_the_header() {
        let mut engine = Engine::with_defaults().unwrap();
        let original = response(&[("Location", "https://h/a")], Value::Null);
        let groups = engine.collect_groups(&original).unwrap();
        let location = groups
            .iter()
            .find(|g| g.identifier() == LOCATION_LOCATION)
            .unwrap();
        let kinds: Vec<_> = location.mutants().iter().map(Mutant::operator).collect();
        assert_eq!(kinds, vec![OperatorKind::Mutate, OperatorKind::Null]);
        assert!(!location.mutants()[1].response().headers().contains("location"));
    }

    #[test]
    fn reseed_reproduces_groups() {
        let original = response(&[("Content-Type", "application/json")], json!({"s": "abc", "n": [1, 2, 3]}));
        let mut engine = Engine::with_defaults().unwrap();
        let first = engine.collect_groups(&original).unwrap();
        engine.reseed(DEFAULT_SEED);
        let second = engine.collect_groups(&original).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn groups_from_value_rejects_bad_documents() {
        let mut engine = Engine::with_defaults().unwrap();
        assert!(engine.groups_from_value(&json!({"Body": 1})).is_err());
        assert_eq!(
            engine
                .groups_from_value(&json!({"Status Code": 201}))
                .unwrap()
                .count(),
            1
        );
    }

    #[derive(Debug)]
    struct FixedStatus(OperatorKind, u64);

    impl crate::operator::Operator for FixedStatus {
        fn kind(&self) -> OperatorKind {
            self.0
        }

        fn mutate(&self, _value: &Value, _rng: &mut MutationRng) -> Value {
            json!(self.1)
        }
    }

    #[test]
    fn unassemblable_mutant_is_dropped_and_group_continues() {
        let mut mutators = MutatorSet::from_properties(&Properties::defaults().unwrap()).unwrap();
        let mut status = Mutator::new(MutatorKind::StatusCode);
        status.insert(FixedStatus(OperatorKind::ReplaceWith2xx, 42), 1.0);
        status.insert(FixedStatus(OperatorKind::ReplaceWith5xx, 503), 1.0);
        mutators.status_code = status;
        let mut engine = Engine::from_parts(mutators, MutationRng::new(1));

        let groups = engine
            .collect_groups(&response(&[], Value::Null))
            .unwrap();
        assert_eq!(identifiers(&groups), vec!["Status Code"]);
        let mutants = groups[0].mutants();
        assert_eq!(mutants.len(), 1);
        assert_eq!(mutants[0].operator(), OperatorKind::ReplaceWith5xx);
        assert_eq!(mutants[0].response().status_code(), 503);
    }

    #[test]
    fn for_each_group_counts_deliveries() {
        let mut engine = Engine::with_defaults().unwrap();
        let mut seen = Vec::new();
        let delivered = engine
            .for_each_group(&response(&[], json!([true])), |g| {
                seen.push(g.identifier().to_string());
            })
            .unwrap();
        assert_eq!(delivered, seen.len());
        assert_eq!(seen, vec!["Status Code", "Body", "Body/0"]);
    }
}
