//! HttpMutator Core
//!
//! Mutant generation for canonical HTTP responses.
//!
//! # Core Concepts
//!
//! - [`Operator`]: one atomic, pure mutation of a JSON value
//! - [`Mutator`]: the ordered operators enabled for one value kind
//! - [`Engine`]: walks status code, headers and body and yields one
//!   [`MutantGroup`] per mutation site through [`MutantGroups`]
//! - [`MutationStrategy`]: picks which mutants of a group are kept
//! - [`Properties`]: flat configuration driving which operators exist
//!
//! # Example
//!
//! ```rust
//! use httpmutator_core::{Engine, Response};
//! use serde_json::json;
//!
//! let mut engine = Engine::with_defaults().unwrap();
//! let response = Response::from_value(&json!({
//!     "Status Code": 200,
//!     "Headers": {"Content-Type": "application/json"},
//!     "Body": {"a": 1}
//! }))
//! .unwrap();
//!
//! for group in engine.groups(&response) {
//!     let group = group.unwrap();
//!     println!("{}: {} mutants", group.identifier(), group.len());
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod assembly;
mod config;
mod content_type;
mod engine;
mod error;
mod model;
pub mod mutators;
mod operator;
mod rng;
mod strategy;

pub use config::{Properties, Section};
pub use content_type::ContentTypeComponents;
pub use engine::{Engine, MutantGroups};
pub use error::{AssemblyError, ConfigError, ConfigResult, EngineError, EngineResult, InputError};
pub use model::{
    kind_name, Headers, Mutant, MutantGroup, MutatorKind, OperatorKind, Response, BODY_FIELD,
    BODY_LOCATION, CHARSET_LOCATION, HEADERS_FIELD, LOCATION_LOCATION, MEDIA_TYPE_LOCATION,
    STATUS_CODE_FIELD, STATUS_CODE_LOCATION,
};
pub use mutators::MutatorSet;
pub use operator::{Mutator, MutatorBuilder, Operator, OperatorEntry, FIRST_LEVEL_ONLY};
pub use rng::{MutationRng, DEFAULT_SEED};
pub use strategy::{
    AllOperatorsStrategy, MutationStrategy, RandomSingleStrategy, StrategyName,
    WeightedRandomStrategy,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{
        Engine, Headers, Mutant, MutantGroup, MutationStrategy, MutatorKind, OperatorKind,
        Properties, Response, StrategyName,
    };
}
