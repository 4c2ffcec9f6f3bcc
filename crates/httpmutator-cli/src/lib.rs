//! HttpMutator command line
//!
//! Argument parsing and the run loop behind the `httpmutator` binary. The
//! binary itself only sets up logging and maps failures to exit codes.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use httpmutator_core::{ConfigError, Engine, Properties, StrategyName, DEFAULT_SEED};
use httpmutator_io::{
    CsvReporter, HarWriter, HttpMutator, InputFormat, JsonlWriter, PipelineError,
    PipelineSummary, ReporterKind, ShardedZstdWriter, StatisticsReporter, WriteError,
};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default output directory
pub const DEFAULT_OUTPUT: &str = "hm-output";

/// Command line failures, each with its exit code
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Arguments are inconsistent
    #[error("{0}")]
    Usage(String),

    /// Configuration could not be loaded or is invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input or output file problem
    #[error("{context}: {source}")]
    Io {
        /// What was being accessed
        context: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The mutation run failed
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl CliError {
    /// Process exit code: 1 usage or config, 2 I/O, 99 anything else
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 1,
            Self::Config(ConfigError::Io { .. }) | Self::Io { .. } => 2,
            Self::Config(_) => 1,
            Self::Pipeline(e) if e.is_io() => 2,
            Self::Pipeline(_) => 99,
        }
    }

    fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

impl From<WriteError> for CliError {
    fn from(e: WriteError) -> Self {
        Self::Pipeline(e.into())
    }
}

/// Result alias for the command line
pub type CliResult<T> = Result<T, CliError>;

/// Parsed command line
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Input file
    pub input: PathBuf,
    /// Input format
    pub format: InputFormat,
    /// Output directory
    pub output: PathBuf,
    /// Seed for the engine and the strategy
    pub seed: u64,
    /// Mutant selection strategy
    pub strategy: StrategyName,
    /// Add `_hm_*` metadata to JSONL output
    pub include_meta: bool,
    /// Reports to write
    pub reporters: Vec<ReporterKind>,
    /// Write `<base>-mutants.jsonl`
    pub write_jsonl: bool,
    /// Write `<base>-mutants.har`
    pub write_har: bool,
    /// Write `<base>-mutants-NNNNN.jsonl.zst` shards
    pub write_zstd: bool,
    /// TOML file layered over the built-in configuration
    pub config: Option<PathBuf>,
    /// Debug logging
    pub verbose: bool,
}

/// Command definition
#[must_use]
pub fn command() -> Command {
    Command::new("httpmutator")
        .version(httpmutator_core::VERSION)
        .about("Generate mutated HTTP responses for mutation testing of API clients")
        .arg(
            Arg::new("input")
                .long("input")
                .short('i')
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Input file (.jsonl, .har or .har.json)"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .value_parser(value_parser!(String))
                .help("Input format: jsonl or har (inferred from the file name if omitted)"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .default_value(DEFAULT_OUTPUT)
                .value_parser(value_parser!(PathBuf))
                .help("Output directory"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .default_value("42")
                .value_parser(value_parser!(u64))
                .help("Random seed for reproducibility"),
        )
        .arg(
            Arg::new("strategy")
                .long("strategy")
                .short('s')
                .default_value("random")
                .value_parser(value_parser!(String))
                .help("Mutant selection: random, all, exhaustive or weighted"),
        )
        .arg(
            Arg::new("include-meta")
                .long("include-meta")
                .action(ArgAction::SetTrue)
                .help("Add _hm_* provenance fields to JSONL mutants"),
        )
        .arg(
            Arg::new("reporter")
                .long("reporter")
                .action(ArgAction::Append)
                .value_parser(value_parser!(String))
                .help("Report to write: csv, stats or none (repeatable)"),
        )
        .arg(
            Arg::new("write-jsonl")
                .long("write-jsonl")
                .action(ArgAction::SetTrue)
                .help("Write mutants as JSONL (default when no writer is chosen)"),
        )
        .arg(
            Arg::new("write-har")
                .long("write-har")
                .action(ArgAction::SetTrue)
                .help("Write mutants as a HAR archive"),
        )
        .arg(
            Arg::new("write-zstd")
                .long("write-zstd")
                .action(ArgAction::SetTrue)
                .help("Write mutants as zstd-compressed JSONL shards"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("TOML file overriding the built-in mutation settings"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::SetTrue)
                .help("Debug logging"),
        )
}

impl Options {
    /// Interpret parsed arguments
    ///
    /// # Errors
    /// Fails with [`CliError::Usage`] for unknown names or an input format
    /// that cannot be inferred.
    pub fn from_matches(matches: &ArgMatches) -> CliResult<Self> {
        let input = matches
            .get_one::<PathBuf>("input")
            .cloned()
            .ok_or_else(|| CliError::Usage("--input is required".into()))?;

        let format = match matches.get_one::<String>("format") {
            Some(name) => name.parse().map_err(CliError::Usage)?,
            None => InputFormat::from_path(&input).ok_or_else(|| {
                CliError::Usage(format!(
                    "cannot infer the format of {}, pass --format jsonl|har",
                    input.display()
                ))
            })?,
        };

        let strategy = matches
            .get_one::<String>("strategy")
            .map_or(Ok(StrategyName::default()), |s| s.parse())
            .map_err(CliError::Usage)?;

        let reporters = matches
            .get_many::<String>("reporter")
            .into_iter()
            .flatten()
            .map(|name| name.parse::<ReporterKind>().map_err(CliError::Usage))
            .collect::<CliResult<Vec<_>>>()?;

        let write_har = matches.get_flag("write-har");
        let write_zstd = matches.get_flag("write-zstd");
        let write_jsonl = matches.get_flag("write-jsonl") || !(write_har || write_zstd);

        Ok(Self {
            input,
            format,
            output: matches
                .get_one::<PathBuf>("output")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            seed: matches
                .get_one::<u64>("seed")
                .copied()
                .unwrap_or(DEFAULT_SEED),
            strategy,
            include_meta: matches.get_flag("include-meta"),
            reporters,
            write_jsonl,
            write_har,
            write_zstd,
            config: matches.get_one::<PathBuf>("config").cloned(),
            verbose: matches.get_flag("verbose"),
        })
    }

    /// Parse an argument list (first item is the program name)
    ///
    /// # Errors
    /// Fails on clap errors or as [`Self::from_matches`].
    pub fn parse_from<I, T>(args: I) -> Result<Self, ParseFailure>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = command().try_get_matches_from(args)?;
        Ok(Self::from_matches(&matches)?)
    }

    /// Input file name without its format extension
    #[must_use]
    pub fn base_name(&self) -> String {
        let name = self
            .input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let lower = name.to_ascii_lowercase();
        for suffix in [".har.json", ".jsonl", ".har", ".json"] {
            if lower.ends_with(suffix) && lower.len() > suffix.len() {
                return name[..name.len() - suffix.len()].to_string();
            }
        }
        if name.is_empty() {
            "input".to_string()
        } else {
            name
        }
    }

    /// Path of one output file: `<output>/<base>-<suffix>`
    #[must_use]
    pub fn output_file(&self, suffix: &str) -> PathBuf {
        self.output.join(format!("{}-{suffix}", self.base_name()))
    }
}

/// Failure while parsing the command line
#[derive(Debug, thiserror::Error)]
pub enum ParseFailure {
    /// clap rejected the arguments (includes `--help` and `--version`)
    #[error(transparent)]
    Clap(#[from] clap::Error),

    /// Arguments parsed but are not usable
    #[error(transparent)]
    Cli(#[from] CliError),
}

/// Load configuration, build the pipeline and mutate the whole input
///
/// # Errors
/// Any configuration, I/O or pipeline failure.
pub fn run(options: &Options) -> CliResult<PipelineSummary> {
    let properties = match &options.config {
        Some(path) => Properties::load(path)?,
        None => Properties::defaults()?,
    };
    let engine = Engine::new(&properties, options.seed)?;

    fs::create_dir_all(&options.output).map_err(|e| {
        CliError::io(format!("cannot create {}", options.output.display()), e)
    })?;

    let mut mutator =
        HttpMutator::new(engine).with_strategy(options.strategy.build(options.seed));
    if options.write_jsonl {
        let path = options.output_file("mutants.jsonl");
        mutator = mutator.add_writer(Box::new(JsonlWriter::create(&path, options.include_meta)?));
    }
    if options.write_har {
        mutator = mutator.add_writer(Box::new(HarWriter::create(
            options.output_file("mutants.har"),
        )?));
    }
    if options.write_zstd {
        mutator = mutator.add_writer(Box::new(ShardedZstdWriter::create(
            &options.output,
            format!("{}-mutants", options.base_name()),
            options.include_meta,
        )?));
    }
    for reporter in &options.reporters {
        mutator = match reporter {
            ReporterKind::Csv => mutator.add_reporter(Box::new(CsvReporter::create(
                options.output_file("report.csv"),
            )?)),
            ReporterKind::Stats => mutator.add_reporter(Box::new(StatisticsReporter::create(
                options.output_file("stats.csv"),
            )?)),
            ReporterKind::None => mutator,
        };
    }

    info!(
        input = %options.input.display(),
        format = %options.format,
        strategy = %options.strategy,
        seed = options.seed,
        "mutating"
    );
    let input = open_input(&options.input)?;
    let reader = options.format.reader();
    Ok(mutator.mutate_stream(reader.as_ref(), Box::new(input))?)
}

fn open_input(path: &Path) -> CliResult<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| CliError::io(format!("cannot open {}", path.display()), e))
}
