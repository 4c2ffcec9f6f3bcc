use anyhow::anyhow;
use httpmutator_cli::{run, CliError, Options, ParseFailure};
use tracing_subscriber::EnvFilter;

fn main() {
    let options = match Options::parse_from(std::env::args_os()) {
        Ok(options) => options,
        Err(ParseFailure::Clap(e)) => {
            // --help and --version land here too
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
        Err(ParseFailure::Cli(e)) => exit_with(&e.into()),
    };

    if let Err(e) = init_tracing(options.verbose) {
        eprintln!("warning: {e}");
    }

    match run(&options) {
        Ok(summary) => {
            println!(
                "{} exchanges, {} groups, {} mutants written to {}",
                summary.exchanges,
                summary.groups,
                summary.mutants,
                options.output.display()
            );
        }
        Err(e) => exit_with(&e.into()),
    }
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("cannot initialise logging: {e}"))
}

fn exit_with(error: &anyhow::Error) -> ! {
    eprintln!("error: {error:#}");
    let code = error.downcast_ref::<CliError>().map_or(99, CliError::exit_code);
    std::process::exit(code);
}
