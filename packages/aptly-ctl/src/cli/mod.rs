//! Subcommand handlers shared by the `aptly-ctl` and `didww-aptly-ctl`
//! binaries.
//!
//! The binaries are thin wrappers around this module: they parse global flags,
//! set up logging and configuration, and hand the chosen subcommand to one of
//! the `handle_*` functions here. Handlers return the text to print, so the
//! binaries decide how output and errors reach the terminal.

use std::process::ExitCode;

use clap::{CommandFactory, Parser, error::ErrorKind};
use tabled::settings::Style;

use crate::{Error, PubSpec, error::EXIT_VALIDATION, logging::Logging};

pub mod package;
pub mod publish;
pub mod repo;
pub mod snapshot;
pub mod version;

/// Parse the command line.
///
/// `--help` and `--version` end the run successfully; usage errors end it
/// with the validation exit code.
pub fn parse_args<P: Parser>() -> Result<P, ExitCode> {
    P::try_parse().map_err(|err| {
        // Nothing left to report to if stderr is gone.
        let _ = err.print();
        match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
            _ => ExitCode::from(EXIT_VALIDATION),
        }
    })
}

/// Print help for a run without a subcommand.
pub fn missing_subcommand<P: CommandFactory>() -> ExitCode {
    let _ = P::command().print_help();
    ExitCode::from(EXIT_VALIDATION)
}

/// Print a handler's output, or report its error, and pick the exit code.
pub fn finish(result: Result<String, Error>, logging: &Logging) -> ExitCode {
    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => logging.report(&err),
    }
}

/// Parse a PUB_SPEC argument.
pub fn parse_pub_spec(text: &str) -> Result<PubSpec, Error> {
    text.parse().map_err(|source| Error::pub_spec(text, source))
}

/// Turn any API error into a domain error.
fn api_into_domain(err: Error) -> Error {
    match err {
        Error::Api(api) => Error::domain(api),
        other => other,
    }
}

/// Turn a 404 from the API into a domain error; other errors pass through.
fn not_found_into_domain(err: Error) -> Error {
    match err {
        Error::Api(api) if api.is_not_found() => Error::domain(api),
        other => other,
    }
}

/// Render rows as a table, header first.
fn table<R, C>(header: &[&str], rows: R) -> String
where
    R: IntoIterator<Item = C>,
    C: IntoIterator<Item = String>,
{
    let mut builder = tabled::builder::Builder::new();
    builder.push_record(header.iter().map(|h| h.to_string()));
    for row in rows {
        builder.push_record(row);
    }
    let mut table = builder.build();
    table.with(Style::modern());
    table.to_string()
}
