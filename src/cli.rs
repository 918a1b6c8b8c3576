//! CLI support for query-sieve
//!
//! Holds the pieces of the `qsieve` binary that are independent of argument
//! parsing, so they can be embedded and tested without going through clap.

use std::io;

use crate::config::{Config, PopulateSpec};
use crate::handler::QueryHandler;
use crate::output::{descriptor_to_json, descriptor_to_json_pretty};

/// Errors that can occur during CLI operations
#[derive(Debug)]
pub enum CliError {
    /// IO error while reading the query from stdin
    Io(io::Error),
    /// No query string provided
    NoQuery,
    /// Unparsable `--populate` specification
    InvalidPopulate(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "IO error: {}", e),
            CliError::NoQuery => {
                write!(f, "No query provided. Pass a query string or pipe one to stdin.")
            }
            CliError::InvalidPopulate(spec) => {
                write!(
                    f,
                    "Invalid --populate '{}'. Expected FIELD, FIELD:allowed,.. or FIELD:allowed,..:defaults,..",
                    spec
                )
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

pub struct HandleOptions {
    pub query: String,
    pub config: Config,
    pub pretty: bool,
}

/// Runs one query through a handler built from the options and renders the
/// descriptor as JSON.
pub fn execute(options: HandleOptions) -> String {
    let handler = QueryHandler::new(options.config);
    let descriptor = handler.handle_str(&options.query);
    if options.pretty {
        descriptor_to_json_pretty(&descriptor)
    } else {
        descriptor_to_json(&descriptor)
    }
}

/// Parses one `--populate` flag: `FIELD`, `FIELD:a,b`, or `FIELD:a,b:c`.
/// The bare form is the wildcard rule.
pub fn parse_populate_spec(raw: &str) -> Result<(String, PopulateSpec), CliError> {
    let mut parts = raw.splitn(3, ':');
    let field = match parts.next() {
        Some(field) if !field.is_empty() => field.to_string(),
        _ => return Err(CliError::InvalidPopulate(raw.to_string())),
    };

    let allowed = parts.next().map(split_list);
    let defaults = parts.next().map(split_list);

    if allowed.as_ref().is_some_and(|list| list.is_empty()) {
        return Err(CliError::InvalidPopulate(raw.to_string()));
    }

    Ok((
        field,
        PopulateSpec {
            allowed_fields: allowed,
            default_fields: defaults,
        },
    ))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
