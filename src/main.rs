use clap::Parser as ClapParser;
use query_sieve::cli::{self, CliError, HandleOptions};
use query_sieve::{Config, PopulateSpec};
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "qsieve")]
#[command(about = "Translate a comma-delimited HTTP query string into a document-store query descriptor")]
#[command(version)]
struct Cli {
    /// The query string to translate (reads from stdin if not provided)
    query: Option<String>,

    /// Comma-separated list of allowed top-level fields (omit to allow all)
    #[arg(long, value_name = "FIELDS")]
    allow: Option<String>,

    /// Comma-separated default projection
    #[arg(long, value_name = "FIELDS")]
    default_fields: Option<String>,

    /// Filter the requested projection against the allow list
    #[arg(long)]
    validate_fields: bool,

    /// Population rule, repeatable: FIELD, FIELD:allowed,.. or FIELD:allowed,..:defaults,..
    #[arg(long, value_name = "SPEC")]
    populate: Vec<String>,

    /// Suffix marking population keys
    #[arg(long, default_value = "-populate")]
    populate_suffix: String,

    /// Query key carrying the page number (or raw skip count)
    #[arg(long, default_value = "page")]
    offset_name: String,

    /// Query key carrying the page size
    #[arg(long, default_value = "per_page")]
    limit_name: String,

    /// Treat the offset value as a raw skip count instead of a 1-based page
    #[arg(long)]
    raw_paging: bool,

    /// Pretty-print the output
    #[arg(short, long)]
    pretty: bool,
}

fn main() {
    let args = Cli::parse();

    match run(args) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: Cli) -> Result<String, CliError> {
    let query = match args.query {
        Some(query) => query,
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer.trim().to_string()
        }
        None => return Err(CliError::NoQuery),
    };
    if query.is_empty() {
        return Err(CliError::NoQuery);
    }

    let populate_fields: Vec<(String, PopulateSpec)> = args
        .populate
        .iter()
        .map(|spec| cli::parse_populate_spec(spec))
        .collect::<Result<_, _>>()?;

    let config = Config {
        user_friendly_paging: !args.raw_paging,
        offset_name: args.offset_name,
        limit_name: args.limit_name,
        validate_returned_fields: args.validate_fields,
        allowed_fields: args.allow.as_deref().map(split_fields),
        default_fields: args.default_fields.as_deref().map(split_fields),
        populate_suffix: args.populate_suffix,
        populate_fields,
    };

    Ok(cli::execute(HandleOptions {
        query,
        config,
        pretty: args.pretty,
    }))
}

fn split_fields(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(str::to_string)
        .collect()
}
