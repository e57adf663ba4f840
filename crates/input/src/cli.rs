//! Command line options, used when the request is not coming from a web server.

use clap::Parser;

/// Identifies a command line option either by name or by argv position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliKey<'a> {
    Named(&'a str),
    /// Position `n` is the `n`th positional argument; 0 is the program itself.
    Position(usize),
}

pub trait CliOptions: Send + Sync {
    fn option(&self, key: CliKey<'_>) -> Option<&str>;
}

/// Command line of a request run from a shell.
///
/// ```
/// use clap::Parser;
/// use micro_input::{CliArgs, CliKey, CliOptions};
///
/// let args = CliArgs::parse_from(["micro-input-cgi", "-o", "lang=en", "users/5"]);
/// assert_eq!(args.option(CliKey::Position(1)), Some("users/5"));
/// assert_eq!(args.option(CliKey::Named("lang")), Some("en"));
/// ```
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "micro-input-cgi", version, about = "Shows how a request is seen through micro-input")]
pub struct CliArgs {
    /// Path to route, takes precedence over the first positional argument
    #[arg(long)]
    pub uri: Option<String>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// Additional named option, repeatable
    #[arg(short = 'o', long = "option", value_name = "NAME=VALUE", value_parser = name_value)]
    pub options: Vec<(String, String)>,

    /// Positional arguments, the first one being the path to route
    pub args: Vec<String>,
}

fn name_value(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_owned(), value.to_owned())),
        _ => Err(format!("expected NAME=VALUE, got `{arg}`")),
    }
}

impl CliOptions for CliArgs {
    fn option(&self, key: CliKey<'_>) -> Option<&str> {
        match key {
            CliKey::Named("uri") => self.uri.as_deref(),
            CliKey::Named("verbose") => self.verbose.then_some("true"),
            CliKey::Named(name) => self.options.iter().rev().find(|(n, _)| n == name).map(|(_, v)| v.as_str()),
            CliKey::Position(0) => None,
            CliKey::Position(index) => self.args.get(index - 1).map(String::as_str),
        }
    }
}
