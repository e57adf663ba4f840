//! Reports what a request looks like through [`micro_input::Input`].
//!
//! Run behind a web server as a CGI program, or from a shell with
//! `micro-input-cgi --uri=/users/5` (or `micro-input-cgi users/5`) to try the
//! command line path. A JSON config file may be given through
//! `MICRO_INPUT_CONFIG`.

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use micro_input::raw::keys;
use micro_input::{CliArgs, DEFAULT_IP, DEFAULT_METHOD, Input, InputConfig, InputError, RawRequestData};
use serde_json::json;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

const CONFIG_ENV: &str = "MICRO_INPUT_CONFIG";

fn main() -> ExitCode {
    // a CGI program gets the query string as argv, only parse it from a shell
    let is_cgi = std::env::var_os(keys::GATEWAY_INTERFACE).is_some();
    let cli = (!is_cgi).then(CliArgs::parse);

    let level = if cli.as_ref().is_some_and(|cli| cli.verbose) { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).with_writer(std::io::stderr).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {e}");
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(cause = %e, "failed to inspect request");
            print!("Status: 500 Internal Server Error\r\nContent-Type: text/plain\r\n\r\n{e}\n");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Option<CliArgs>) -> Result<(), InputError> {
    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) => {
            info!(path = %path, "loading input config");
            InputConfig::from_json_file(path)?
        }
        Err(_) => InputConfig::default(),
    };

    let mut input = match cli {
        Some(cli) => Input::builder(RawRequestData::default()).config(config).cli(cli).build(),
        None => {
            let data = RawRequestData::from_cgi_env(std::env::vars(), std::io::stdin());
            Input::builder(data).config(config).build()
        }
    };

    let uri = input.uri()?.to_owned();
    let report = json!({
        "uri": uri,
        "method": input.method(DEFAULT_METHOD),
        "protocol": input.protocol(),
        "ip": input.ip(DEFAULT_IP),
        "real_ip": input.real_ip(DEFAULT_IP),
        "is_ajax": input.is_ajax(),
        "user_agent": input.user_agent(""),
        "referrer": input.referrer(""),
        "query": input.get_all(),
        "cookies": input.cookie_all(),
        "params": input.all(),
    });

    let mut stdout = std::io::stdout().lock();
    write!(stdout, "Content-Type: application/json\r\n\r\n{report:#}\n").map_err(InputError::io)?;
    stdout.flush().map_err(InputError::io)
}
