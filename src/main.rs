use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use http_fixture_runner::{run_suite, Mode, RemoteHandler, Report, TestCases};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Run a fixture table of HTTP requests against a live server.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Fixture table, one test case per row.
    file: PathBuf,

    /// Field delimiter.
    #[arg(short, long, default_value_t = ',', value_parser = parse_delimiter)]
    delimiter: char,

    /// Columns are in positional order and the first row is data.
    #[arg(long)]
    no_header: bool,

    /// Server the requests are sent to.
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    base_url: String,

    /// Only check status codes.
    #[arg(long)]
    status_only: bool,

    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,
}

fn parse_delimiter(value: &str) -> std::result::Result<char, String> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c),
        _ => Err(format!("expected a single ASCII character, got {value:?}")),
    }
}

fn main() -> ExitCode {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();

    match run(Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<bool> {
    let cases = TestCases::load(&args.file, args.delimiter as u8, !args.no_header)?;
    let handler = RemoteHandler::new(&args.base_url)?;
    let mode = if args.status_only { Mode::StatusOnly } else { Mode::Full };

    log::info!("running {} test cases against {}", cases.len(), handler.base());

    let mut report = Report::new();
    let summary = run_suite(&cases, &handler, &(), mode, &mut report);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(summary.failed == 0)
}
