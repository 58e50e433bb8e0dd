//! `y-inspect`: decode a transcript of hex-encoded updates (stdin) into a
//! JSON report (stdout).
//!
//! Usage:
//!   y-inspect [--config <path>] [--gc] [--track-remote] [--flat] < transcript

use std::io::{self, Read, Write};

use tracing_subscriber::EnvFilter;
use y_inspect::cli::{run, CliError, CliOptions, USAGE};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("y_inspect=info")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("y-inspect: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), CliError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let opts = match CliOptions::parse(&args) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("{USAGE}");
            return Err(e);
        }
    };
    if opts.help {
        println!("{USAGE}");
        return Ok(());
    }
    let config = opts.config()?;

    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;

    let (json, errors) = run(&input, config)?;
    for e in &errors {
        eprintln!("line {}: {}", e.line, e.error);
    }
    let mut out = io::stdout().lock();
    out.write_all(json.as_bytes())?;
    out.write_all(b"\n")?;
    Ok(())
}
