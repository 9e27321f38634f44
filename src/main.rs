use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use conslisp::Session;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

/// Runs a program file, or standard input when no file is given.
#[derive(Parser, Debug)]
#[command(name = "conslisp", version, about)]
struct Args {
    /// Source file to evaluate
    file: Option<PathBuf>,

    /// Print each expression before its result
    #[arg(short, long)]
    echo: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(io::stderr)
        .init();

    let session = Session::new();
    let stdout = io::stdout();
    let mut output = stdout.lock();

    match &args.file {
        Some(path) => {
            info!("Running {}", path.display());
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            session
                .run(BufReader::new(file), &mut output, args.echo)
                .with_context(|| format!("Failed while running {}", path.display()))?;
        }
        None => {
            info!("Reading from standard input, type '{}' to quit", conslisp::session::EXIT_COMMAND);
            session
                .run(io::stdin().lock(), &mut output, args.echo)
                .context("Failed while reading standard input")?;
        }
    }

    Ok(())
}
