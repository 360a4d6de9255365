//! ast2json binary
//!
//! Usage:
//!   ast2json <FILE> [--format structured|count] [--positions merge|shadow|none]
//!            [--language python|typescript|tsx|javascript|rust]
//!
//! Parses one source file and writes its syntax tree as JSON-like text along
//! with the node count. Failures go to stderr as `{"errType": ...}`.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ast2json::driver::Driver;
use ast2json::parser::languages::Language;
use ast2json::parser::serialize::PositionMode;
use ast2json::types::{OutputShape, RunConfig};

#[derive(Parser, Debug)]
#[command(name = "ast2json", version, about = "Serialize a source file's syntax tree as JSON")]
struct Args {
    /// Source file to serialize
    input: PathBuf,

    /// Success payload on stdout
    #[arg(long, value_enum, default_value_t = OutputShape::Structured)]
    format: OutputShape,

    /// Position entries written per node
    #[arg(long, value_enum, default_value_t = PositionMode::Merge)]
    positions: PositionMode,

    /// Grammar to parse with (default: chosen from the file extension)
    #[arg(long, value_enum)]
    language: Option<Language>,
}

impl Args {
    fn into_config(self) -> RunConfig {
        let config = RunConfig::new(self.input)
            .output(self.format)
            .positions(self.positions);
        match self.language {
            Some(language) => config.language(language),
            None => config,
        }
    }
}

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let driver = Driver::new(Args::parse().into_config());
    let outcome = driver.execute(&mut io::stdout().lock(), &mut io::stderr().lock());
    ExitCode::from(outcome.code())
}
