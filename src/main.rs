//! `argtree`: parse the tokens after `--` and print the resulting tree.
//!
//! ```sh
//! argtree -- --hello world --foo.bar galaxy
//! argtree --format yaml -- @base.json --server.port 9000
//! argtree --flat -- --tag a --tag b
//! ```
//!
//! Set `ARGTREE_LOG=debug` to trace file loads and merges on stderr.

use std::process::ExitCode;

use argtree::{DumpArgs, highlight, render};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("ARGTREE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = DumpArgs::parse();
    let builder = args.builder();

    match builder
        .parse()
        .and_then(|tree| render(&tree, args.format, args.flat))
    {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            if let Some(marked) = highlight(builder.effective_program_name(), builder.tokens(), &err) {
                eprintln!("\n{marked}");
            }
            ExitCode::FAILURE
        }
    }
}
