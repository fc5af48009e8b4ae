//! Clap adapter for the `argtree` binary.
//!
//! This module is compiled only when the `clap` Cargo feature is enabled (on
//! by default). It owns everything presentation-related: reading the dump
//! options, rendering a finalized tree, and marking offending tokens under a
//! failed command line. The core library never formats output itself.
//!
//! The binary parses its own options with clap and hands every token after
//! `--` to the core:
//!
//! ```text
//! argtree --format yaml -- @base.json --server.port 9000 --no-tls
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::builder::{ArgTree, ArgTreeBuilder};
use crate::error::ArgTreeError;
use crate::parse::DEFAULT_MARKER;
use crate::path::flatten;
use crate::value::Map;

/// Parse `--dotted.flags` and `@config` files into one tree and print it.
#[derive(Debug, Parser)]
#[command(name = "argtree", version)]
pub struct DumpArgs {
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Print one `dotted.key = value` line per leaf instead of a document.
    #[arg(long)]
    pub flat: bool,

    /// Prefix that marks a configuration-file reference.
    #[arg(long, default_value_t = DEFAULT_MARKER)]
    pub marker: char,

    /// Resolve relative file references against this directory.
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// Tokens to parse (everything after `--`).
    #[arg(last = true, allow_hyphen_values = true)]
    pub tokens: Vec<String>,
}

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    #[cfg(feature = "yaml")]
    Yaml,
    #[cfg(feature = "toml")]
    Toml,
}

impl DumpArgs {
    /// Bridge clap-parsed options to the core builder.
    pub fn builder(&self) -> ArgTreeBuilder {
        let mut builder = ArgTree::builder()
            .program_name("argtree --")
            .marker(self.marker)
            .args(self.tokens.iter().cloned());
        if let Some(dir) = &self.base_dir {
            builder = builder.base_dir(dir);
        }
        builder
    }
}

/// Render a finalized tree for display.
pub fn render(tree: &Map, format: OutputFormat, flat: bool) -> Result<String, ArgTreeError> {
    if flat {
        let lines: Vec<String> = flatten(tree)
            .into_iter()
            .map(|(key, value)| format!("{key} = {value}"))
            .collect();
        return Ok(lines.join("\n"));
    }

    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(tree).map_err(|e| ArgTreeError::Render {
                format: "json",
                reason: e.to_string(),
            })
        }
        #[cfg(feature = "yaml")]
        OutputFormat::Yaml => serde_yaml::to_string(tree).map_err(|e| ArgTreeError::Render {
            format: "yaml",
            reason: e.to_string(),
        }),
        #[cfg(feature = "toml")]
        OutputFormat::Toml => toml::to_string_pretty(tree).map_err(|e| ArgTreeError::Render {
            format: "toml",
            reason: e.to_string(),
        }),
    }
}

/// Reprint the command line with carets under the tokens `err` points at.
///
/// Returns `None` when the error is not tied to a token position.
pub fn highlight(program_name: &str, tokens: &[String], err: &ArgTreeError) -> Option<String> {
    let marked = err.token_indices();
    if marked.is_empty() {
        return None;
    }

    let mut line = String::new();
    let mut carets = String::new();
    if !program_name.is_empty() {
        line.push_str(program_name);
        carets.push_str(&" ".repeat(program_name.chars().count()));
    }
    for (i, token) in tokens.iter().enumerate() {
        if !line.is_empty() {
            line.push(' ');
            carets.push(' ');
        }
        let width = token.chars().count().max(1);
        line.push_str(token);
        let fill = if marked.contains(&i) { "^" } else { " " };
        carets.push_str(&fill.repeat(width));
    }
    Some(format!("{line}\n{}", carets.trim_end()))
}
