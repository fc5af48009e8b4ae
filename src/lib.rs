//! Turn command-line tokens and configuration files into one nested,
//! conflict-resolved settings tree.
//!
//! ```
//! let tree = argtree::parse(["--hello", "world", "--foo.bar", "galaxy", "--no-tls"]).unwrap();
//! assert_eq!(tree["hello"].as_str(), Some("world"));
//! assert_eq!(tree["foo"]["bar"].as_str(), Some("galaxy"));
//! assert_eq!(tree["tls"].as_bool(), Some(false));
//! ```
//!
//! argtree is not a grammar-based argument parser. There are no subcommands,
//! no declared flags and no help text. Every `--flag` is accepted and becomes
//! a key in a tree of untyped leaves (strings, booleans, lists of strings).
//! Typing is left to whatever consumes the tree: a serde type through
//! [`from_map`], a confique config through [`ArgTreeBuilder::load`], or your
//! own validator.
//!
//! # Flag syntax
//!
//! | Tokens                 | Result                                         |
//! |------------------------|------------------------------------------------|
//! | `--key value`          | `key = "value"`                                |
//! | `--key=value`          | `key = "value"`                                |
//! | `--key`                | `key = true` (last token, or next is a flag)   |
//! | `--no-key`             | `key = false`                                  |
//! | `--a.b.c value`        | `a = {b = {c = "value"}}`                      |
//! | `--dry-run`            | `dry_run = true` (dashes become underscores)   |
//! | `--key @conf.json`     | `key = <contents of conf.json>`                |
//! | `@conf.json` (first)   | contents of `conf.json` at the top level       |
//!
//! File references accept `.json`, and `.yaml`/`.yml`/`.toml` when the
//! `yaml`/`toml` Cargo features are enabled (both on by default).
//!
//! # Conflict rules
//!
//! Every leaf carries a [`Priority`]: values from files are
//! [`File`](Priority::File), values typed on the command line are
//! [`Cli`](Priority::Cli). When two sources set the same key:
//!
//! - the higher priority wins, whichever came first;
//! - at equal priority, strings accumulate into a list in encounter order
//!   (`--tag a --tag b` gives `tag = ["a", "b"]`);
//! - at equal priority, a boolean on either side is an error
//!   ([`ArgTreeError::ConflictingBooleanFlag`]);
//! - a key that is a value in one source and a group of settings in another
//!   is always an error ([`ArgTreeError::ConflictingShape`]).
//!
//! A command-line flag can therefore override a single field of a file:
//!
//! ```text
//! --server @server.json --server.port 9000
//! ```
//!
//! # Errors
//!
//! All fallible operations return [`ArgTreeError`]. Errors carry structured
//! context (token index, dotted path, suggested spelling) rather than
//! formatted output, and a failed parse yields nothing partial. With the
//! `rich-errors` feature the error also implements `miette::Diagnostic`.
//!
//! # Binary
//!
//! With the `clap` feature (on by default) the crate ships an `argtree`
//! binary that prints the tree for the tokens after `--`, in JSON, YAML, TOML
//! or a flat `key = value` listing.

pub mod error;
pub mod value;

mod builder;
#[cfg(feature = "clap")]
mod cli;
mod de;
mod file;
mod key;
mod merge;
mod parse;
mod path;
mod resolve;
mod validate;

#[cfg(test)]
mod fixtures;

pub use builder::{ArgTree, ArgTreeBuilder};
#[cfg(feature = "clap")]
pub use cli::{DumpArgs, OutputFormat, highlight, render};
pub use de::{DeError, ValueDeserializer, from_map, from_value};
pub use error::{ArgTreeError, ConfigFileError};
pub use file::{Format, load_file, parse_str};
pub use key::{FlagKey, normalize_name, parse_flag, to_flag, to_negated_flag};
pub use merge::merge;
pub use parse::{Entry, ParseOptions, Tokenizer, parse, parse_in, parse_tree, parse_with};
pub use path::{flatten, unflatten};
pub use value::{Map, Node, Priority, Scalar, Tree, Value, finalize};
