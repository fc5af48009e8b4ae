//! Tokenizer and parse pipeline.
//!
//! Walks the token list once, left to right. Each flag (with its value, if
//! any) becomes an [`Entry`]: a key path plus a priority-tagged node. Entries
//! are unflattened and folded into a single accumulator with
//! [`merge`](crate::merge::merge), then finalized. The accumulator is local to
//! one call, so a failed parse exposes nothing.
//!
//! Accepted forms:
//!
//! | Tokens                 | Entry                                  |
//! |------------------------|----------------------------------------|
//! | `--key value`          | `key = "value"`                        |
//! | `--key=value`          | `key = "value"`                        |
//! | `--key` (no value)     | `key = true`                           |
//! | `--no-key`             | `key = false`                          |
//! | `--a.b.c value`        | `a = {b = {c = "value"}}`              |
//! | `--key @conf.json`     | `key = <file contents>`                |
//! | `@conf.json` (first)   | file contents merged at the top level  |

use std::path::{Path, PathBuf};

use crate::error::ArgTreeError;
use crate::file;
use crate::key::{self, FLAG_PREFIX, NEGATION_PREFIX};
use crate::merge::merge;
use crate::path::unflatten;
use crate::value::{Map, Node, Priority, Tree, finalize};

/// Default configuration-reference marker.
pub const DEFAULT_MARKER: char = '@';

/// Knobs for a single parse.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    /// Prefix that turns a token into a file reference.
    pub marker: char,
    /// Directory relative file references resolve against (default: CWD).
    pub base_dir: Option<PathBuf>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER,
            base_dir: None,
        }
    }
}

/// One parsed flag, ready to be folded into the accumulator.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// A bare `@file` in first position: its tree merges at the top level.
    Root { index: usize, tree: Tree },
    /// `--a.b value` and friends.
    Keyed {
        index: usize,
        path: Vec<String>,
        node: Node,
    },
}

impl Entry {
    /// Position of the token that produced this entry.
    pub fn index(&self) -> usize {
        match self {
            Entry::Root { index, .. } | Entry::Keyed { index, .. } => *index,
        }
    }

    pub fn into_tree(self) -> Tree {
        match self {
            Entry::Root { tree, .. } => tree,
            Entry::Keyed { path, node, .. } => unflatten(&path, node),
        }
    }
}

/// Single-pass iterator over the entries of a token list.
///
/// Stops after the first error.
pub struct Tokenizer<'a> {
    tokens: &'a [String],
    options: &'a ParseOptions,
    cursor: usize,
    failed: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(tokens: &'a [String], options: &'a ParseOptions) -> Self {
        Self {
            tokens,
            options,
            cursor: 0,
            failed: false,
        }
    }

    fn file_reference<'t>(&self, token: &'t str) -> Option<&'t str> {
        token.strip_prefix(self.options.marker)
    }

    fn load(&self, reference: &str, index: usize) -> Result<Tree, ArgTreeError> {
        let path = file::resolve_reference(reference, self.options.base_dir.as_deref());
        file::load_file(&path, Priority::File).map_err(|e| e.at(index))
    }

    fn next_entry(&mut self) -> Result<Entry, ArgTreeError> {
        let tokens = self.tokens;
        let index = self.cursor;
        let token = &tokens[index];

        if index == 0
            && let Some(reference) = self.file_reference(token)
        {
            self.cursor += 1;
            let tree = self.load(reference, index)?;
            return Ok(Entry::Root { index, tree });
        }

        if !token.starts_with(FLAG_PREFIX) {
            return Err(ArgTreeError::MalformedArgument {
                index,
                token: token.clone(),
                suggestion: format!("{FLAG_PREFIX}{}", token.trim_start_matches('-')),
            });
        }

        // (flag, value, index of the token holding the value)
        let (flag, explicit) = match token.split_once('=') {
            Some((flag, value)) => {
                self.cursor += 1;
                (flag, Some((value, index)))
            }
            None => match tokens.get(index + 1) {
                Some(next) if !next.starts_with(FLAG_PREFIX) => {
                    self.cursor += 2;
                    (token.as_str(), Some((next.as_str(), index + 1)))
                }
                _ => {
                    self.cursor += 1;
                    (token.as_str(), None)
                }
            },
        };

        let key = key::parse_flag(flag).map_err(|e| e.at(index))?;

        let node = match explicit {
            None => Node::flag(!key.negated),
            Some((value, value_index)) if key.negated => {
                return Err(ArgTreeError::BooleanValueConflict {
                    index,
                    value_index: (value_index != index).then_some(value_index),
                    flag: flag.to_string(),
                    value: value.to_string(),
                    suggestion: format!(
                        "{FLAG_PREFIX}{}",
                        &flag[FLAG_PREFIX.len() + NEGATION_PREFIX.len()..]
                    ),
                });
            }
            Some((value, value_index)) => match self.file_reference(value) {
                Some(reference) => Node::Map(self.load(reference, value_index)?),
                None => Node::cli(value),
            },
        };

        Ok(Entry::Keyed {
            index,
            path: key.segments,
            node,
        })
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Result<Entry, ArgTreeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cursor >= self.tokens.len() {
            return None;
        }
        let entry = self.next_entry();
        self.failed = entry.is_err();
        Some(entry)
    }
}

/// Parse `tokens` with default options.
///
/// ```
/// let tree = argtree::parse(["--hello", "world", "--foo.bar", "galaxy"]).unwrap();
/// assert_eq!(tree["hello"].as_str(), Some("world"));
/// assert_eq!(tree["foo"]["bar"].as_str(), Some("galaxy"));
/// ```
pub fn parse<I, S>(tokens: I) -> Result<Map, ArgTreeError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
    parse_with(&tokens, &ParseOptions::default())
}

/// Parse `tokens` into a finalized tree.
pub fn parse_with(tokens: &[String], options: &ParseOptions) -> Result<Map, ArgTreeError> {
    parse_tree(tokens, options).map(finalize)
}

/// Parse `tokens` into the merged accumulator, priorities still attached.
pub fn parse_tree(tokens: &[String], options: &ParseOptions) -> Result<Tree, ArgTreeError> {
    let mut accumulator = Tree::new();
    for entry in Tokenizer::new(tokens, options) {
        let entry = entry?;
        let index = entry.index();
        accumulator = merge(accumulator, entry.into_tree()).map_err(|e| e.at(index))?;
    }
    tracing::debug!(tokens = tokens.len(), keys = accumulator.len(), "parsed arguments");
    Ok(accumulator)
}

/// Parse with file references resolved against `base_dir`.
pub fn parse_in<I, S>(tokens: I, base_dir: &Path) -> Result<Map, ArgTreeError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
    let options = ParseOptions {
        base_dir: Some(base_dir.to_path_buf()),
        ..ParseOptions::default()
    };
    parse_with(&tokens, &options)
}
