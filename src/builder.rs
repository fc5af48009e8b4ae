use std::ffi::OsStr;
use std::path::PathBuf;

use confique::Config;
use serde::de::DeserializeOwned;

use crate::de;
use crate::error::ArgTreeError;
use crate::parse::{self, ParseOptions};
use crate::resolve;
use crate::value::{Map, Tree};

/// Entry point for building an argument parse.
pub struct ArgTree;

impl ArgTree {
    pub fn builder() -> ArgTreeBuilder {
        ArgTreeBuilder::new()
    }
}

/// Builder for parsing arguments into a tree (and optionally a typed config).
///
/// ```
/// use argtree::ArgTree;
///
/// let tree = ArgTree::builder()
///     .args(["--db.url", "pg://", "--verbose"])
///     .parse()
///     .unwrap();
/// assert_eq!(tree["db"]["url"].as_str(), Some("pg://"));
/// assert_eq!(tree["verbose"].as_bool(), Some(true));
/// ```
#[derive(Debug, Clone)]
pub struct ArgTreeBuilder {
    args: Vec<String>,
    program_name: Option<String>,
    options: ParseOptions,
    strict: bool,
}

impl ArgTreeBuilder {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            program_name: None,
            options: ParseOptions::default(),
            strict: true,
        }
    }

    /// Replace the tokens to parse. The program name must not be included.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Append a single token.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Replace the tokens from OS strings. Bytes that are not valid UTF-8
    /// become `U+FFFD`.
    pub fn args_os<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args(
            args.into_iter()
                .map(|arg| arg.as_ref().to_string_lossy().into_owned()),
        )
    }

    /// Take tokens from the process arguments. `argv[0]` becomes the program
    /// name and is not parsed.
    pub fn from_env(self) -> Self {
        let mut argv = std::env::args_os();
        let program_name = argv.next().map(|name| name.to_string_lossy().into_owned());
        let mut builder = self.args_os(argv);
        builder.program_name = program_name;
        builder
    }

    /// Name shown by presentation layers in front of the arguments.
    pub fn program_name(mut self, name: &str) -> Self {
        self.program_name = Some(name.to_string());
        self
    }

    /// Set the configuration-reference marker (default: `@`).
    pub fn marker(mut self, marker: char) -> Self {
        self.options.marker = marker;
        self
    }

    /// Resolve relative `@file` references against `dir` instead of the CWD.
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.base_dir = Some(dir.into());
        self
    }

    /// Enable or disable strict mode for [`load`](Self::load) (default: `true`).
    /// In strict mode, arguments the config type doesn't know produce errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn tokens(&self) -> &[String] {
        &self.args
    }

    pub fn effective_program_name(&self) -> &str {
        self.program_name.as_deref().unwrap_or("")
    }

    /// Parse into a finalized tree.
    pub fn parse(&self) -> Result<Map, ArgTreeError> {
        parse::parse_with(&self.args, &self.options)
    }

    /// Parse into the merged tree with priorities still attached.
    pub fn parse_tree(&self) -> Result<Tree, ArgTreeError> {
        parse::parse_tree(&self.args, &self.options)
    }

    /// Parse and deserialize into any serde type, coercing string leaves.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ArgTreeError> {
        let tree = self.parse()?;
        Ok(de::from_map(tree)?)
    }

    /// Parse and resolve into a confique config: unknown keys are rejected
    /// (in strict mode), defaults filled, required fields checked.
    pub fn load<C: Config>(&self) -> Result<C, ArgTreeError>
    where
        C::Layer: DeserializeOwned,
    {
        let tree = self.parse()?;
        resolve::resolve(tree, self.strict)
    }
}
