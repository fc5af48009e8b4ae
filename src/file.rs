//! Config-file loading for `@path` references.
//!
//! A file is read once, decoded according to its extension, and converted
//! into a [`Tree`] whose leaves all carry the caller's [`Priority`]. The result
//! has the same shape as a tree built from flags, so the merge engine treats
//! both alike.
//!
//! Decoded values map onto the tree as follows:
//!
//! | Decoded            | Tree leaf                             |
//! |--------------------|---------------------------------------|
//! | string / boolean   | `Str` / `Bool`                        |
//! | number, datetime   | `Str` holding its canonical rendering |
//! | array of scalars   | `List` of their string renderings     |
//! | null               | key omitted                           |
//! | nested array/table inside an array | unsupported value     |
//!
//! Floats keep their fractional part (`1.0` stays `"1.0"`) in every format.
//!
//! Keys are taken verbatim. A file key `a.b` is a single key containing a
//! dot, not the path `a` → `b`, so a `--a.b` flag lands next to it rather
//! than overriding it. Spell nested settings as nested tables instead.
//!
//! YAML and TOML decoding are behind the `yaml` and `toml` Cargo features.
//! Without them those extensions are reported as unsupported.

use std::path::{Path, PathBuf};

use crate::error::{ArgTreeError, ConfigFileError};
use crate::value::{Node, Priority, Scalar, Tree};

/// A configuration file format, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
    Toml,
}

impl Format {
    /// Detect the format from `path`'s extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Format, ConfigFileError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match extension.as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" if cfg!(feature = "yaml") => Ok(Format::Yaml),
            "toml" if cfg!(feature = "toml") => Ok(Format::Toml),
            _ => Err(ConfigFileError::UnsupportedFormat { extension }),
        }
    }
}

/// Read and decode the file at `path`, tagging every leaf with `priority`.
pub fn load_file(path: &Path, priority: Priority) -> Result<Tree, ArgTreeError> {
    let wrap = |source: ConfigFileError| ArgTreeError::InvalidConfigFile {
        path: path.to_path_buf(),
        index: None,
        source,
    };

    let format = Format::from_path(path).map_err(wrap)?;
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(wrap(ConfigFileError::NotFound));
        }
        Err(e) => return Err(wrap(ConfigFileError::Io(e))),
    };

    let tree = parse_str(&content, format, priority).map_err(wrap)?;
    tracing::debug!(path = %path.display(), ?format, keys = tree.len(), "loaded config file");
    Ok(tree)
}

/// Resolve a file reference against an optional base directory.
/// Absolute references are returned unchanged.
pub fn resolve_reference(reference: &str, base_dir: Option<&Path>) -> PathBuf {
    match base_dir {
        Some(base) => base.join(reference),
        None => PathBuf::from(reference),
    }
}

/// Decode `content` as `format` into a priority-tagged tree.
pub fn parse_str(content: &str, format: Format, priority: Priority) -> Result<Tree, ConfigFileError> {
    let raw = match format {
        Format::Json => {
            let value: serde_json::Value =
                serde_json::from_str(content).map_err(ConfigFileError::Json)?;
            Raw::from(value)
        }
        #[cfg(feature = "yaml")]
        Format::Yaml => {
            let value: serde_yaml::Value =
                serde_yaml::from_str(content).map_err(ConfigFileError::Yaml)?;
            Raw::from_yaml(value, &mut Vec::new())?
        }
        #[cfg(feature = "toml")]
        Format::Toml => {
            let value: toml::Table = toml::from_str(content).map_err(ConfigFileError::Toml)?;
            Raw::from(toml::Value::Table(value))
        }
        #[allow(unreachable_patterns)]
        other => {
            return Err(ConfigFileError::UnsupportedFormat {
                extension: format!("{other:?}").to_ascii_lowercase(),
            });
        }
    };

    match raw {
        Raw::Map(entries) => to_tree(entries, priority, &mut Vec::new()),
        Raw::Null => Ok(Tree::new()),
        _ => Err(ConfigFileError::UnsupportedValue {
            path: "<root>".into(),
            reason: "top level must be a mapping",
        }),
    }
}

/// Format-neutral decoded value.
enum Raw {
    Null,
    Bool(bool),
    Text(String),
    Seq(Vec<Raw>),
    Map(Vec<(String, Raw)>),
}

impl From<serde_json::Value> for Raw {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Raw::Null,
            Value::Bool(b) => Raw::Bool(b),
            Value::Number(n) => Raw::Text(n.to_string()),
            Value::String(s) => Raw::Text(s),
            Value::Array(items) => Raw::Seq(items.into_iter().map(Raw::from).collect()),
            Value::Object(map) => Raw::Map(map.into_iter().map(|(k, v)| (k, Raw::from(v))).collect()),
        }
    }
}

#[cfg(feature = "toml")]
impl From<toml::Value> for Raw {
    fn from(value: toml::Value) -> Self {
        use toml::Value;
        match value {
            Value::String(s) => Raw::Text(s),
            Value::Integer(i) => Raw::Text(i.to_string()),
            Value::Float(f) => Raw::Text(Value::Float(f).to_string()),
            Value::Boolean(b) => Raw::Bool(b),
            Value::Datetime(dt) => Raw::Text(dt.to_string()),
            Value::Array(items) => Raw::Seq(items.into_iter().map(Raw::from).collect()),
            Value::Table(table) => {
                Raw::Map(table.into_iter().map(|(k, v)| (k, Raw::from(v))).collect())
            }
        }
    }
}

#[cfg(feature = "yaml")]
impl Raw {
    /// YAML keys may be any value; scalar keys are stringified, others rejected.
    fn from_yaml(value: serde_yaml::Value, path: &mut Vec<String>) -> Result<Raw, ConfigFileError> {
        use serde_yaml::Value;
        Ok(match value {
            Value::Null => Raw::Null,
            Value::Bool(b) => Raw::Bool(b),
            Value::Number(n) => Raw::Text(n.to_string()),
            Value::String(s) => Raw::Text(s),
            Value::Sequence(items) => Raw::Seq(
                items
                    .into_iter()
                    .map(|item| Raw::from_yaml(item, path))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Mapping(mapping) => {
                let mut entries = Vec::with_capacity(mapping.len());
                for (key, value) in mapping {
                    let key = match key {
                        Value::String(s) => s,
                        Value::Bool(b) => b.to_string(),
                        Value::Number(n) => n.to_string(),
                        _ => {
                            return Err(ConfigFileError::UnsupportedValue {
                                path: dotted_or_root(path),
                                reason: "mapping keys must be scalars",
                            });
                        }
                    };
                    path.push(key.clone());
                    let value = Raw::from_yaml(value, path)?;
                    path.pop();
                    entries.push((key, value));
                }
                Raw::Map(entries)
            }
            Value::Tagged(tagged) => Raw::from_yaml(tagged.value, path)?,
        })
    }
}

fn to_tree(
    entries: Vec<(String, Raw)>,
    priority: Priority,
    path: &mut Vec<String>,
) -> Result<Tree, ConfigFileError> {
    let mut tree = Tree::new();
    for (key, raw) in entries {
        path.push(key.clone());
        let node = match raw {
            Raw::Null => None,
            Raw::Bool(b) => Some(Node::leaf(Scalar::Bool(b), priority)),
            Raw::Text(s) => Some(Node::leaf(Scalar::Str(s), priority)),
            Raw::Seq(items) => Some(Node::leaf(Scalar::List(to_list(items, path)?), priority)),
            Raw::Map(entries) => Some(Node::Map(to_tree(entries, priority, path)?)),
        };
        path.pop();
        if let Some(node) = node {
            tree.insert(key, node);
        }
    }
    Ok(tree)
}

fn to_list(items: Vec<Raw>, path: &[String]) -> Result<Vec<String>, ConfigFileError> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Raw::Null => None,
            Raw::Bool(b) => Some(Ok(b.to_string())),
            Raw::Text(s) => Some(Ok(s)),
            Raw::Seq(_) | Raw::Map(_) => Some(Err(ConfigFileError::UnsupportedValue {
                path: dotted_or_root(path),
                reason: "arrays may only contain scalars",
            })),
        })
        .collect()
}

fn dotted_or_root(path: &[String]) -> String {
    if path.is_empty() {
        "<root>".into()
    } else {
        path.join(".")
    }
}
