use std::path::PathBuf;
use thiserror::Error;

use crate::de::DeError;
use crate::key::to_flag;

/// Every way a parse (or a typed load on top of it) can fail.
///
/// Variants carry the raw pieces a presentation layer needs (token index,
/// dotted path, suggested spelling) rather than pre-rendered text. Indices
/// point into the token list handed to [`parse`](crate::parse), i.e. without
/// the program name.
#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum ArgTreeError {
    #[error("Argument '{token}' at position {index} must start with '--'")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(code(argtree::malformed_argument), help("did you mean `{suggestion}`?"))
    )]
    MalformedArgument {
        index: usize,
        token: String,
        suggestion: String,
    },

    #[error("Invalid key '{key}': dotted paths cannot contain empty segments")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(argtree::invalid_key)))]
    InvalidKey { key: String, index: Option<usize> },

    #[error("Negated flag '{flag}' cannot take a value (got '{value}')")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(argtree::boolean_value_conflict),
            help("drop the value, or use `{suggestion}` to pass one")
        )
    )]
    BooleanValueConflict {
        index: usize,
        /// Position of the value when it was given as a separate token.
        value_index: Option<usize>,
        flag: String,
        value: String,
        suggestion: String,
    },

    #[error("'{path}' is set both as a value and as a group of settings")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(argtree::conflicting_shape)))]
    ConflictingShape { path: String, index: Option<usize> },

    #[error("Boolean flag '{path}' is given more than once")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(code(argtree::conflicting_boolean_flag))
    )]
    ConflictingBooleanFlag { path: String, index: Option<usize> },

    #[error("Invalid config file {path}: {source}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(argtree::invalid_config_file)))]
    InvalidConfigFile {
        path: PathBuf,
        index: Option<usize>,
        source: ConfigFileError,
    },

    #[error("Unknown argument '{flag}'")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(argtree::unknown_key)))]
    UnknownKey { key: String, flag: String },

    #[error("Unknown arguments")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(argtree::unknown_keys)))]
    UnknownKeys(Vec<ArgTreeError>),

    #[error("Invalid value for '{key}': {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(argtree::invalid_value)))]
    InvalidValue { key: String, reason: String },

    #[error("Configuration error: {0}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(argtree::config)))]
    ConfigError(#[from] confique::Error),

    #[error("Failed to render tree as {format}: {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(argtree::render)))]
    Render { format: &'static str, reason: String },
}

/// Low-level cause behind [`ArgTreeError::InvalidConfigFile`].
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("file not found")]
    NotFound,

    #[error("{0}")]
    Io(#[source] std::io::Error),

    #[error("unsupported format '.{extension}' (expected .json, .yaml, .yml or .toml)")]
    UnsupportedFormat { extension: String },

    #[error("unsupported value at '{path}': {reason}")]
    UnsupportedValue { path: String, reason: &'static str },

    #[error("invalid JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[cfg(feature = "yaml")]
    #[error("invalid YAML: {0}")]
    Yaml(#[source] serde_yaml::Error),

    #[cfg(feature = "toml")]
    #[error("invalid TOML: {0}")]
    Toml(#[source] toml::de::Error),
}

impl ArgTreeError {
    /// Attach the position of the token being processed, for errors raised
    /// below the tokenizer (normalizer, merge engine, file loader). An index
    /// already present is kept.
    pub(crate) fn at(mut self, token: usize) -> Self {
        match &mut self {
            ArgTreeError::InvalidKey { index, .. }
            | ArgTreeError::ConflictingShape { index, .. }
            | ArgTreeError::ConflictingBooleanFlag { index, .. }
            | ArgTreeError::InvalidConfigFile { index, .. } => {
                index.get_or_insert(token);
            }
            _ => {}
        }
        self
    }

    /// Token positions a presentation layer should highlight.
    pub fn token_indices(&self) -> Vec<usize> {
        match self {
            ArgTreeError::MalformedArgument { index, .. } => vec![*index],
            ArgTreeError::BooleanValueConflict {
                index, value_index, ..
            } => std::iter::once(*index).chain(*value_index).collect(),
            ArgTreeError::InvalidKey { index, .. }
            | ArgTreeError::ConflictingShape { index, .. }
            | ArgTreeError::ConflictingBooleanFlag { index, .. }
            | ArgTreeError::InvalidConfigFile { index, .. } => index.iter().copied().collect(),
            _ => vec![],
        }
    }
}

/// A value the target type rejected. `key` is the flag spelling of the
/// offending entry (`--database.pool-size`), or `<args>` when the failure
/// concerns the tree as a whole.
impl From<DeError> for ArgTreeError {
    fn from(err: DeError) -> Self {
        ArgTreeError::InvalidValue {
            key: err.path().map_or_else(|| "<args>".to_string(), to_flag),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn malformed_argument_formats_correctly() {
        let err = ArgTreeError::MalformedArgument {
            index: 2,
            token: "hello".into(),
            suggestion: "--hello".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'hello'"));
        assert!(msg.contains("position 2"));
        assert_eq!(err.token_indices(), vec![2]);
    }

    #[test]
    fn boolean_conflict_highlights_flag_and_value() {
        let err = ArgTreeError::BooleanValueConflict {
            index: 0,
            value_index: Some(1),
            flag: "--no-hello".into(),
            value: "world".into(),
            suggestion: "--hello".into(),
        };
        assert_eq!(err.token_indices(), vec![0, 1]);
        assert!(err.to_string().contains("--no-hello"));
    }

    #[test]
    fn at_fills_missing_index_only() {
        let err = ArgTreeError::ConflictingShape {
            path: "a.b".into(),
            index: None,
        }
        .at(4)
        .at(7);
        assert!(matches!(
            err,
            ArgTreeError::ConflictingShape { index: Some(4), .. }
        ));
    }

    #[test]
    fn config_file_error_keeps_cause() {
        let err = ArgTreeError::InvalidConfigFile {
            path: "conf.ini".into(),
            index: None,
            source: ConfigFileError::UnsupportedFormat {
                extension: "ini".into(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("conf.ini"));
        assert!(msg.contains(".ini"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn invalid_value_uses_flag_spelling() {
        type Sections = HashMap<String, HashMap<String, u32>>;

        let tree = crate::parse::parse(["--database.pool-size", "abc"]).unwrap();
        let err: ArgTreeError = crate::de::from_map::<Sections>(tree).unwrap_err().into();
        match err {
            ArgTreeError::InvalidValue { key, reason } => {
                assert_eq!(key, "--database.pool-size");
                assert!(reason.contains("abc"));
            }
            other => panic!("Expected InvalidValue, got: {other:?}"),
        }
    }
}
