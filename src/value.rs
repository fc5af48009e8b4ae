//! The two tree shapes the parser works with.
//!
//! - [`Tree`] / [`Node`]: the in-progress accumulator. Every leaf carries the
//!   [`Priority`] of the source it came from so the merge engine can decide
//!   who wins a collision.
//! - [`Map`] / [`Value`]: the finalized output handed to validators, with the
//!   priority metadata erased.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

use serde::Serialize;

/// Source authority of a leaf. Command-line values always beat file values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Loaded from a configuration file.
    File,
    /// Given directly on the command line.
    Cli,
}

impl Priority {
    pub fn rank(self) -> u8 {
        match self {
            Priority::File => 0,
            Priority::Cli => 1,
        }
    }
}

/// A terminal value before finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    Str(String),
    Bool(bool),
    /// Same-priority repetitions, in encounter order.
    List(Vec<String>),
}

impl Scalar {
    pub fn is_bool(&self) -> bool {
        matches!(self, Scalar::Bool(_))
    }
}

/// A node in the accumulator tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf { value: Scalar, priority: Priority },
    Map(Tree),
}

impl Node {
    pub fn leaf(value: Scalar, priority: Priority) -> Self {
        Node::Leaf { value, priority }
    }

    pub fn cli(value: impl Into<String>) -> Self {
        Node::leaf(Scalar::Str(value.into()), Priority::Cli)
    }

    pub fn flag(value: bool) -> Self {
        Node::leaf(Scalar::Bool(value), Priority::Cli)
    }

    /// Erase priority metadata, recursively.
    pub fn into_value(self) -> Value {
        match self {
            Node::Leaf { value, .. } => value.into(),
            Node::Map(tree) => Value::Map(finalize(tree)),
        }
    }
}

/// One level of the accumulator. Keys are unique per level.
pub type Tree = BTreeMap<String, Node>;

/// One level of the finalized output.
pub type Map = BTreeMap<String, Value>;

/// A finalized node: what downstream validators receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Bool(bool),
    List(Vec<String>),
    Map(Map),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?.get(key)
    }

    /// Short type name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
            Value::List(_) => "list",
            Value::Map(_) => "mapping",
        }
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Str(s) => Value::Str(s),
            Scalar::Bool(b) => Value::Bool(b),
            Scalar::List(items) => Value::List(items),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl Index<&str> for Value {
    type Output = Value;

    /// Panics if `self` is not a mapping or has no such key.
    fn index(&self, key: &str) -> &Value {
        match self.get(key) {
            Some(v) => v,
            None => panic!("no key '{key}' in {} value", self.kind()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::List(items) => write!(f, "[{}]", items.join(", ")),
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Strip priority metadata from a fully merged tree.
///
/// Total by construction: a [`Node`] is either a leaf or a mapping, so there
/// is no malformed node to reject.
pub fn finalize(tree: Tree) -> Map {
    tree.into_iter()
        .map(|(key, node)| (key, node.into_value()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_outranks_file() {
        assert!(Priority::Cli > Priority::File);
        assert_eq!(Priority::File.rank(), 0);
        assert_eq!(Priority::Cli.rank(), 1);
    }

    #[test]
    fn finalize_erases_priorities() {
        let mut inner = Tree::new();
        inner.insert("bar".into(), Node::leaf(Scalar::Str("x".into()), Priority::File));
        let mut tree = Tree::new();
        tree.insert("foo".into(), Node::Map(inner));
        tree.insert("on".into(), Node::flag(true));
        tree.insert(
            "tags".into(),
            Node::leaf(Scalar::List(vec!["a".into(), "b".into()]), Priority::Cli),
        );

        let map = finalize(tree);
        assert_eq!(map["foo"]["bar"], Value::from("x"));
        assert_eq!(map["on"].as_bool(), Some(true));
        assert_eq!(map["tags"].as_list().unwrap(), ["a", "b"]);
    }

    #[test]
    fn finalize_empty_tree() {
        assert!(finalize(Tree::new()).is_empty());
    }

    #[test]
    fn serializes_untagged() {
        let mut map = Map::new();
        map.insert("hello".into(), Value::from("world"));
        map.insert("flag".into(), Value::from(false));
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json, serde_json::json!({"hello": "world", "flag": false}));
    }

    #[test]
    fn display_nested() {
        let mut inner = Map::new();
        inner.insert("b".into(), Value::List(vec!["x".into(), "y".into()]));
        let value = Value::Map(Map::from([("a".to_string(), Value::Map(inner))]));
        assert_eq!(value.to_string(), "{a: {b: [x, y]}}");
    }

    #[test]
    #[should_panic(expected = "no key 'missing'")]
    fn index_missing_key_panics() {
        let value = Value::Map(Map::new());
        let _ = &value["missing"];
    }
}
