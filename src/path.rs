//! Dotted paths ↔ nested trees.
//!
//! `["database", "url"]` + leaf becomes `{database = {url = leaf}}`, and
//! [`flatten`] walks a finalized map back into `("database.url", leaf)` pairs.

use crate::value::{Map, Node, Tree, Value};

/// Expand a key path into a single-branch tree holding `node` at its end.
///
/// An empty path yields an empty tree; the normalizer never produces one.
pub fn unflatten<S: AsRef<str>>(segments: &[S], node: Node) -> Tree {
    let mut tree = Tree::new();
    if let Some((first, rest)) = segments.split_first() {
        let child = if rest.is_empty() {
            node
        } else {
            Node::Map(unflatten(rest, node))
        };
        tree.insert(first.as_ref().to_string(), child);
    }
    tree
}

/// Collect every leaf of `map` as a `(dotted_key, value)` pair, depth-first in
/// key order. Empty mappings contribute nothing.
pub fn flatten(map: &Map) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    collect_leaves(map, "", &mut out);
    out
}

fn collect_leaves(map: &Map, prefix: &str, out: &mut Vec<(String, Value)>) {
    for (key, value) in map {
        let dotted = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Map(inner) => collect_leaves(inner, &dotted, out),
            leaf => out.push((dotted, leaf.clone())),
        }
    }
}
