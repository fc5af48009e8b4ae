use std::cmp::Ordering;

use crate::error::ArgTreeError;
use crate::value::{Node, Priority, Scalar, Tree};

/// Priority-aware deep merge of `incoming` into `base`.
///
/// For each key of `incoming`:
/// - absent in `base`: inserted as is;
/// - mapping on both sides: recurse;
/// - mapping on one side, leaf on the other: [`ArgTreeError::ConflictingShape`],
///   whatever the priorities;
/// - leaf on both sides: the higher priority wins. At equal priority two
///   booleans (or a boolean and anything) are a
///   [`ArgTreeError::ConflictingBooleanFlag`]; other scalars are collected into
///   a list, `base` items first.
///
/// Errors carry the dotted path of the collision but no token index.
pub fn merge(mut base: Tree, incoming: Tree) -> Result<Tree, ArgTreeError> {
    merge_into(&mut base, incoming, &mut Vec::new())?;
    Ok(base)
}

fn merge_into(base: &mut Tree, incoming: Tree, path: &mut Vec<String>) -> Result<(), ArgTreeError> {
    for (key, incoming_node) in incoming {
        path.push(key.clone());
        let merged = match (base.remove(&key), incoming_node) {
            (None, node) => node,
            (Some(Node::Map(mut base_tree)), Node::Map(incoming_tree)) => {
                merge_into(&mut base_tree, incoming_tree, path)?;
                Node::Map(base_tree)
            }
            (Some(Node::Map(_)), Node::Leaf { .. }) | (Some(Node::Leaf { .. }), Node::Map(_)) => {
                return Err(ArgTreeError::ConflictingShape {
                    path: path.join("."),
                    index: None,
                });
            }
            (
                Some(Node::Leaf {
                    value: base_value,
                    priority: base_priority,
                }),
                Node::Leaf { value, priority },
            ) => merge_leaves((base_value, base_priority), (value, priority), path)?,
        };
        base.insert(key, merged);
        path.pop();
    }
    Ok(())
}

fn merge_leaves(
    (base_value, base_priority): (Scalar, Priority),
    (value, priority): (Scalar, Priority),
    path: &[String],
) -> Result<Node, ArgTreeError> {
    match priority.cmp(&base_priority) {
        Ordering::Greater => {
            tracing::trace!(path = %path.join("."), "higher-priority value overrides");
            Ok(Node::leaf(value, priority))
        }
        Ordering::Less => {
            tracing::trace!(path = %path.join("."), "lower-priority value discarded");
            Ok(Node::leaf(base_value, base_priority))
        }
        Ordering::Equal => match coalesce(base_value, value) {
            Some(list) => Ok(Node::leaf(list, priority)),
            None => Err(ArgTreeError::ConflictingBooleanFlag {
                path: path.join("."),
                index: None,
            }),
        },
    }
}

/// Append `value` to `base` as a list. `None` if either side is a boolean.
fn coalesce(base: Scalar, value: Scalar) -> Option<Scalar> {
    let mut items = match base {
        Scalar::Bool(_) => return None,
        Scalar::Str(s) => vec![s],
        Scalar::List(items) => items,
    };
    match value {
        Scalar::Bool(_) => return None,
        Scalar::Str(s) => items.push(s),
        Scalar::List(more) => items.extend(more),
    }
    Some(Scalar::List(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::unflatten;
    use crate::value::{Value, finalize};

    fn cli(dotted: &str, value: &str) -> Tree {
        let segments: Vec<&str> = dotted.split('.').collect();
        unflatten(&segments, Node::cli(value))
    }

    fn file(dotted: &str, value: &str) -> Tree {
        let segments: Vec<&str> = dotted.split('.').collect();
        unflatten(
            &segments,
            Node::leaf(Scalar::Str(value.into()), Priority::File),
        )
    }

    fn flag(dotted: &str, value: bool) -> Tree {
        let segments: Vec<&str> = dotted.split('.').collect();
        unflatten(&segments, Node::flag(value))
    }

    fn json(tree: Tree) -> serde_json::Value {
        serde_json::to_value(finalize(tree)).unwrap()
    }

    #[test]
    fn disjoint_keys_merge() {
        let merged = merge(cli("host", "localhost"), cli("port", "3000")).unwrap();
        assert_eq!(
            json(merged),
            serde_json::json!({"host": "localhost", "port": "3000"})
        );
    }

    #[test]
    fn nested_maps_recurse() {
        let base = merge(file("db.url", "pg://old"), file("db.pool", "5")).unwrap();
        let merged = merge(base, cli("db.pool", "20")).unwrap();
        assert_eq!(
            json(merged),
            serde_json::json!({"db": {"url": "pg://old", "pool": "20"}})
        );
    }

    #[test]
    fn cli_overrides_file_in_either_order() {
        let forward = merge(file("port", "80"), cli("port", "8080")).unwrap();
        let backward = merge(cli("port", "8080"), file("port", "80")).unwrap();
        assert_eq!(json(forward.clone()), serde_json::json!({"port": "8080"}));
        assert_eq!(json(forward), json(backward));
    }

    #[test]
    fn cli_flag_overrides_file_string() {
        let merged = merge(file("debug", "false"), flag("debug", true)).unwrap();
        assert_eq!(finalize(merged)["debug"], Value::Bool(true));
    }

    #[test]
    fn same_priority_strings_accumulate_in_order() {
        let merged = merge(cli("hello", "world"), cli("hello", "universe")).unwrap();
        assert_eq!(
            json(merged),
            serde_json::json!({"hello": ["world", "universe"]})
        );
    }

    #[test]
    fn accumulated_list_keeps_growing() {
        let merged = merge(cli("tag", "a"), cli("tag", "b")).unwrap();
        let merged = merge(merged, cli("tag", "c")).unwrap();
        assert_eq!(json(merged), serde_json::json!({"tag": ["a", "b", "c"]}));
    }

    #[test]
    fn file_lists_concatenate_at_same_priority() {
        let list = unflatten(
            &["tags"],
            Node::leaf(Scalar::List(vec!["x".into(), "y".into()]), Priority::File),
        );
        let merged = merge(file("tags", "w"), list).unwrap();
        assert_eq!(json(merged), serde_json::json!({"tags": ["w", "x", "y"]}));
    }

    #[test]
    fn lower_priority_list_discarded() {
        let list = unflatten(
            &["tags"],
            Node::leaf(Scalar::List(vec!["x".into()]), Priority::File),
        );
        let merged = merge(cli("tags", "only"), list).unwrap();
        assert_eq!(json(merged), serde_json::json!({"tags": "only"}));
    }

    #[test]
    fn same_priority_booleans_conflict() {
        let err = merge(flag("verbose", true), flag("verbose", false)).unwrap_err();
        match err {
            ArgTreeError::ConflictingBooleanFlag { path, index } => {
                assert_eq!(path, "verbose");
                assert_eq!(index, None);
            }
            other => panic!("Expected ConflictingBooleanFlag, got: {other:?}"),
        }
    }

    #[test]
    fn boolean_and_string_at_same_priority_conflict() {
        let err = merge(cli("a.verbose", "yes"), flag("a.verbose", true)).unwrap_err();
        assert!(matches!(
            err,
            ArgTreeError::ConflictingBooleanFlag { ref path, .. } if path == "a.verbose"
        ));
    }

    #[test]
    fn leaf_then_map_is_shape_conflict() {
        let err = merge(cli("a", "y"), cli("a.b", "x")).unwrap_err();
        assert!(matches!(
            err,
            ArgTreeError::ConflictingShape { ref path, .. } if path == "a"
        ));
    }

    #[test]
    fn map_then_leaf_is_shape_conflict_regardless_of_priority() {
        let err = merge(file("a.b", "x"), cli("a", "y")).unwrap_err();
        assert!(matches!(err, ArgTreeError::ConflictingShape { .. }));
    }

    #[test]
    fn deep_shape_conflict_reports_full_path() {
        let err = merge(cli("a.b.c", "x"), cli("a.b", "y")).unwrap_err();
        assert!(matches!(
            err,
            ArgTreeError::ConflictingShape { ref path, .. } if path == "a.b"
        ));
    }

    #[test]
    fn empty_incoming_returns_base() {
        let base = cli("port", "8080");
        assert_eq!(merge(base.clone(), Tree::new()).unwrap(), base);
    }

    #[test]
    fn empty_base_returns_incoming() {
        let incoming = cli("port", "3000");
        assert_eq!(merge(Tree::new(), incoming.clone()).unwrap(), incoming);
    }
}
