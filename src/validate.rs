//! Strict-mode validation: detect arguments the target config does not know.
//!
//! Uses `serde_ignored` to deserialize the parsed tree into `C::Layer`
//! (all-optional fields) and capture every key the layer doesn't consume.
//! Each unknown key is reported both as a dotted path and in the flag spelling
//! the user typed, e.g. `database.pool_sise` / `--database.pool-sise`.

use confique::Config;
use serde::de::DeserializeOwned;

use crate::de::ValueDeserializer;
use crate::error::ArgTreeError;
use crate::key::{to_flag, to_negated_flag};
use crate::value::{Map, Value};

/// Validate that `tree` contains no keys unknown to config type `C`.
pub fn validate_unknown_keys<C: Config>(tree: &Map) -> Result<(), ArgTreeError>
where
    C::Layer: DeserializeOwned,
{
    let mut unknown_keys: Vec<String> = Vec::new();

    let deserializer = ValueDeserializer::new(Value::Map(tree.clone()));
    let _layer: C::Layer = serde_ignored::deserialize(deserializer, |ignored_path| {
        unknown_keys.push(ignored_path.to_string());
    })?;

    if unknown_keys.is_empty() {
        return Ok(());
    }

    let errors: Vec<ArgTreeError> = unknown_keys
        .into_iter()
        .map(|key| {
            let flag = match lookup(tree, &key) {
                Some(Value::Bool(false)) => to_negated_flag(&key),
                _ => to_flag(&key),
            };
            ArgTreeError::UnknownKey { key, flag }
        })
        .collect();

    Err(ArgTreeError::UnknownKeys(errors))
}

fn lookup<'a>(tree: &'a Map, dotted_key: &str) -> Option<&'a Value> {
    let mut segments = dotted_key.split('.');
    let mut value = tree.get(segments.next()?)?;
    for segment in segments {
        value = value.get(segment)?;
    }
    Some(value)
}
