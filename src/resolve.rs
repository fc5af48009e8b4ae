//! Typed loading: turn a parsed tree into a confique config.
//!
//! Operates on an already-parsed tree with no I/O. Steps:
//!
//! 1. Validate unknown keys (if strict mode)
//! 2. Deserialize the tree into `C::Layer`, coercing string leaves
//! 3. Let confique fill defaults and validate required fields

use confique::Config;
use serde::de::DeserializeOwned;

use crate::de::from_map;
use crate::error::ArgTreeError;
use crate::validate;
use crate::value::Map;

/// Resolve a typed configuration from a finalized tree.
pub fn resolve<C: Config>(tree: Map, strict: bool) -> Result<C, ArgTreeError>
where
    C::Layer: DeserializeOwned,
{
    if strict {
        validate::validate_unknown_keys::<C>(&tree)?;
    }

    let layer: C::Layer = from_map(tree)?;

    C::builder()
        .preloaded(layer)
        .load()
        .map_err(ArgTreeError::from)
}
