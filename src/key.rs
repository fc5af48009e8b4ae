//! Flag-token normalization: `--no-db.pool-size` → negated key `db.pool_size`.

use crate::error::ArgTreeError;

/// Prefix every flag token must carry.
pub const FLAG_PREFIX: &str = "--";

/// Prefix marking a boolean-false flag (after [`FLAG_PREFIX`]).
pub const NEGATION_PREFIX: &str = "no-";

/// A flag name split into its path segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagKey {
    pub segments: Vec<String>,
    /// Written as `--no-name`.
    pub negated: bool,
}

impl FlagKey {
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

/// Normalize a bare flag name (no leading `--`).
///
/// Dashes become underscores; dots are kept as path separators. Fails if any
/// dot-delimited segment is empty. Normalizing an already-normalized name
/// returns it unchanged.
pub fn normalize_name(name: &str) -> Result<String, ArgTreeError> {
    let normalized = name.replace('-', "_");
    if normalized.split('.').any(str::is_empty) {
        return Err(ArgTreeError::InvalidKey {
            key: name.to_string(),
            index: None,
        });
    }
    Ok(normalized)
}

/// Parse a `--name`, `--no-name` or `--a.b.c` token into a [`FlagKey`].
///
/// The caller guarantees the token starts with `--`; a token without it is
/// treated as a bare name.
pub fn parse_flag(token: &str) -> Result<FlagKey, ArgTreeError> {
    let name = token.strip_prefix(FLAG_PREFIX).unwrap_or(token);
    let (name, negated) = match name.strip_prefix(NEGATION_PREFIX) {
        Some(rest) => (rest, true),
        None => (name, false),
    };

    let normalized = normalize_name(name).map_err(|_| ArgTreeError::InvalidKey {
        key: token.to_string(),
        index: None,
    })?;

    Ok(FlagKey {
        segments: normalized.split('.').map(str::to_string).collect(),
        negated,
    })
}

/// Spell a dotted key back the way a user would type it: `--db.pool-size`.
pub fn to_flag(dotted_key: &str) -> String {
    format!("{FLAG_PREFIX}{}", dotted_key.replace('_', "-"))
}

/// Spell a dotted key as the flag that sets it to `false`: `--no-db.tls`.
pub fn to_negated_flag(dotted_key: &str) -> String {
    format!("{FLAG_PREFIX}{NEGATION_PREFIX}{}", dotted_key.replace('_', "-"))
}
