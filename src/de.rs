//! Serde `Deserializer` over a finalized [`Value`], coercing string leaves on
//! demand.
//!
//! Command-line and file values arrive as strings, so the target type decides
//! how to read them: a `u16` field parses `"8080"`, a `bool` field accepts
//! `"true"`/`"false"`, a `Vec<String>` accepts a single string as a
//! one-element list, and a unit enum variant is picked by name.

use std::collections::btree_map;
use std::fmt;

use serde::de::value::{MapAccessDeserializer, MapDeserializer, SeqDeserializer, StringDeserializer};
use serde::de::{self, DeserializeOwned, DeserializeSeed, IntoDeserializer, MapAccess, Unexpected, Visitor};

use crate::value::{Map, Value};

/// Deserialize any `T` from a finalized value.
///
/// ```
/// #[derive(serde::Deserialize)]
/// struct Server { port: u16, verbose: bool }
///
/// let tree = argtree::parse(["--port", "8080", "--verbose"]).unwrap();
/// let server: Server = argtree::from_map(tree).unwrap();
/// assert_eq!(server.port, 8080);
/// assert!(server.verbose);
/// ```
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, DeError> {
    T::deserialize(ValueDeserializer::new(value))
}

/// Deserialize any `T` from a finalized top-level map.
pub fn from_map<T: DeserializeOwned>(map: Map) -> Result<T, DeError> {
    from_value(Value::Map(map))
}

/// Deserialization failure, tagged with the dotted key it happened under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeError {
    message: String,
    path: Option<String>,
}

impl DeError {
    /// Dotted key of the innermost value that failed, `None` at the top level.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    fn within(mut self, path: &str) -> Self {
        self.path.get_or_insert_with(|| path.to_string());
        self
    }
}

impl fmt::Display for DeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DeError {}

impl de::Error for DeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        DeError {
            message: msg.to_string(),
            path: None,
        }
    }
}

pub struct ValueDeserializer {
    value: Value,
    path: String,
}

impl ValueDeserializer {
    pub fn new(value: Value) -> Self {
        Self::at(value, String::new())
    }

    fn at(value: Value, path: String) -> Self {
        Self { value, path }
    }

    fn unexpected(&self) -> Unexpected<'_> {
        match &self.value {
            Value::Str(s) => Unexpected::Str(s),
            Value::Bool(b) => Unexpected::Bool(*b),
            Value::List(_) => Unexpected::Seq,
            Value::Map(_) => Unexpected::Map,
        }
    }

    fn invalid_type(&self, expected: &dyn de::Expected) -> DeError {
        de::Error::invalid_type(self.unexpected(), expected)
    }
}

impl<'de> IntoDeserializer<'de, DeError> for Value {
    type Deserializer = ValueDeserializer;

    fn into_deserializer(self) -> ValueDeserializer {
        ValueDeserializer::new(self)
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

macro_rules! deserialize_parsed {
    ($($method:ident => $visit:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
                match &self.value {
                    Value::Str(s) => match s.trim().parse::<$ty>() {
                        Ok(n) => visitor.$visit(n),
                        Err(_) => Err(de::Error::invalid_value(Unexpected::Str(s), &visitor)),
                    },
                    _ => Err(self.invalid_type(&visitor)),
                }
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = DeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        match self.value {
            Value::Str(s) => visitor.visit_string(s),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::List(items) => {
                let mut seq = SeqDeserializer::<_, DeError>::new(items.into_iter().map(Value::Str));
                let out = visitor.visit_seq(&mut seq)?;
                seq.end()?;
                Ok(out)
            }
            Value::Map(map) => visitor.visit_map(Entries {
                entries: map.into_iter(),
                pending: None,
                prefix: self.path,
            }),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        match &self.value {
            Value::Bool(b) => visitor.visit_bool(*b),
            Value::Str(s) => match parse_bool(s) {
                Some(b) => visitor.visit_bool(b),
                None => Err(de::Error::invalid_value(Unexpected::Str(s), &visitor)),
            },
            _ => Err(self.invalid_type(&visitor)),
        }
    }

    deserialize_parsed! {
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_i64 => visit_i64: i64,
        deserialize_i128 => visit_i128: i128,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_u128 => visit_u128: u128,
        deserialize_f32 => visit_f32: f32,
        deserialize_f64 => visit_f64: f64,
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        match &self.value {
            Value::Str(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => visitor.visit_char(c),
                    _ => Err(de::Error::invalid_value(Unexpected::Str(s), &visitor)),
                }
            }
            _ => Err(self.invalid_type(&visitor)),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        match self.value {
            Value::Str(s) => visitor.visit_string(s),
            _ => Err(self.invalid_type(&visitor)),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        // Absent keys are the only way to express "none".
        visitor.visit_some(self)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DeError> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DeError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        match self.value {
            Value::Str(s) => {
                let mut seq = SeqDeserializer::<_, DeError>::new(std::iter::once(Value::Str(s)));
                let out = visitor.visit_seq(&mut seq)?;
                seq.end()?;
                Ok(out)
            }
            Value::List(_) => self.deserialize_any(visitor),
            _ => Err(self.invalid_type(&visitor)),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, DeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        match self.value {
            Value::Map(_) => self.deserialize_any(visitor),
            _ => Err(self.invalid_type(&visitor)),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DeError> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DeError> {
        match self.value {
            Value::Str(s) => visitor.visit_enum(s.into_deserializer()),
            Value::Map(map) if map.len() == 1 => {
                visitor.visit_enum(MapAccessDeserializer::new(MapDeserializer::<_, DeError>::new(
                    map.into_iter(),
                )))
            }
            _ => Err(self.invalid_type(&visitor)),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        visitor.visit_unit()
    }

    serde::forward_to_deserialize_any! {
        bytes byte_buf
    }
}

/// Map access whose value deserializers know their dotted key.
struct Entries {
    entries: btree_map::IntoIter<String, Value>,
    pending: Option<(String, Value)>,
    prefix: String,
}

impl<'de> MapAccess<'de> for Entries {
    type Error = DeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>, DeError> {
        let Some((key, value)) = self.entries.next() else {
            return Ok(None);
        };
        let out = seed.deserialize(StringDeserializer::<DeError>::new(key.clone()))?;
        self.pending = Some((key, value));
        Ok(Some(out))
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, DeError> {
        let Some((key, value)) = self.pending.take() else {
            return Err(de::Error::custom("map value requested before its key"));
        };
        let path = if self.prefix.is_empty() {
            key
        } else {
            format!("{}.{key}", self.prefix)
        };
        seed.deserialize(ValueDeserializer::at(value, path.clone()))
            .map_err(|e| e.within(&path))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Database {
        url: String,
        pool_size: usize,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "lowercase")]
    enum Mode {
        Fast,
        Slow,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct App {
        host: String,
        port: u16,
        debug: bool,
        ratio: f64,
        mode: Mode,
        tags: Vec<String>,
        nickname: Option<String>,
        database: Database,
    }

    #[test]
    fn coerces_into_typed_struct() {
        let tree = parse([
            "--host", "0.0.0.0", "--port", "8080", "--debug", "--ratio", "0.25", "--mode", "slow",
            "--tags", "a", "--tags", "b", "--database.url", "pg://", "--database.pool-size", "5",
        ])
        .unwrap();
        let app: App = from_map(tree).unwrap();
        assert_eq!(
            app,
            App {
                host: "0.0.0.0".into(),
                port: 8080,
                debug: true,
                ratio: 0.25,
                mode: Mode::Slow,
                tags: vec!["a".into(), "b".into()],
                nickname: None,
                database: Database {
                    url: "pg://".into(),
                    pool_size: 5,
                },
            }
        );
    }

    #[test]
    fn single_string_as_list() {
        #[derive(Deserialize)]
        struct Tags {
            tags: Vec<String>,
        }
        let tags: Tags = from_map(parse(["--tags", "only"]).unwrap()).unwrap();
        assert_eq!(tags.tags, vec!["only"]);
    }

    #[test]
    fn bool_from_string() {
        let value = Value::from("yes");
        assert!(from_value::<bool>(value).unwrap());
        assert!(!from_value::<bool>(Value::from("False")).unwrap());
    }

    #[test]
    fn bad_number_is_invalid_value() {
        let err = from_value::<u16>(Value::from("eighty")).unwrap_err();
        assert!(err.to_string().contains("eighty"));
    }

    #[test]
    fn out_of_range_number_fails() {
        assert!(from_value::<u8>(Value::from("300")).is_err());
    }

    #[test]
    fn flag_is_not_a_string() {
        let err = from_value::<String>(Value::from(true)).unwrap_err();
        assert!(err.to_string().contains("boolean"));
    }

    #[test]
    fn map_into_hashmap() {
        let map: HashMap<String, String> =
            from_map(parse(["--a", "1", "--b", "2"]).unwrap()).unwrap();
        assert_eq!(map["a"], "1");
        assert_eq!(map["b"], "2");
    }

    #[test]
    fn unknown_enum_variant_fails() {
        assert!(from_value::<Mode>(Value::from("medium")).is_err());
    }

    #[test]
    fn missing_required_field_fails() {
        let err = from_map::<Database>(parse(["--url", "pg://"]).unwrap()).unwrap_err();
        assert!(err.to_string().contains("pool_size"));
    }

    #[test]
    fn char_from_single_letter() {
        assert_eq!(from_value::<char>(Value::from("x")).unwrap(), 'x');
        assert!(from_value::<char>(Value::from("xy")).is_err());
    }

    #[test]
    fn error_names_the_nested_key() {
        let tree = parse(["--database.url", "pg://", "--database.pool-size", "abc"]).unwrap();
        let err = from_map::<App>(tree.clone()).unwrap_err();
        assert_eq!(err.path(), Some("database.pool_size"));
        assert!(err.to_string().contains("abc"));

        let err = from_map::<Database>(tree["database"].as_map().unwrap().clone()).unwrap_err();
        assert_eq!(err.path(), Some("pool_size"));
    }

    #[test]
    fn missing_field_names_the_enclosing_key() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Outer {
            database: Database,
        }
        let err = from_map::<Outer>(parse(["--database.url", "pg://"]).unwrap()).unwrap_err();
        assert_eq!(err.path(), Some("database"));
        assert!(err.to_string().contains("pool_size"));
    }

    #[test]
    fn top_level_error_has_no_path() {
        let err = from_map::<Database>(parse(["--url", "pg://"]).unwrap()).unwrap_err();
        assert_eq!(err.path(), None);
    }
}
