//! Revival of tagged JSON.
//!
//! A `Deserializer` is built once from a list of namespaces and maps every
//! `__type__` identifier to a record type. Revival is bottom-up: children
//! are revived before the object that holds them, so a parent's constructor
//! only ever sees already-typed nested records.
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::record::{Record, RecordType};
use crate::schema::TYPE_TAG;
use crate::value::Val;

// ————————————————————————————————————————————————————————————————————————————
// NAMESPACES
// ————————————————————————————————————————————————————————————————————————————

/// Identifier → record type.
#[derive(Debug, Clone, Default)]
pub struct Namespace(IndexMap<String, RecordType>);

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `ty` under its own name.
    pub fn insert(&mut self, ty: RecordType) -> Option<RecordType> {
        self.0.insert(ty.name().to_string(), ty)
    }

    pub fn insert_as(&mut self, name: impl Into<String>, ty: RecordType) -> Option<RecordType> {
        self.0.insert(name.into(), ty)
    }

    pub fn with(mut self, ty: RecordType) -> Self {
        self.insert(ty);
        self
    }

    pub fn get(&self, name: &str) -> Option<&RecordType> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RecordType)> {
        self.0.iter().map(|(name, ty)| (name.as_str(), ty))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<RecordType> for Namespace {
    fn from_iter<I: IntoIterator<Item = RecordType>>(iter: I) -> Self {
        let mut namespace = Namespace::new();
        for ty in iter {
            namespace.insert(ty);
        }
        namespace
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DESERIALIZER
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone)]
pub struct Deserializer {
    types: Namespace,
}

impl Deserializer {
    /// Flatten `namespaces` into one registry. Later namespaces win on
    /// clashing identifiers; a missing namespace is an error.
    pub fn for_namespaces<'a, I>(namespaces: I) -> Result<Self>
    where
        I: IntoIterator<Item = Option<&'a Namespace>>,
    {
        let mut types = Namespace::new();
        for namespace in namespaces {
            let namespace = namespace.ok_or(Error::UndefinedNamespace)?;
            for (name, ty) in namespace.iter() {
                types.insert_as(name, ty.clone());
            }
        }
        tracing::debug!(types = types.len(), "built deserializer");
        Ok(Self { types })
    }

    pub fn types(&self) -> &Namespace {
        &self.types
    }

    /// Parse JSON text and revive every tagged object in it.
    pub fn parse(&self, json: &str) -> Result<Val> {
        let value: Value = serde_json::from_str(json)?;
        self.revive(value)
    }

    /// Like [`Deserializer::parse`], but the top-level value must revive to a record.
    pub fn parse_record(&self, json: &str) -> Result<Record> {
        match self.parse(json)? {
            Val::Record(record) => Ok(record),
            other => Err(Error::NotARecord(other.kind())),
        }
    }

    pub fn revive(&self, value: Value) -> Result<Val> {
        match value {
            Value::Array(items) => Ok(Val::Array(
                items.into_iter().map(|item| self.revive(item)).collect::<Result<_>>()?,
            )),
            Value::Object(map) => {
                let mut tag = None;
                let mut props = IndexMap::with_capacity(map.len());
                for (key, value) in map {
                    if key == TYPE_TAG {
                        tag = Some(value);
                    } else {
                        props.insert(key, self.revive(value)?);
                    }
                }
                match tag.as_ref().and_then(type_identifier) {
                    Some(identifier) => self.construct(&identifier, Val::Object(props)),
                    None => {
                        if let Some(tag) = tag {
                            props.shift_insert(0, TYPE_TAG.to_string(), Val::from(tag));
                        }
                        Ok(Val::Object(props))
                    }
                }
            }
            scalar => Ok(Val::from(scalar)),
        }
    }

    fn construct(&self, identifier: &str, props: Val) -> Result<Val> {
        let ty = self
            .types
            .get(identifier)
            .ok_or_else(|| Error::UnknownType(identifier.to_string()))?;
        tracing::trace!(identifier, "reviving tagged object");
        let record = match ty.from_json_hook() {
            Some(from_json) => {
                let props = from_json(&props).map_err(|message| Error::Revival {
                    type_name: identifier.to_string(),
                    message,
                })?;
                ty.construct(props)?
            }
            None => ty.construct(props)?,
        };
        Ok(Val::Record(record))
    }
}

/// The identifier named by a `__type__` value. Falsy tags (`null`, `false`,
/// `0`, `""`) leave the object untouched; any other non-string tag can never
/// be registered and is reported as unknown by its JSON text.
fn type_identifier(tag: &Value) -> Option<String> {
    match tag {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::Decl;
    use serde_json::json;

    fn types() -> (RecordType, RecordType) {
        let bar = RecordType::define("Bar", [("baz", "number")]).unwrap();
        let foo = RecordType::define("Foo", [("bar", Decl::from(&bar))]).unwrap();
        (foo, bar)
    }

    #[test]
    fn revives_nested_tagged_objects() {
        let (foo, bar) = types();
        let deserializer = Deserializer::for_namespaces([Some(&Namespace::from_iter([foo.clone(), bar.clone()]))]).unwrap();
        let record = deserializer
            .parse_record(r#"{"__type__": "Foo", "bar": {"__type__": "Bar", "baz": 42}}"#)
            .unwrap();
        assert!(record.record_type().ptr_eq(&foo));
        let nested = record.get("bar").and_then(Val::as_record).unwrap();
        assert!(nested.record_type().ptr_eq(&bar));
        assert_eq!(nested.get("baz").and_then(Val::as_f64), Some(42.0));
    }

    #[test]
    fn undefined_namespaces_are_rejected() {
        let error = Deserializer::for_namespaces([Some(&Namespace::new()), None]).unwrap_err();
        assert_eq!(error.to_string(), "One of your namespaces is undefined.");
    }

    #[test]
    fn unknown_tags_name_the_identifier() {
        let deserializer = Deserializer::for_namespaces([]).unwrap();
        let error = deserializer.parse(r#"{ "__type__": "Junk" }"#).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Unable to deserialize an object with type \"Junk\". Make sure you register that constructor when building deserialize."
        );
    }

    #[test]
    fn untagged_values_pass_through() {
        let deserializer = Deserializer::for_namespaces([]).unwrap();
        let value = deserializer.parse(r#"{"a": [1, {"__type__": null}], "b": "x"}"#).unwrap();
        assert_eq!(value, Val::from(json!({"a": [1, {"__type__": null}], "b": "x"})));
        assert!(matches!(
            deserializer.parse_record("[1]"),
            Err(Error::NotARecord(kind)) if kind == "Array"
        ));
    }

    #[test]
    fn later_namespaces_override_earlier_ones() {
        let (foo, _) = types();
        let replacement = RecordType::define("Foo", [("x", "string")]).unwrap();
        let first = Namespace::new().with(foo);
        let second = Namespace::new().with(replacement.clone());
        let deserializer = Deserializer::for_namespaces([Some(&first), Some(&second)]).unwrap();
        let record = deserializer.parse_record(r#"{"__type__": "Foo", "x": "y"}"#).unwrap();
        assert!(record.record_type().ptr_eq(&replacement));
    }

    #[test]
    fn construction_failures_surface_as_errors() {
        let (foo, bar) = types();
        let deserializer = Deserializer::for_namespaces([Some(&Namespace::from_iter([foo, bar]))]).unwrap();
        let error = deserializer.parse(r#"{"__type__": "Bar", "baz": "nope"}"#).unwrap_err();
        assert_eq!(error.construction().unwrap().paths(), vec!["baz is invalid: Expected number, was string"]);
    }
}
