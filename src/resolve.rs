//! Declaration → constraint resolution.
//!
//! A `Decl` is the schema declaration language: primitive or plugin names,
//! `[T]`, the untyped `Array` marker, `Date`, references to record types and
//! nested mappings. Resolution happens once, when a type is defined.
use serde_json::Value;

use crate::constraint::{Constraint, Primitive};
use crate::deserialize::Namespace;
use crate::error::{Error, Result};
use crate::property_type;
use crate::record::RecordType;
use crate::schema::{Property, Schema};

#[derive(Debug, Clone)]
pub enum Decl {
    /// `"string"`, `"number?"`, `"money"`, ...
    Name(String),
    /// `[T]`; anything but exactly one element is malformed.
    List(Vec<Decl>),
    /// The untyped `Array` marker.
    Array,
    Date,
    Record(RecordType),
    /// Inline nested mapping.
    Struct(Vec<(String, Decl)>),
    Optional(Box<Decl>),
    WithMetadata(Box<Decl>, Value),
    /// Any other declared shape; always rejected.
    Literal(Value),
}

impl Decl {
    pub fn list(element: impl Into<Decl>) -> Self {
        Decl::List(vec![element.into()])
    }

    pub fn structure<K, D, I>(fields: I) -> Self
    where
        K: Into<String>,
        D: Into<Decl>,
        I: IntoIterator<Item = (K, D)>,
    {
        Decl::Struct(fields.into_iter().map(|(k, d)| (k.into(), d.into())).collect())
    }

    pub fn optional(inner: impl Into<Decl>) -> Self {
        Decl::Optional(Box::new(inner.into()))
    }

    pub fn with_metadata(inner: impl Into<Decl>, metadata: Value) -> Self {
        Decl::WithMetadata(Box::new(inner.into()), metadata)
    }

    /// Read a declaration written as JSON. Strings name kinds, `"Date"`,
    /// `"Array"` or a type already present in `types`; arrays and objects
    /// nest; every other JSON value is kept as an unsupported literal.
    pub fn from_json(value: &Value, types: &Namespace) -> Self {
        match value {
            Value::String(name) => match name.as_str() {
                "Date" => Decl::Date,
                "Array" => Decl::Array,
                other => {
                    let (base, optional) = match other.strip_suffix('?') {
                        Some(base) => (base, true),
                        None => (other, false),
                    };
                    let decl = match types.get(base) {
                        Some(ty) => Decl::Record(ty.clone()),
                        None if optional => Decl::Name(base.to_string()),
                        None => return Decl::Name(other.to_string()),
                    };
                    if optional { Decl::optional(decl) } else { decl }
                }
            },
            Value::Array(items) => {
                Decl::List(items.iter().map(|item| Decl::from_json(item, types)).collect())
            }
            Value::Object(fields) => Decl::Struct(
                fields
                    .iter()
                    .map(|(name, decl)| (name.clone(), Decl::from_json(decl, types)))
                    .collect(),
            ),
            other => Decl::Literal(other.clone()),
        }
    }
}

impl From<&str> for Decl {
    fn from(name: &str) -> Self {
        Decl::Name(name.to_string())
    }
}

impl From<String> for Decl {
    fn from(name: String) -> Self {
        Decl::Name(name)
    }
}

impl From<RecordType> for Decl {
    fn from(ty: RecordType) -> Self {
        Decl::Record(ty)
    }
}

impl From<&RecordType> for Decl {
    fn from(ty: &RecordType) -> Self {
        Decl::Record(ty.clone())
    }
}

/// Resolve one declared property, honouring the optional marker and metadata.
pub fn resolve_property(decl: &Decl) -> Result<Property> {
    match decl {
        Decl::Optional(inner) => Ok(resolve_property(inner)?.into_optional()),
        Decl::WithMetadata(inner, metadata) => {
            Ok(resolve_property(inner)?.with_metadata(metadata.clone()))
        }
        Decl::Name(name) if name.ends_with('?') => {
            let base = &name[..name.len() - 1];
            Ok(Property::new(resolve_name(base, name)?).into_optional())
        }
        other => Ok(Property::new(resolve(other)?)),
    }
}

/// Resolve a declaration into a constraint.
pub fn resolve(decl: &Decl) -> Result<Constraint> {
    match decl {
        Decl::Name(name) => resolve_name(name.strip_suffix('?').unwrap_or(name), name),
        Decl::List(elements) => match elements.as_slice() {
            [element] => Ok(Constraint::ArrayOf(Box::new(resolve(element)?))),
            _ => Err(Error::MalformedArrayDeclaration),
        },
        Decl::Array => Ok(Constraint::UntypedArray),
        Decl::Date => Ok(Constraint::Date),
        Decl::Record(ty) => Ok(Constraint::Nominal(ty.clone())),
        Decl::Struct(fields) => {
            let schema = Schema::resolve(fields.iter().map(|(k, d)| (k.clone(), d.clone())))?;
            Ok(Constraint::Struct(RecordType::anonymous(schema)))
        }
        Decl::Optional(inner) | Decl::WithMetadata(inner, _) => resolve(inner),
        Decl::Literal(value) => Err(Error::UnsupportedTypeDeclaration(value.to_string())),
    }
}

fn resolve_name(base: &str, declared: &str) -> Result<Constraint> {
    let constraint = match base {
        "string" => Constraint::Primitive(Primitive::String),
        "number" => Constraint::Primitive(Primitive::Number),
        "boolean" => Constraint::Primitive(Primitive::Boolean),
        "object" => Constraint::Object,
        "any" => Constraint::Any,
        "Date" => Constraint::Date,
        "Array" => Constraint::UntypedArray,
        _ => match property_type::lookup(base) {
            Some(property_type) => Constraint::Plugin { name: base.to_string(), property_type },
            None => {
                return Err(Error::UnsupportedTypeDeclaration(format!("{declared:?}")));
            }
        },
    };
    Ok(constraint)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
