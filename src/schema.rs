//! Schemas and the assignment algorithm.
//!
//! A `Schema` is an ordered mapping from property name to `Property`. Its
//! identity (not its content) is what makes two records the same type:
//! clones share one allocation and `ptr_eq` compares that.
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::constraint::Constraint;
use crate::error::Result;
use crate::failure::{Actual, ConstructionError, Failure};
use crate::resolve::{Decl, resolve_property};
use crate::value::Val;

/// Reserved key carrying the type identifier in tagged JSON.
pub const TYPE_TAG: &str = "__type__";

#[derive(Debug, Clone)]
pub struct Property {
    constraint: Constraint,
    optional: bool,
    metadata: Option<Value>,
}

impl Property {
    pub fn new(constraint: Constraint) -> Self {
        Self { constraint, optional: false, metadata: None }
    }

    pub fn into_optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn metadata(&self) -> Option<&Value> {
        self.metadata.as_ref()
    }

    pub fn describe(&self) -> String {
        let base = self.constraint.describe();
        if self.optional { format!("{base}?") } else { base }
    }
}

#[derive(Debug, Clone)]
pub struct Schema(Arc<IndexMap<String, Property>>);

impl Schema {
    pub fn new(properties: IndexMap<String, Property>) -> Self {
        Self(Arc::new(properties))
    }

    /// Resolve every declared property. The first unresolvable declaration
    /// aborts: a schema is either fully usable or not created at all.
    pub fn resolve<K, I>(declarations: I) -> Result<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Decl)>,
    {
        Ok(Self::new(resolve_all(declarations)?))
    }

    /// A new schema holding this schema's properties followed by `declarations`.
    /// A re-declared name replaces the inherited property in place.
    pub fn extend<K, I>(&self, declarations: I) -> Result<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Decl)>,
    {
        let mut properties = self.0.as_ref().clone();
        properties.extend(resolve_all(declarations)?);
        Ok(Self::new(properties))
    }

    pub fn ptr_eq(&self, other: &Schema) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.0.get(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.0.iter().map(|(name, property)| (name.as_str(), property))
    }

    pub fn property_names(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Signature such as `{ a:string, b:[number] }`.
    pub fn describe(&self) -> String {
        let body = self
            .0
            .iter()
            .map(|(name, property)| format!("{name}:{}", property.describe()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{{ {body} }}")
    }

    /// Validate and coerce one constructor call.
    ///
    /// Every problem is collected: unexpected keys, missing keys and each
    /// property that fails coercion all end up in the same report.
    pub fn assign(&self, type_name: &str, args: &[Val]) -> std::result::Result<IndexMap<String, Val>, ConstructionError> {
        let error = |actual: Actual, failures: Vec<(String, Failure)>| ConstructionError {
            type_name: type_name.to_string(),
            expected: self.describe(),
            actual,
            failures,
        };

        let [arg] = args else {
            return Err(error(Actual::Arguments(args.len()), Vec::new()));
        };
        let supplied: Vec<(&str, &Val)> = match arg {
            Val::Object(map) => map.iter().map(|(k, v)| (k.as_str(), v)).collect(),
            Val::Record(record) => record.properties().collect(),
            other => return Err(error(Actual::Value(other.kind()), Vec::new())),
        };
        let supplied: IndexMap<&str, &Val> =
            supplied.into_iter().filter(|(name, _)| *name != TYPE_TAG).collect();

        let mut failures = Vec::new();

        let mut unexpected: Vec<&str> =
            supplied.keys().copied().filter(|name| !self.0.contains_key(*name)).collect();
        unexpected.sort_unstable();
        failures.extend(unexpected.into_iter().map(|name| (name.to_string(), Failure::Unexpected)));

        for (name, property) in self.0.iter() {
            if !property.optional && !supplied.contains_key(name.as_str()) {
                failures.push((name.clone(), Failure::Missing));
            }
        }

        let mut assigned = IndexMap::with_capacity(self.0.len());
        for (name, property) in self.0.iter() {
            let Some(value) = supplied.get(name.as_str()) else {
                continue;
            };
            match property.constraint.coerce(value) {
                Ok(coerced) => {
                    assigned.insert(name.clone(), coerced);
                }
                Err(failure) => failures.push((name.clone(), failure)),
            }
        }

        if failures.is_empty() {
            return Ok(assigned);
        }
        let mut actual: Vec<(String, String)> =
            supplied.iter().map(|(name, value)| (name.to_string(), value.kind())).collect();
        actual.sort_by(|a, b| a.0.cmp(&b.0));
        Err(error(Actual::Properties(actual), failures))
    }
}

fn resolve_all<K, I>(declarations: I) -> Result<IndexMap<String, Property>>
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Decl)>,
{
    declarations
        .into_iter()
        .map(|(name, decl)| Ok((name.into(), resolve_property(&decl)?)))
        .collect()
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
