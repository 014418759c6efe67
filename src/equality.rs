// Equality engine. Records compare by schema identity plus per-property
// equality under each property's constraint; everything untyped compares
// structurally.

use crate::constraint::Constraint;
use crate::record::Record;
use crate::schema::Schema;
use crate::serialize::Tagging;
use crate::value::Val;

impl Constraint {
    pub fn are_equal(&self, a: &Val, b: &Val) -> bool {
        match (a.is_null(), b.is_null()) {
            (true, true) => return true,
            (true, false) | (false, true) => return false,
            (false, false) => {}
        }
        match self {
            Constraint::Primitive(_) | Constraint::Any | Constraint::Object => {
                a.to_json(Tagging::Plain) == b.to_json(Tagging::Plain)
            }
            Constraint::Date => match (a, b) {
                (Val::Date(x), Val::Date(y)) => x == y,
                _ => a == b,
            },
            Constraint::ArrayOf(element) => match (a, b) {
                (Val::Array(xs), Val::Array(ys)) => {
                    xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| element.are_equal(x, y))
                }
                _ => false,
            },
            Constraint::UntypedArray => a == b,
            Constraint::Nominal(_) | Constraint::Struct(_) => match (a, b) {
                (Val::Record(x), Val::Record(y)) => x.is_equal_to(y),
                _ => false,
            },
            Constraint::Plugin { property_type, .. } => property_type.are_equal(a, b),
        }
    }
}

impl Schema {
    /// Property-wise equality of two assigned property sets under this
    /// schema. An absent optional property equals only another absent one.
    pub fn are_equal(&self, a: &Record, b: &Record) -> bool {
        self.properties().all(|(name, property)| match (a.get(name), b.get(name)) {
            (None, None) => true,
            (Some(x), Some(y)) => property.constraint().are_equal(x, y),
            _ => false,
        })
    }
}

impl Record {
    /// Same schema identity and every declared property equal.
    pub fn is_equal_to(&self, other: &Record) -> bool {
        let schema = self.record_type().schema();
        schema.ptr_eq(other.record_type().schema()) && schema.are_equal(self, other)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal_to(other)
    }
}

impl PartialEq for Val {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Val::Null, Val::Null) => true,
            (Val::Bool(a), Val::Bool(b)) => a == b,
            (Val::Number(a), Val::Number(b)) => a == b,
            (Val::String(a), Val::String(b)) => a == b,
            (Val::Date(a), Val::Date(b)) => a == b,
            (Val::Array(a), Val::Array(b)) => a == b,
            (Val::Object(a), Val::Object(b)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            (Val::Record(a), Val::Record(b)) => a.is_equal_to(b),
            _ => false,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
