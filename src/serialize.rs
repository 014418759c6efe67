//! Tagged JSON and plain-object output.
//!
//! Both walk the schema in declared order and build fresh `serde_json`
//! values, so nothing returned here aliases a record's own data. Tagged
//! output puts `__type__` first in every named record; anonymous structs and
//! plain output carry no tag.
use chrono::SecondsFormat;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::constraint::Constraint;
use crate::record::Record;
use crate::schema::TYPE_TAG;
use crate::value::Val;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tagging {
    /// Named records carry `__type__`.
    Tagged,
    /// No type tags anywhere.
    Plain,
}

impl Val {
    pub fn to_json(&self, tagging: Tagging) -> Value {
        match self {
            Val::Null => Value::Null,
            Val::Bool(b) => Value::Bool(*b),
            Val::Number(n) => json_num_pref_i64(*n),
            Val::String(s) => Value::String(s.clone()),
            Val::Date(d) => Value::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Val::Array(items) => Value::Array(items.iter().map(|v| v.to_json(tagging)).collect()),
            Val::Object(map) => {
                Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json(tagging))).collect())
            }
            Val::Record(record) => record.to_json_with(tagging),
        }
    }
}

impl Constraint {
    /// Serialize a value held under this constraint.
    pub fn to_json(&self, value: &Val, tagging: Tagging) -> Value {
        match (self, value) {
            (_, Val::Null) => Value::Null,
            (Constraint::Plugin { property_type, .. }, value) => property_type.to_json(value, tagging),
            (Constraint::ArrayOf(element), Val::Array(items)) => {
                Value::Array(items.iter().map(|item| element.to_json(item, tagging)).collect())
            }
            (_, value) => value.to_json(tagging),
        }
    }
}

impl Record {
    /// Tagged JSON: every assigned property plus `__type__`.
    pub fn to_json(&self) -> Value {
        self.to_json_with(Tagging::Tagged)
    }

    /// Same traversal as [`Record::to_json`] without any type tags.
    pub fn to_plain_object(&self) -> Value {
        self.to_json_with(Tagging::Plain)
    }

    pub fn to_json_with(&self, tagging: Tagging) -> Value {
        let ty = self.record_type();
        let mut out = Map::new();
        if tagging == Tagging::Tagged && !ty.is_anonymous() {
            out.insert(TYPE_TAG.to_string(), Value::String(ty.name().to_string()));
        }
        for (name, property) in ty.schema().properties() {
            if let Some(value) = self.get(name) {
                out.insert(name.to_string(), property.constraint().to_json(value, tagging));
            }
        }
        Value::Object(out)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl Serialize for Val {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json(Tagging::Tagged).serialize(serializer)
    }
}

/// Integral numbers come out as JSON integers.
pub(crate) fn json_num_pref_i64(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property_type::{PropertyType, define_property_type};
    use crate::record::RecordType;
    use crate::resolve::Decl;
    use serde_json::json;

    #[test]
    fn tags_nested_records_and_skips_structs() {
        let other = RecordType::define("OtherType", [("n", "number")]).unwrap();
        let me = RecordType::define(
            "Self",
            [("bar", Decl::from(&other)), ("inline", Decl::structure([("y", "string")]))],
        )
        .unwrap();
        let record = me.construct(json!({"bar": {"n": 1}, "inline": {"y": "ok"}})).unwrap();
        let out = record.to_json();
        assert_eq!(
            out,
            json!({"__type__": "Self", "bar": {"__type__": "OtherType", "n": 1}, "inline": {"y": "ok"}})
        );
        assert_eq!(out.as_object().unwrap().keys().next().map(String::as_str), Some("__type__"));
        assert_eq!(record.to_plain_object(), json!({"bar": {"n": 1}, "inline": {"y": "ok"}}));
    }

    #[test]
    fn dates_use_millisecond_iso_strings() {
        let ty = RecordType::define("When", [("at", Decl::Date), ("maybe", Decl::Date)]).unwrap();
        let record = ty.construct(json!({"at": 1466869384323_i64, "maybe": null})).unwrap();
        assert_eq!(record.to_plain_object(), json!({"at": "2016-06-25T15:43:04.323Z", "maybe": null}));
    }

    #[test]
    fn untyped_arrays_serialize_each_element() {
        let inner = RecordType::define("Inner", [("a", "string")]).unwrap();
        let ty = RecordType::define("Holder", [("items", "Array")]).unwrap();
        let item = inner.construct(json!({"a": "x"})).unwrap();
        let record = ty.construct(Val::object([("items", Val::array([Val::from(item), Val::from(2.5)]))])).unwrap();
        assert_eq!(record.to_json()["items"], json!([{"__type__": "Inner", "a": "x"}, 2.5]));
    }

    #[test]
    fn absent_optionals_are_omitted() {
        let ty = RecordType::define("Opt", [("a", "string"), ("b", "number?")]).unwrap();
        let record = ty.construct(json!({"a": "x"})).unwrap();
        assert_eq!(serde_json::to_value(&record).unwrap(), json!({"__type__": "Opt", "a": "x"}));
    }

    #[test]
    fn integral_numbers_stay_integers() {
        assert_eq!(json_num_pref_i64(3.0), json!(3));
        assert_eq!(json_num_pref_i64(0.5), json!(0.5));
        assert_eq!(json_num_pref_i64(f64::NAN), Value::Null);
        assert_eq!(json_num_pref_i64(-9223372036854775808.0), json!(i64::MIN));
        let two_pow_63 = 9223372036854775808.0_f64;
        assert_eq!(json_num_pref_i64(two_pow_63), Value::from(two_pow_63));
        assert_ne!(json_num_pref_i64(two_pow_63), json!(i64::MAX));
    }

    struct Cents;

    impl PropertyType for Cents {
        fn coerce(&self, value: &Val) -> std::result::Result<Val, String> {
            match value {
                Val::Number(_) => Ok(value.clone()),
                other => Err(format!("Expected cents, was {}", other.kind())),
            }
        }

        fn to_json(&self, value: &Val, _: Tagging) -> Value {
            json!(format!("{}c", value.as_f64().unwrap_or_default()))
        }
    }

    #[test]
    fn plugin_output_applies_inside_arrays() {
        define_property_type("serialize_tests_cents", Cents).unwrap();
        let ty = RecordType::define(
            "Till",
            [("one", Decl::from("serialize_tests_cents")), ("many", Decl::list("serialize_tests_cents"))],
        )
        .unwrap();
        let record = ty.construct(json!({"one": 5, "many": [5, 6]})).unwrap();
        assert_eq!(record.to_plain_object(), json!({"one": "5c", "many": ["5c", "6c"]}));
    }
}
