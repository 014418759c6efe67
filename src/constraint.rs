// Resolved property constraints. Built once per declared property; every
// later operation matches on this enum instead of re-inspecting declarations.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, Utc};

use crate::failure::Failure;
use crate::property_type::PropertyType;
use crate::record::RecordType;
use crate::value::Val;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    String,
    Number,
    Boolean,
}

impl Primitive {
    pub fn name(self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Number => "number",
            Primitive::Boolean => "boolean",
        }
    }

    fn accepts(self, value: &Val) -> bool {
        matches!(
            (self, value),
            (Primitive::String, Val::String(_))
                | (Primitive::Number, Val::Number(_))
                | (Primitive::Boolean, Val::Bool(_))
        )
    }
}

#[derive(Clone)]
pub enum Constraint {
    Primitive(Primitive),
    Any,
    Object,
    Date,
    ArrayOf(Box<Constraint>),
    UntypedArray,
    /// A named record type declared elsewhere.
    Nominal(RecordType),
    /// An inline, unnamed nested schema.
    Struct(RecordType),
    Plugin { name: String, property_type: Arc<dyn PropertyType> },
}

impl Constraint {
    /// Coerce a raw value into its canonical in-memory form.
    ///
    /// `null` is accepted by every constraint and short-circuits.
    pub fn coerce(&self, value: &Val) -> Result<Val, Failure> {
        if value.is_null() {
            return Ok(Val::Null);
        }
        match self {
            Constraint::Primitive(kind) => {
                if kind.accepts(value) {
                    Ok(value.clone())
                } else {
                    Err(Failure::mismatch(kind.name(), value.kind()))
                }
            }
            Constraint::Any => Ok(value.clone()),
            Constraint::Object => match value {
                Val::Object(_) | Val::Array(_) | Val::Date(_) | Val::Record(_) => Ok(value.clone()),
                other => Err(Failure::mismatch("object", other.kind())),
            },
            Constraint::Date => coerce_date(value),
            Constraint::ArrayOf(element) => {
                let Val::Array(items) = value else {
                    return Err(Failure::mismatch("array", value.kind()));
                };
                let mut coerced = Vec::with_capacity(items.len());
                let mut failures = Vec::new();
                for (index, item) in items.iter().enumerate() {
                    match element.coerce(item) {
                        Ok(v) => coerced.push(v),
                        Err(failure) => failures.push((index, failure)),
                    }
                }
                if failures.is_empty() {
                    Ok(Val::Array(coerced))
                } else {
                    Err(Failure::Elements(failures))
                }
            }
            Constraint::UntypedArray => match value {
                Val::Array(_) => Ok(value.clone()),
                other => Err(Failure::mismatch("array", other.kind())),
            },
            Constraint::Nominal(ty) | Constraint::Struct(ty) => coerce_record(ty, value),
            Constraint::Plugin { property_type, .. } => {
                property_type.coerce(value).map_err(Failure::Message)
            }
        }
    }

    /// Human-readable form used in signatures.
    pub fn describe(&self) -> String {
        match self {
            Constraint::Primitive(kind) => kind.name().to_string(),
            Constraint::Any => "any".to_string(),
            Constraint::Object => "object".to_string(),
            Constraint::Date => "Date".to_string(),
            Constraint::ArrayOf(element) => format!("[{}]", element.describe()),
            Constraint::UntypedArray => "Array".to_string(),
            Constraint::Nominal(ty) => ty.name().to_string(),
            Constraint::Struct(ty) => ty.schema().describe(),
            Constraint::Plugin { name, .. } => name.clone(),
        }
    }

    /// The record type behind a nominal or inline constraint.
    pub fn record_type(&self) -> Option<&RecordType> {
        match self {
            Constraint::Nominal(ty) | Constraint::Struct(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn element(&self) -> Option<&Constraint> {
        match self {
            Constraint::ArrayOf(element) => Some(element),
            _ => None,
        }
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

fn coerce_record(ty: &RecordType, value: &Val) -> Result<Val, Failure> {
    if let Val::Record(record) = value {
        if ty.is_instance(record) {
            return Ok(value.clone());
        }
    }
    if let Some(from_json) = ty.from_json_hook() {
        let props = from_json(value).map_err(Failure::Message)?;
        return ty
            .instantiate(vec![props])
            .map(Val::Record)
            .map_err(|error| Failure::Record(Box::new(error)));
    }
    match value {
        Val::Object(_) => ty
            .instantiate(vec![value.clone()])
            .map(Val::Record)
            .map_err(|error| Failure::Record(Box::new(error))),
        other => Err(Failure::mismatch(ty.name(), other.kind())),
    }
}

fn coerce_date(value: &Val) -> Result<Val, Failure> {
    match value {
        Val::Date(d) => Ok(Val::Date(d.trunc_subsecs(3))),
        Val::String(s) => parse_date(s)
            .map(|d| Val::Date(d.trunc_subsecs(3)))
            .ok_or(Failure::InvalidDate),
        Val::Number(millis) => {
            if !millis.is_finite() {
                return Err(Failure::InvalidDate);
            }
            DateTime::from_timestamp_millis(millis.trunc() as i64)
                .map(Val::Date)
                .ok_or(Failure::InvalidDate)
        }
        other => Err(Failure::mismatch("Date, string or number", other.kind())),
    }
}

/// RFC 3339, naive date-times and bare dates; the naive forms are read as UTC.
pub(crate) fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
