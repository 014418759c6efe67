//! Single-string record types.
//!
//! A scalar type has one `value: string` property and also accepts a bare
//! string as its constructor argument, so `"GBP"` and `{"value": "GBP"}`
//! build the same record.
use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::Result;
use crate::record::{Record, RecordType, RecordTypeBuilder};
use crate::value::Val;

/// What `encodeURIComponent` escapes.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// What `encodeURI` escapes: the component set minus reserved delimiters.
const URI: &AsciiSet = &COMPONENT
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'#');

/// Start a scalar type; further properties or hooks may be added.
///
/// The shorthand works both as a constructor argument and wherever the type
/// is declared as a property.
pub fn builder(name: &str) -> RecordTypeBuilder {
    RecordType::builder(name)
        .property("value", "string")
        .preprocess(expand)
        .from_json(|raw| Ok(expand(raw.clone())))
}

fn expand(input: Val) -> Val {
    match input {
        Val::String(value) => Val::object([("value", value)]),
        other => other,
    }
}

pub fn define(name: &str) -> Result<RecordType> {
    builder(name).build()
}

/// String helpers over a record's `value` property.
#[derive(Debug, Clone, Copy)]
pub struct ScalarView<'a> {
    type_name: &'a str,
    value: &'a str,
}

impl<'a> ScalarView<'a> {
    pub fn value(&self) -> &'a str {
        self.value
    }

    /// Percent-encoded like ECMAScript `encodeURI`.
    pub fn uri_encoded(&self) -> String {
        utf8_percent_encode(self.value, URI).to_string()
    }

    /// Percent-encoded like ECMAScript `encodeURIComponent`.
    pub fn uri_component_encoded(&self) -> String {
        utf8_percent_encode(self.value, COMPONENT).to_string()
    }

    /// Component encoding with spaces as `+`.
    pub fn query_encoded(&self) -> String {
        self.uri_component_encoded().replace("%20", "+")
    }
}

impl fmt::Display for ScalarView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{ value: '{}' }}", self.type_name, self.value)
    }
}

impl Record {
    /// `None` unless the record holds a string `value`.
    pub fn scalar(&self) -> Option<ScalarView<'_>> {
        let value = self.get("value")?.as_str()?;
        Some(ScalarView { type_name: self.record_type().name(), value })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
