//! Business-rule validation, run explicitly after construction.
use std::fmt;

/// Collector handed to a type's `validate` hook.
#[derive(Debug, Default)]
pub struct ValidationFailures {
    messages: Vec<String>,
}

impl ValidationFailures {
    pub fn add(&mut self, message: impl Into<String>) -> &mut Self {
        self.messages.push(message.into());
        self
    }

    /// Failures added through the returned handle are prefixed with `property`.
    pub fn for_property<'a>(&'a mut self, property: &'a str) -> PropertyFailures<'a> {
        PropertyFailures { failures: self, property }
    }

    pub fn any(&self) -> bool {
        !self.messages.is_empty()
    }

    pub fn describe(&self) -> String {
        self.messages.join(", ")
    }

    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }
}

pub struct PropertyFailures<'a> {
    failures: &'a mut ValidationFailures,
    property: &'a str,
}

impl PropertyFailures<'_> {
    pub fn add(&mut self, message: impl AsRef<str>) -> &mut Self {
        self.failures.add(format!("{} {}", self.property, message.as_ref()));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub type_name: String,
    pub failures: Vec<String>,
}

impl std::error::Error for ValidationError {}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is invalid: {}", self.type_name, self.failures.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_failures_in_order() {
        let mut failures = ValidationFailures::default();
        assert!(!failures.any());
        failures.add("first");
        failures.for_property("name").add("is blank").add("is short");
        assert_eq!(failures.describe(), "first, name is blank, name is short");
        let error = ValidationError { type_name: "Person".into(), failures: failures.into_messages() };
        assert_eq!(error.to_string(), "Person is invalid: first, name is blank, name is short");
    }
}
