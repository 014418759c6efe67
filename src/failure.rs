//! Failure trees.
//!
//! Construction never stops at the first bad property: every declared
//! property is coerced and every problem lands in one `ConstructionError`.
//! Nested records and typed arrays contribute their own sub-trees, so the
//! rendered report reads top-down like this:
//!
//! ```text
//! Foo was constructed with invalid property values
//!   Expected: { a:string, c:[number] }
//!   Actual:   { a:number, c:Array }
//!   a is invalid:
//!     Expected string, was number
//!   c is invalid:
//!     [1] is invalid:
//!       Expected number, was string
//! ```
use std::fmt;

/// Why a single property (or array element) was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// Wrong runtime kind for the declared constraint.
    Mismatch { expected: String, actual: String },
    /// A date-like value that does not denote a finite instant.
    InvalidDate,
    /// A required property was not supplied.
    Missing,
    /// A supplied property is not declared.
    Unexpected,
    /// Free-form reason, e.g. from a plugin property type or a `from_json` hook.
    Message(String),
    /// Positional failures inside a typed array; every bad element is listed.
    Elements(Vec<(usize, Failure)>),
    /// A nested record could not be constructed.
    Record(Box<ConstructionError>),
}

impl Failure {
    pub fn mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Failure::Mismatch { expected: expected.into(), actual: actual.into() }
    }

    fn lines(&self, indent: usize, out: &mut Vec<String>) {
        let pad = " ".repeat(indent);
        match self {
            Failure::Mismatch { expected, actual } => {
                out.push(format!("{pad}Expected {expected}, was {actual}"));
            }
            Failure::InvalidDate => out.push(format!("{pad}Invalid Date")),
            Failure::Missing => out.push(format!("{pad}Property is missing")),
            Failure::Unexpected => out.push(format!("{pad}Property is unexpected")),
            Failure::Message(message) => out.push(format!("{pad}{message}")),
            Failure::Elements(elements) => {
                for (index, failure) in elements {
                    out.push(format!("{pad}[{index}] is invalid:"));
                    failure.lines(indent + 2, out);
                }
            }
            Failure::Record(error) => error.lines(indent, out),
        }
    }

    fn paths(&self, path: &str, out: &mut Vec<String>) {
        match self {
            Failure::Elements(elements) => {
                for (index, failure) in elements {
                    failure.paths(&format!("{path}[{index}]"), out);
                }
            }
            Failure::Record(error) if error.failures.is_empty() => {
                out.push(format!("{path} is invalid: {}", error.actual));
            }
            Failure::Record(error) => error.collect_paths(&format!("{path}."), out),
            leaf => {
                let mut message = Vec::new();
                leaf.lines(0, &mut message);
                out.push(format!("{path} is invalid: {}", message.join(" ")));
            }
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::new();
        self.lines(0, &mut lines);
        f.write_str(&lines.join("\n"))
    }
}

/// What the caller actually handed to the constructor.
#[derive(Debug, Clone, PartialEq)]
pub enum Actual {
    /// Wrong number of constructor arguments.
    Arguments(usize),
    /// A single argument that was not object-shaped.
    Value(String),
    /// Supplied property names with their kinds, sorted by name.
    Properties(Vec<(String, String)>),
}

impl fmt::Display for Actual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actual::Arguments(count) => write!(f, "{count} arguments"),
            Actual::Value(kind) => write!(f, "{kind} (expected object)"),
            Actual::Properties(props) => {
                let body = props
                    .iter()
                    .map(|(name, kind)| format!("{name}:{kind}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{{ {body} }}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Arity,
    Shape,
    PropertySetMismatch,
    PropertyCoercion,
}

/// A failed construction: the owning type's signature, the supplied shape and
/// every per-property failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructionError {
    pub type_name: String,
    pub expected: String,
    pub actual: Actual,
    pub failures: Vec<(String, Failure)>,
}

impl std::error::Error for ConstructionError {}

impl ConstructionError {
    pub fn kind(&self) -> FailureKind {
        match &self.actual {
            Actual::Arguments(_) => FailureKind::Arity,
            Actual::Value(_) => FailureKind::Shape,
            Actual::Properties(_) => {
                let key_mismatch = self
                    .failures
                    .iter()
                    .any(|(_, f)| matches!(f, Failure::Missing | Failure::Unexpected));
                if key_mismatch {
                    FailureKind::PropertySetMismatch
                } else {
                    FailureKind::PropertyCoercion
                }
            }
        }
    }

    /// The failure recorded for a top-level property, if any.
    pub fn failure(&self, property: &str) -> Option<&Failure> {
        self.failures.iter().find(|(name, _)| name == property).map(|(_, f)| f)
    }

    /// Flatten the tree into fully qualified lines such as
    /// `x.y[2] is invalid: Expected number, was string`.
    pub fn paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.failures.is_empty() {
            out.push(format!("{} is invalid: {}", self.type_name, self.actual));
        }
        self.collect_paths("", &mut out);
        out
    }

    fn collect_paths(&self, prefix: &str, out: &mut Vec<String>) {
        for (name, failure) in &self.failures {
            failure.paths(&format!("{prefix}{name}"), out);
        }
    }

    fn lines(&self, indent: usize, out: &mut Vec<String>) {
        let pad = " ".repeat(indent);
        out.push(format!("{pad}{} was constructed with invalid property values", self.type_name));
        out.push(format!("{pad}  Expected: {}", self.expected));
        out.push(format!("{pad}  Actual:   {}", self.actual));
        for (name, failure) in &self.failures {
            out.push(format!("{pad}  {name} is invalid:"));
            failure.lines(indent + 4, out);
        }
    }
}

impl fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::new();
        self.lines(0, &mut lines);
        f.write_str(&lines.join("\n"))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;

    fn nested() -> ConstructionError {
        ConstructionError {
            type_name: "Outer".into(),
            expected: "{ x:{ y:[number] } }".into(),
            actual: Actual::Properties(vec![("x".into(), "object".into())]),
            failures: vec![(
                "x".into(),
                Failure::Record(Box::new(ConstructionError {
                    type_name: "Struct".into(),
                    expected: "{ y:[number] }".into(),
                    actual: Actual::Properties(vec![("y".into(), "Array".into())]),
                    failures: vec![(
                        "y".into(),
                        Failure::Elements(vec![(2, Failure::mismatch("number", "string"))]),
                    )],
                })),
            )],
        }
    }

    #[test]
    fn renders_indented_tree() {
        assert_eq!(
            nested().to_string(),
            "Outer was constructed with invalid property values\n\
             \x20 Expected: { x:{ y:[number] } }\n\
             \x20 Actual:   { x:object }\n\
             \x20 x is invalid:\n\
             \x20   Struct was constructed with invalid property values\n\
             \x20     Expected: { y:[number] }\n\
             \x20     Actual:   { y:Array }\n\
             \x20     y is invalid:\n\
             \x20       [2] is invalid:\n\
             \x20         Expected number, was string"
        );
    }

    #[test]
    fn flattens_to_qualified_paths() {
        assert_eq!(nested().paths(), vec!["x.y[2] is invalid: Expected number, was string"]);
    }

    #[test]
    fn empty_property_list_renders_with_two_spaces() {
        assert_eq!(Actual::Properties(vec![]).to_string(), "{  }");
        assert_eq!(Actual::Arguments(0).to_string(), "0 arguments");
    }

    #[test]
    fn classifies_failures() {
        let mut error = nested();
        assert_eq!(error.kind(), FailureKind::PropertyCoercion);
        error.failures.push(("z".into(), Failure::Unexpected));
        assert_eq!(error.kind(), FailureKind::PropertySetMismatch);
        error.actual = Actual::Arguments(2);
        assert_eq!(error.kind(), FailureKind::Arity);
    }
}
