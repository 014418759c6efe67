//! Immutable, schema-checked value records over JSON-shaped data.
//!
//! A record type is declared once as an ordered set of named property
//! declarations. Declarations are resolved into [`Constraint`]s at definition
//! time; every construction then coerces the input against them, collecting
//! every failure into one [`ConstructionError`]. Successful constructions
//! are sealed [`Record`]s with structural equality, tagged JSON output
//! (`__type__`) and revival through a [`Deserializer`].
//!
//! ```
//! use json_vo::{Decl, RecordType, Val};
//! use serde_json::json;
//!
//! let money = RecordType::define("Money", [("amount", "number"), ("currency", "string")])?;
//! let order = RecordType::define("Order", [("total", Decl::from(&money)), ("lines", Decl::list("string"))])?;
//!
//! let order = order.construct(json!({"total": {"amount": 5, "currency": "GBP"}, "lines": ["tea"]}))?;
//! assert_eq!(order.get("total").and_then(|t| t.get("currency")), Some(&Val::from("GBP")));
//! assert_eq!(order.to_json()["total"]["__type__"], "Money");
//! # Ok::<(), json_vo::Error>(())
//! ```

pub mod constraint;
pub mod deserialize;
pub mod equality;
pub mod error;
pub mod failure;
pub mod property_type;
pub mod record;
pub mod resolve;
pub mod scalar;
pub mod schema;
pub mod serialize;
pub mod validation;
pub mod value;

pub use constraint::{Constraint, Primitive};
pub use deserialize::{Deserializer, Namespace};
pub use error::{Error, Result};
pub use failure::{Actual, ConstructionError, Failure, FailureKind};
pub use property_type::{PropertyType, define_property_type};
pub use record::{Init, Record, RecordType, RecordTypeBuilder, disable_freeze, enable_freeze, freeze_enabled};
pub use resolve::{Decl, resolve, resolve_property};
pub use scalar::ScalarView;
pub use schema::{Property, Schema, TYPE_TAG};
pub use serialize::Tagging;
pub use validation::{ValidationError, ValidationFailures};
pub use value::Val;
