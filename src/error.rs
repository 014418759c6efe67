use thiserror::Error;

use crate::failure::ConstructionError;
use crate::validation::ValidationError;

/// Everything that can go wrong while defining, building, sealing or
/// reviving records.
///
/// Declaration errors (`UnsupportedTypeDeclaration`, `MalformedArrayDeclaration`)
/// are raised while a type is being defined, so a type that cannot be
/// resolved never becomes usable. Per-instance problems are collected into a
/// single [`ConstructionError`].
#[derive(Error, Debug)]
pub enum Error {
    #[error("Property defined as unsupported type ({0})")]
    UnsupportedTypeDeclaration(String),

    #[error("Expected array property definition with single type element")]
    MalformedArrayDeclaration,

    #[error("{0}")]
    Construction(#[from] ConstructionError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error(
        "Unable to deserialize an object with type \"{0}\". Make sure you register that constructor when building deserialize."
    )]
    UnknownType(String),

    #[error("Unable to revive an object with type \"{type_name}\": {message}")]
    Revival { type_name: String, message: String },

    #[error("One of your namespaces is undefined.")]
    UndefinedNamespace,

    #[error("Cannot add property {property}, object is not extensible")]
    NotExtensible { property: String },

    #[error("Cannot assign to read only property '{property}' of object '#<{type_name}>'")]
    ReadOnlyProperty { property: String, type_name: String },

    #[error("Cannot delete property '{property}' of #<{type_name}>")]
    UndeletableProperty { property: String, type_name: String },

    #[error("Property type \"{0}\" is built in and cannot be redefined")]
    ReservedPropertyType(String),

    #[error("Expected a record, was {0}")]
    NotARecord(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The structured failure report, when this is a construction failure.
    pub fn construction(&self) -> Option<&ConstructionError> {
        match self {
            Error::Construction(error) => Some(error),
            _ => None,
        }
    }
}
