//! Plugin property kinds.
//!
//! New primitive-like kinds (money, currency pairs, ...) are registered by
//! name before any schema that mentions them is resolved. A resolved
//! constraint keeps its own handle on the plugin, so registering again later
//! only affects schemas resolved afterwards.
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::serialize::Tagging;
use crate::value::Val;

/// Names resolved by the engine itself; plugins cannot shadow them.
pub const BUILTIN_KINDS: [&str; 7] = ["string", "number", "boolean", "object", "any", "Date", "Array"];

/// Coercion and equality for a registered kind.
///
/// `coerce` is also handed values it produced itself (`Record::with` re-runs
/// construction on existing property values), so it must accept its own
/// output. `null` never reaches a plugin.
pub trait PropertyType: Send + Sync {
    fn coerce(&self, value: &Val) -> std::result::Result<Val, String>;

    fn are_equal(&self, a: &Val, b: &Val) -> bool {
        a == b
    }

    fn to_json(&self, value: &Val, tagging: Tagging) -> serde_json::Value {
        value.to_json(tagging)
    }
}

static REGISTRY: Lazy<RwLock<HashMap<String, Arc<dyn PropertyType>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Make `name` available to every schema resolved from now on.
pub fn define_property_type<T>(name: &str, property_type: T) -> Result<()>
where
    T: PropertyType + 'static,
{
    if BUILTIN_KINDS.contains(&name) {
        return Err(Error::ReservedPropertyType(name.to_string()));
    }
    if name.is_empty() || name.ends_with('?') {
        return Err(Error::UnsupportedTypeDeclaration(format!("{name:?}")));
    }
    let previous = REGISTRY.write().insert(name.to_string(), Arc::new(property_type));
    if previous.is_some() {
        tracing::warn!(name, "replaced property type");
    } else {
        tracing::debug!(name, "registered property type");
    }
    Ok(())
}

pub(crate) fn lookup(name: &str) -> Option<Arc<dyn PropertyType>> {
    REGISTRY.read().get(name).cloned()
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
