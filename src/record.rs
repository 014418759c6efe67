//! Record types and their sealed instances.
//!
//! A `RecordType` pairs a name with a resolved `Schema` and an optional set
//! of hooks. Extending a type produces a new type whose schema holds the
//! parent's properties first; instances of the extension are accepted
//! wherever the parent is declared.
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::failure::ConstructionError;
use crate::resolve::Decl;
use crate::schema::Schema;
use crate::validation::{ValidationError, ValidationFailures};
use crate::value::Val;

// ————————————————————————————————————————————————————————————————————————————
// FREEZE TOGGLE
// ————————————————————————————————————————————————————————————————————————————

static FREEZE: AtomicBool = AtomicBool::new(true);

/// Records built from now on stay unsealed and accept `set` / `remove`.
pub fn disable_freeze() {
    FREEZE.store(false, Ordering::SeqCst);
}

pub fn enable_freeze() {
    FREEZE.store(true, Ordering::SeqCst);
}

pub fn freeze_enabled() -> bool {
    FREEZE.load(Ordering::SeqCst)
}

// ————————————————————————————————————————————————————————————————————————————
// HOOKS
// ————————————————————————————————————————————————————————————————————————————

pub type PreprocessFn = Arc<dyn Fn(Val) -> Val + Send + Sync>;
pub type FromJsonFn = Arc<dyn Fn(&Val) -> std::result::Result<Val, String> + Send + Sync>;
pub type InitFn = Arc<dyn Fn(&mut Init<'_>) + Send + Sync>;
pub type ValidateFn = Arc<dyn Fn(&Record, &mut ValidationFailures) + Send + Sync>;

/// Hooks a type hands down to its extensions. `preprocess` is not in here:
/// each type keeps its own and construction runs the whole chain.
#[derive(Clone, Default)]
struct Inherited {
    from_json: Option<FromJsonFn>,
    init: Option<InitFn>,
    validate: Option<ValidateFn>,
}

/// Handed to the `init` hook after assignment and before sealing.
pub struct Init<'a> {
    props: &'a IndexMap<String, Val>,
    derived: &'a mut IndexMap<String, Val>,
}

impl Init<'_> {
    pub fn get(&self, name: &str) -> Option<&Val> {
        self.props.get(name).or_else(|| self.derived.get(name))
    }

    /// Add a read-only property that is not part of the schema.
    pub fn define(&mut self, name: impl Into<String>, value: impl Into<Val>) {
        self.derived.insert(name.into(), value.into());
    }
}

// ————————————————————————————————————————————————————————————————————————————
// RECORD TYPES
// ————————————————————————————————————————————————————————————————————————————

struct TypeInner {
    name: String,
    anonymous: bool,
    schema: Schema,
    parent: Option<RecordType>,
    preprocess: Option<PreprocessFn>,
    hooks: Inherited,
}

#[derive(Clone)]
pub struct RecordType(Arc<TypeInner>);

impl RecordType {
    /// Define a type from `(name, declaration)` pairs.
    pub fn define<K, D, I>(name: &str, declarations: I) -> Result<Self>
    where
        K: Into<String>,
        D: Into<Decl>,
        I: IntoIterator<Item = (K, D)>,
    {
        Self::builder(name).properties(declarations).build()
    }

    pub fn builder(name: &str) -> RecordTypeBuilder {
        RecordTypeBuilder {
            name: name.to_string(),
            parent: None,
            declarations: Vec::new(),
            preprocess: None,
            hooks: Inherited::default(),
        }
    }

    /// Start an extending type. Its schema is this type's schema followed by
    /// the builder's declarations; hooks are inherited until replaced.
    pub fn extend(&self, name: &str) -> RecordTypeBuilder {
        RecordTypeBuilder {
            name: name.to_string(),
            parent: Some(self.clone()),
            declarations: Vec::new(),
            preprocess: None,
            hooks: self.0.hooks.clone(),
        }
    }

    /// The type behind an inline nested mapping.
    pub(crate) fn anonymous(schema: Schema) -> Self {
        RecordType(Arc::new(TypeInner {
            name: "Struct".to_string(),
            anonymous: true,
            schema,
            parent: None,
            preprocess: None,
            hooks: Inherited::default(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn is_anonymous(&self) -> bool {
        self.0.anonymous
    }

    pub fn schema(&self) -> &Schema {
        &self.0.schema
    }

    pub fn parent(&self) -> Option<&RecordType> {
        self.0.parent.as_ref()
    }

    pub fn ptr_eq(&self, other: &RecordType) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// True when `record` was built by this type or by any type extending it.
    pub fn is_instance(&self, record: &Record) -> bool {
        let mut current = Some(record.record_type());
        while let Some(ty) = current {
            if ty.ptr_eq(self) {
                return true;
            }
            current = ty.parent();
        }
        false
    }

    pub fn from_json_hook(&self) -> Option<&FromJsonFn> {
        self.0.hooks.from_json.as_ref()
    }

    /// Build a record from a single argument.
    pub fn construct(&self, input: impl Into<Val>) -> Result<Record> {
        Ok(self.instantiate(vec![input.into()])?)
    }

    /// Build a record from an explicit argument list; anything but exactly
    /// one argument is an arity failure.
    pub fn construct_args(&self, args: Vec<Val>) -> Result<Record> {
        Ok(self.instantiate(args)?)
    }

    pub(crate) fn instantiate(&self, mut args: Vec<Val>) -> std::result::Result<Record, ConstructionError> {
        if let [arg] = args.as_mut_slice() {
            let mut current = Some(self);
            while let Some(ty) = current {
                if let Some(preprocess) = &ty.0.preprocess {
                    *arg = preprocess(std::mem::replace(arg, Val::Null));
                }
                current = ty.parent();
            }
        }
        let props = self.schema().assign(self.name(), &args)?;
        let mut derived = IndexMap::new();
        if let Some(init) = &self.0.hooks.init {
            init(&mut Init { props: &props, derived: &mut derived });
        }
        Ok(Record(Arc::new(RecordData {
            ty: self.clone(),
            props,
            derived,
            sealed: freeze_enabled(),
        })))
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RecordType").field(&self.name()).finish()
    }
}

pub struct RecordTypeBuilder {
    name: String,
    parent: Option<RecordType>,
    declarations: Vec<(String, Decl)>,
    preprocess: Option<PreprocessFn>,
    hooks: Inherited,
}

impl RecordTypeBuilder {
    pub fn property(mut self, name: impl Into<String>, decl: impl Into<Decl>) -> Self {
        self.declarations.push((name.into(), decl.into()));
        self
    }

    pub fn properties<K, D, I>(mut self, declarations: I) -> Self
    where
        K: Into<String>,
        D: Into<Decl>,
        I: IntoIterator<Item = (K, D)>,
    {
        self.declarations
            .extend(declarations.into_iter().map(|(k, d)| (k.into(), d.into())));
        self
    }

    /// Rewrite the constructor argument. Runs before the parent's preprocess.
    pub fn preprocess(mut self, f: impl Fn(Val) -> Val + Send + Sync + 'static) -> Self {
        self.preprocess = Some(Arc::new(f));
        self
    }

    /// Factory from raw JSON, used by nominal coercion and revival. Returns
    /// the constructor argument to assign.
    pub fn from_json(
        mut self,
        f: impl Fn(&Val) -> std::result::Result<Val, String> + Send + Sync + 'static,
    ) -> Self {
        self.hooks.from_json = Some(Arc::new(f));
        self
    }

    pub fn init(mut self, f: impl Fn(&mut Init<'_>) + Send + Sync + 'static) -> Self {
        self.hooks.init = Some(Arc::new(f));
        self
    }

    pub fn validate(mut self, f: impl Fn(&Record, &mut ValidationFailures) + Send + Sync + 'static) -> Self {
        self.hooks.validate = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> Result<RecordType> {
        let schema = match &self.parent {
            Some(parent) => parent.schema().extend(self.declarations)?,
            None => Schema::resolve(self.declarations)?,
        };
        tracing::debug!(
            name = %self.name,
            parent = self.parent.as_ref().map(RecordType::name),
            schema = %schema.describe(),
            "defined record type"
        );
        Ok(RecordType(Arc::new(TypeInner {
            name: self.name,
            anonymous: false,
            schema,
            parent: self.parent,
            preprocess: self.preprocess,
            hooks: self.hooks,
        })))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// RECORDS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone)]
struct RecordData {
    ty: RecordType,
    props: IndexMap<String, Val>,
    derived: IndexMap<String, Val>,
    sealed: bool,
}

/// An instance produced by one successful assignment pass. Clones share the
/// same data.
#[derive(Clone)]
pub struct Record(Arc<RecordData>);

impl Record {
    pub fn record_type(&self) -> &RecordType {
        &self.0.ty
    }

    pub fn get(&self, name: &str) -> Option<&Val> {
        self.0.props.get(name).or_else(|| self.0.derived.get(name))
    }

    /// Assigned properties in schema order. Absent optionals are skipped.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Val)> {
        self.0.props.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Properties added by the `init` hook.
    pub fn derived(&self) -> impl Iterator<Item = (&str, &Val)> {
        self.0.derived.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn is_sealed(&self) -> bool {
        self.0.sealed
    }

    pub fn set(&mut self, name: &str, value: impl Into<Val>) -> Result<()> {
        if self.0.sealed {
            return Err(if self.get(name).is_some() {
                Error::ReadOnlyProperty { property: name.to_string(), type_name: self.0.ty.name().to_string() }
            } else {
                Error::NotExtensible { property: name.to_string() }
            });
        }
        Arc::make_mut(&mut self.0).props.insert(name.to_string(), value.into());
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<Option<Val>> {
        if self.0.sealed {
            if self.get(name).is_none() {
                return Ok(None);
            }
            return Err(Error::UndeletableProperty {
                property: name.to_string(),
                type_name: self.0.ty.name().to_string(),
            });
        }
        let data = Arc::make_mut(&mut self.0);
        Ok(data.props.shift_remove(name).or_else(|| data.derived.shift_remove(name)))
    }

    /// A new record of the same type: current properties with `overrides`
    /// applied, run through full construction again.
    pub fn with(&self, overrides: impl Into<Val>) -> Result<Record> {
        let merged = match overrides.into() {
            Val::Object(overrides) => {
                let mut merged = self.0.props.clone();
                merged.extend(overrides);
                Val::Object(merged)
            }
            Val::Record(other) => {
                let mut merged = self.0.props.clone();
                merged.extend(other.properties().map(|(k, v)| (k.to_string(), v.clone())));
                Val::Object(merged)
            }
            other => other,
        };
        self.0.ty.construct(merged)
    }

    /// Run the type's business validation, collecting every failure.
    pub fn validate(&self) -> Result<()> {
        let Some(validate) = &self.0.ty.0.hooks.validate else {
            return Ok(());
        };
        let mut failures = ValidationFailures::default();
        validate(self, &mut failures);
        if failures.any() {
            return Err(Error::Validation(ValidationError {
                type_name: self.0.ty.name().to_string(),
                failures: failures.into_messages(),
            }));
        }
        Ok(())
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(self.0.ty.name());
        for (name, value) in self.properties().chain(self.derived()) {
            out.field(name, value);
        }
        out.finish()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
