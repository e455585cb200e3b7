use alloc::boxed::Box;
use alloc::string::{String, ToString};
use core::any::type_name;
use core::cell::{Cell, RefCell};
use core::ptr;

use super::{BranchNode, BuildCx, Walk};
use crate::builder::Assembly;
use crate::error::BuildError;
use crate::path::Segment;
use crate::registry::Registry;
use crate::shape::{Fixture, Shape};
use crate::tracing_macros::trace;
use crate::value::{TypeKey, Value};

/// Where a leaf's value comes from.
pub(crate) trait Source {
    /// Type of the produced values.
    fn type_key(&self) -> TypeKey;

    /// Produce one value. Called on every resolution.
    fn produce(&self, path: &str, cx: BuildCx<'_>) -> Result<Value, BuildError>;
}

/// A fixed value, cloned into every build.
pub(crate) struct Literal<V>(pub(crate) V);

impl<V: Clone + 'static> Source for Literal<V> {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<V>()
    }

    fn produce(&self, _path: &str, _cx: BuildCx<'_>) -> Result<Value, BuildError> {
        Ok(Value::new(self.0.clone()))
    }
}

/// A zero-argument generator, invoked once per resolution.
pub(crate) struct Generator<V> {
    f: RefCell<Box<dyn FnMut() -> V>>,
}

impl<V: 'static> Generator<V> {
    pub(crate) fn new(f: impl FnMut() -> V + 'static) -> Self {
        Self {
            f: RefCell::new(Box::new(f)),
        }
    }
}

impl<V: 'static> Source for Generator<V> {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<V>()
    }

    fn produce(&self, path: &str, _cx: BuildCx<'_>) -> Result<Value, BuildError> {
        let mut f = self.f.try_borrow_mut().map_err(|_| BuildError::Cycle {
            path: path.to_string(),
        })?;
        Ok(Value::new(f()))
    }
}

/// A generator that reads other paths of the builder rooted at `T`.
pub(crate) struct Derived<T, V> {
    f: Box<dyn Fn(&Assembly<'_, T>) -> Result<V, BuildError>>,
}

impl<T: Fixture, V: 'static> Derived<T, V> {
    pub(crate) fn new(f: impl Fn(&Assembly<'_, T>) -> Result<V, BuildError> + 'static) -> Self {
        Self { f: Box::new(f) }
    }
}

impl<T: Fixture, V: 'static> Source for Derived<T, V> {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<V>()
    }

    fn produce(&self, path: &str, cx: BuildCx<'_>) -> Result<Value, BuildError> {
        if cx.origin.shape().key() != TypeKey::of::<T>() {
            return Err(BuildError::TypeMismatch {
                path: path.to_string(),
                expected: type_name::<T>(),
                actual: cx.origin.shape().type_name(),
            });
        }
        let view = Assembly::<T>::new(cx.origin, cx);
        (self.f)(&view).map(Value::new)
    }
}

/// Substitution of registered type defaults for zero values.
#[derive(Clone, Copy)]
pub(crate) struct Defaults {
    is_zero: fn(&Value) -> bool,
    lookup: fn(&Registry) -> Option<Value>,
}

impl Defaults {
    /// Treat `V::default()` as the zero value of `V`.
    pub(crate) fn of<V: Default + PartialEq + 'static>() -> Self {
        Self {
            is_zero: is_zero::<V>,
            lookup: lookup::<V>,
        }
    }
}

fn is_zero<V: Default + PartialEq + 'static>(value: &Value) -> bool {
    value.downcast_ref::<V>().is_some_and(|v| *v == V::default())
}

fn lookup<V: 'static>(registry: &Registry) -> Option<Value> {
    registry.type_default::<V>().map(|f| Value::new(f()))
}

/// A terminal segment.
pub(crate) struct ValueNode {
    segment: Segment,
    path: String,
    source: Box<dyn Source>,
    defaults: Option<Defaults>,
    consumed_by: Cell<Option<*const BranchNode>>,
    resolving: Cell<bool>,
}

impl ValueNode {
    pub(crate) fn new(
        segment: Segment,
        path: String,
        source: Box<dyn Source>,
        defaults: Option<Defaults>,
    ) -> Self {
        Self {
            segment,
            path,
            source,
            defaults,
            consumed_by: Cell::new(None),
            resolving: Cell::new(false),
        }
    }

    pub(crate) fn mark_consumed(&self, by: &BranchNode) {
        self.consumed_by.set(Some(ptr::from_ref(by)));
    }

    pub(crate) fn reset_consumed(&self) {
        self.consumed_by.set(None);
    }

    /// Produce this leaf's value, substituting the registered type default
    /// for a zero value when defaults are allowed.
    pub(crate) fn resolve(&self, cx: BuildCx<'_>) -> Result<Value, BuildError> {
        if self.resolving.replace(true) {
            return Err(BuildError::Cycle {
                path: self.path.clone(),
            });
        }
        let produced = self.source.produce(&self.path, cx);
        self.resolving.set(false);
        let value = produced?;

        let Some(defaults) = self.defaults else {
            return Ok(value);
        };
        if !(defaults.is_zero)(&value) {
            return Ok(value);
        }
        match (defaults.lookup)(cx.registry) {
            Some(substitute) => {
                trace!(path = %self.path, "substituting registered type default");
                Ok(substitute)
            }
            None => Ok(value),
        }
    }

    /// Resolve and write into `parent`, unless the factory `walk` follows
    /// already used this leaf.
    pub(crate) fn apply_to(
        &self,
        parent: &mut Value,
        parent_shape: &Shape,
        walk: Walk<'_>,
        cx: BuildCx<'_>,
    ) -> Result<(), BuildError> {
        if walk.skips(self.consumed_by.get()) {
            trace!(path = %self.path, "skipping value consumed by constructor");
            return Ok(());
        }
        let value = self.resolve(cx)?;
        trace!(path = %self.path, ?value, "writing value");
        (parent_shape.write)(parent, &self.segment, value)
            .map_err(|source| BuildError::access(&self.path, source))
    }
}
