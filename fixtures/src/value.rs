//! Type identity and type-erased values.

use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;
use core::hash::{Hash, Hasher};

use crate::path::Segment;
use crate::shape::AccessError;

/// Stable identity of a type within a process.
///
/// Equality and hashing go through the [`TypeId`]; the type name is carried
/// along for messages only, since `type_name` makes no uniqueness promise.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// The key of `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: core::any::type_name::<T>(),
        }
    }

    /// The underlying [`TypeId`].
    pub fn id(self) -> TypeId {
        self.id
    }

    /// The fully-qualified type name, e.g. `alloc::string::String`.
    pub fn name(self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

/// An owned value of some [`Fixture`](crate::Fixture) type, with its type erased.
///
/// This is what flows between tree nodes and a type's member accessors:
/// resolved leaves, nested objects read from a parent, and freshly built
/// nested values.
pub struct Value {
    inner: Box<dyn Any>,
    key: TypeKey,
}

impl Value {
    /// Erase `value`.
    pub fn new<T: Any>(value: T) -> Self {
        Self {
            inner: Box::new(value),
            key: TypeKey::of::<T>(),
        }
    }

    /// The key of the erased type.
    pub fn type_key(&self) -> TypeKey {
        self.key
    }

    /// The name of the erased type.
    pub fn type_name(&self) -> &'static str {
        self.key.name()
    }

    /// Whether the erased value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Borrow the value as a `T`, if that is what it is.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Mutably borrow the value as a `T`, if that is what it is.
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.inner.downcast_mut::<T>()
    }

    /// Take the value back out as a `T`, or get it back unchanged.
    pub fn downcast<T: Any>(self) -> Result<T, Value> {
        let key = self.key;
        match self.inner.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(inner) => Err(Value { inner, key }),
        }
    }

    /// Take the value out as the declared type of the member at `segment`.
    ///
    /// Used by [`Fixture::write`](crate::Fixture::write) implementations.
    pub fn into_member<T: Any>(self, segment: &Segment) -> Result<T, AccessError> {
        self.downcast::<T>().map_err(|value| AccessError::TypeMismatch {
            segment: segment.key().into(),
            expected: core::any::type_name::<T>(),
            actual: value.type_name(),
        })
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value<{}>", self.key.name())
    }
}
