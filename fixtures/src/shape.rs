//! The capability a type needs to take part in a build: construct, read and
//! write members by [`Segment`].

use alloc::string::{String, ToString};
use core::any::{Any, type_name};
use core::fmt;

use crate::builder::Assembly;
use crate::error::BuildError;
use crate::path::{PathError, Segment};
use crate::tree::{BranchNode, BuildCx};
use crate::value::{TypeKey, Value};

/// A type whose members can be addressed by path.
///
/// Implement it with [`fixture!`](crate::fixture!); the impls for scalars,
/// `String`, `Option`, `Vec` and the std maps are provided.
pub trait Fixture: Any + Sized {
    /// The zero-argument constructor, if the type has one.
    ///
    /// Types without one are "immutable": they are only ever produced by a
    /// registered or custom factory, and branches of such a type are built
    /// through a nested assembly instead of being mutated in place.
    fn default_constructor() -> Option<fn() -> Self> {
        None
    }

    /// The shape of whatever `segment` reaches, or `None` if it reaches nothing.
    fn member(segment: &Segment) -> Option<Shape>;

    /// Names of the named members, for suggestions.
    fn member_names() -> &'static [&'static str] {
        &[]
    }

    /// Read the member at `segment`. `Ok(None)` means it is currently absent
    /// (an empty `Option`, a missing map key, an index past the end).
    fn read(&self, segment: &Segment) -> Result<Option<Value>, AccessError>;

    /// Write `value` into the member at `segment`.
    fn write(&mut self, segment: &Segment, value: Value) -> Result<(), AccessError>;

    /// The erased vtable for this type.
    fn shape() -> Shape {
        Shape::of::<Self>()
    }
}

/// Type-erased view of a [`Fixture`] implementation.
#[derive(Clone, Copy)]
pub struct Shape {
    pub(crate) key: TypeKey,
    pub(crate) constructible: bool,
    pub(crate) instantiate: fn() -> Option<Value>,
    pub(crate) member: fn(&Segment) -> Option<Shape>,
    pub(crate) member_names: fn() -> &'static [&'static str],
    pub(crate) read: fn(&Value, &Segment) -> Result<Option<Value>, AccessError>,
    pub(crate) write: fn(&mut Value, &Segment, Value) -> Result<(), AccessError>,
    pub(crate) build: fn(&BranchNode, BuildCx<'_>) -> Result<Value, BuildError>,
}

impl Shape {
    /// The default vtable of `T`. Prefer [`Fixture::shape`], which a type may customize.
    pub fn of<T: Fixture>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            constructible: T::default_constructor().is_some(),
            instantiate: instantiate::<T>,
            member: T::member,
            member_names: T::member_names,
            read: read::<T>,
            write: write::<T>,
            build: build::<T>,
        }
    }

    /// Identity of the described type.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Name of the described type.
    pub fn type_name(&self) -> &'static str {
        self.key.name()
    }

    /// Whether the type has a zero-argument constructor.
    pub fn is_constructible(&self) -> bool {
        self.constructible
    }

    /// Shape of the member reached through `segment`.
    pub fn member(&self, segment: &Segment) -> Option<Shape> {
        (self.member)(segment)
    }

    /// Like [`member`](Self::member), but explains a miss.
    pub(crate) fn member_or_err(&self, segment: &Segment) -> Result<Shape, PathError> {
        self.member(segment).ok_or_else(|| PathError::NoSuchMember {
            type_name: self.type_name(),
            segment: segment.key().to_string(),
            suggestion: suggest(segment.key(), (self.member_names)()),
        })
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("type", &self.key.name())
            .field("constructible", &self.constructible)
            .finish()
    }
}

fn instantiate<T: Fixture>() -> Option<Value> {
    T::default_constructor().map(|ctor| Value::new(ctor()))
}

fn read<T: Fixture>(target: &Value, segment: &Segment) -> Result<Option<Value>, AccessError> {
    match target.downcast_ref::<T>() {
        Some(target) => target.read(segment),
        None => Err(mismatch::<T>(target, segment)),
    }
}

fn write<T: Fixture>(target: &mut Value, segment: &Segment, value: Value) -> Result<(), AccessError> {
    let actual = target.type_name();
    match target.downcast_mut::<T>() {
        Some(target) => target.write(segment, value),
        None => Err(AccessError::TypeMismatch {
            segment: segment.key().into(),
            expected: type_name::<T>(),
            actual,
        }),
    }
}

fn mismatch<T: Any>(target: &Value, segment: &Segment) -> AccessError {
    AccessError::TypeMismatch {
        segment: segment.key().into(),
        expected: type_name::<T>(),
        actual: target.type_name(),
    }
}

pub(crate) fn build<T: Fixture>(node: &BranchNode, cx: BuildCx<'_>) -> Result<Value, BuildError> {
    Assembly::<T>::new(node, cx).assemble(None, None, None).map(Value::new)
}

#[cfg(feature = "suggestions")]
fn suggest(unknown: &str, known: &'static [&'static str]) -> Option<&'static str> {
    const SIMILARITY_THRESHOLD: f64 = 0.6;

    let mut best_match: Option<(&'static str, f64)> = None;
    for candidate in known {
        let similarity = strsim::jaro_winkler(unknown, candidate);
        if similarity >= SIMILARITY_THRESHOLD
            && best_match.is_none_or(|(_, best)| similarity > best)
        {
            best_match = Some((*candidate, similarity));
        }
    }
    best_match.map(|(name, _)| name)
}

#[cfg(not(feature = "suggestions"))]
fn suggest(_unknown: &str, _known: &'static [&'static str]) -> Option<&'static str> {
    None
}

/// A failed member read or write.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AccessError {
    /// The type has no such member.
    NoSuchMember {
        /// The type that was accessed.
        type_name: &'static str,
        /// The segment key.
        segment: String,
    },

    /// The member cannot be written after construction.
    ReadOnly {
        /// The type that was accessed.
        type_name: &'static str,
        /// The segment key.
        segment: String,
    },

    /// The value handed to a write is not of the member's type.
    TypeMismatch {
        /// The segment key.
        segment: String,
        /// The member's type.
        expected: &'static str,
        /// The value's type.
        actual: &'static str,
    },

    /// A sequence write landed past the end (writing at the length appends).
    IndexOutOfBounds {
        /// The sequence type.
        type_name: &'static str,
        /// The requested index.
        index: usize,
        /// The sequence length at the time of the write.
        len: usize,
    },

    /// The indexer arguments do not convert to the collection's key type.
    BadIndex {
        /// The collection type.
        type_name: &'static str,
        /// The segment key.
        segment: String,
    },

    /// The write goes through an empty `Option` whose payload cannot be default-constructed.
    Absent {
        /// The payload type.
        type_name: &'static str,
        /// The segment key.
        segment: String,
    },
}

impl AccessError {
    /// `T` has no member at `segment`.
    pub fn no_such_member<T: ?Sized + 'static>(segment: &Segment) -> Self {
        AccessError::NoSuchMember {
            type_name: type_name::<T>(),
            segment: segment.key().into(),
        }
    }

    /// The member of `T` at `segment` is read-only.
    pub fn read_only<T: ?Sized + 'static>(segment: &Segment) -> Self {
        AccessError::ReadOnly {
            type_name: type_name::<T>(),
            segment: segment.key().into(),
        }
    }

    /// `T` cannot be indexed with the arguments of `segment`.
    pub fn bad_index<T: ?Sized + 'static>(segment: &Segment) -> Self {
        AccessError::BadIndex {
            type_name: type_name::<T>(),
            segment: segment.key().into(),
        }
    }
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessError::NoSuchMember { type_name, segment } => {
                write!(f, "`{type_name}` has no member `{segment}`")
            }
            AccessError::ReadOnly { type_name, segment } => {
                write!(f, "member `{segment}` of `{type_name}` is read-only")
            }
            AccessError::TypeMismatch {
                segment,
                expected,
                actual,
            } => write!(
                f,
                "member `{segment}` holds `{expected}`, but was given `{actual}`"
            ),
            AccessError::IndexOutOfBounds {
                type_name,
                index,
                len,
            } => write!(
                f,
                "index {index} is out of bounds for `{type_name}` of length {len}"
            ),
            AccessError::BadIndex { type_name, segment } => {
                write!(f, "`{type_name}` cannot be indexed by `{segment}`")
            }
            AccessError::Absent { type_name, segment } => {
                write!(
                    f,
                    "cannot write `{segment}` through an absent `{type_name}`"
                )
            }
        }
    }
}

impl core::error::Error for AccessError {}
