#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

extern crate alloc;

mod tracing_macros;

mod builder;
mod error;
mod impls;
mod macros;
mod path;
mod registry;
mod shape;
mod tree;
mod value;

pub use builder::{Assembly, Builder};
pub use error::{BuildError, Error, RegistrationError};
pub use path::{Access, IndexArg, IntoPath, Path, PathError, Segment};
#[cfg(feature = "discovery")]
pub use registry::Discovered;
pub use registry::{
    Factory, PostBuild, Register, RegistrationKind, Registrations, Registry, TypeDefault,
};
pub use shape::{AccessError, Fixture, Shape};
pub use value::{TypeKey, Value};

#[doc(hidden)]
pub mod __private {
    #[cfg(feature = "discovery")]
    pub use inventory;
}
