//! Errors raised while assembling and while registering.

use alloc::string::{String, ToString};
use core::any::type_name;
use core::fmt;

use crate::path::PathError;
use crate::registry::RegistrationKind;
use crate::shape::AccessError;

/// Error returned by [`Builder::build`](crate::Builder::build) and by
/// [`Assembly::from`](crate::Assembly::from).
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum BuildError {
    /// The type cannot be produced: no custom factory, no registered
    /// constructor and no zero-argument constructor.
    Configuration {
        /// The type that could not be constructed.
        type_name: &'static str,
        /// What is missing.
        reason: String,
    },

    /// A member could not be read or written while applying a path.
    Access {
        /// The full path of the node being applied.
        path: String,
        /// What went wrong at that member.
        source: AccessError,
    },

    /// A value read through [`Assembly::from`](crate::Assembly::from) is not of the requested type.
    TypeMismatch {
        /// The path that was read.
        path: String,
        /// The type the caller asked for.
        expected: &'static str,
        /// The type of the stored value.
        actual: &'static str,
    },

    /// A path handed to [`Assembly::from`](crate::Assembly::from) is malformed.
    Path(PathError),

    /// A derived value ended up reading itself.
    Cycle {
        /// The path of the value that was being resolved again.
        path: String,
    },

    /// A factory gave up.
    Factory {
        /// The type the factory builds.
        type_name: &'static str,
        /// The factory's explanation.
        message: String,
    },
}

impl BuildError {
    /// Failure raised from inside a factory for `T`.
    pub fn factory<T: ?Sized + 'static>(message: impl fmt::Display) -> Self {
        BuildError::Factory {
            type_name: type_name::<T>(),
            message: message.to_string(),
        }
    }

    pub(crate) fn access(path: &str, source: AccessError) -> Self {
        BuildError::Access {
            path: path.to_string(),
            source,
        }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Configuration { type_name, reason } => {
                write!(f, "cannot construct `{type_name}`: {reason}")
            }
            BuildError::Access { path, source } => write!(f, "at `{path}`: {source}"),
            BuildError::TypeMismatch {
                path,
                expected,
                actual,
            } => write!(
                f,
                "`{path}` was read as `{expected}`, but it holds `{actual}`"
            ),
            BuildError::Path(err) => write!(f, "{err}"),
            BuildError::Cycle { path } => {
                write!(f, "the value at `{path}` depends on itself")
            }
            BuildError::Factory { type_name, message } => {
                write!(f, "factory for `{type_name}` failed: {message}")
            }
        }
    }
}

impl core::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            BuildError::Access { source, .. } => Some(source),
            BuildError::Path(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PathError> for BuildError {
    fn from(err: PathError) -> Self {
        BuildError::Path(err)
    }
}

/// Error returned when a registration conflicts with an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistrationError {
    /// A constructor, post-build action or type default is already present
    /// for the type, in the store or earlier in the same batch.
    Duplicate {
        /// The type the registration is for.
        type_name: &'static str,
        /// Which registration conflicted.
        kind: RegistrationKind,
    },
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::Duplicate { type_name, kind } => write!(
                f,
                "a {kind} has already been registered for type `{type_name}`"
            ),
        }
    }
}

impl core::error::Error for RegistrationError {}

/// Any error this crate produces.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// See [`PathError`].
    Path(PathError),
    /// See [`BuildError`].
    Build(BuildError),
    /// See [`RegistrationError`].
    Registration(RegistrationError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Path(err) => write!(f, "{err}"),
            Error::Build(err) => write!(f, "{err}"),
            Error::Registration(err) => write!(f, "{err}"),
        }
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Error::Path(err) => Some(err),
            Error::Build(err) => Some(err),
            Error::Registration(err) => Some(err),
        }
    }
}

impl From<PathError> for Error {
    fn from(err: PathError) -> Self {
        Error::Path(err)
    }
}

impl From<BuildError> for Error {
    fn from(err: BuildError) -> Self {
        Error::Build(err)
    }
}

impl From<RegistrationError> for Error {
    fn from(err: RegistrationError) -> Self {
        Error::Registration(err)
    }
}
