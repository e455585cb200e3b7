//! Errors raised while turning an accessor into a path, or a path into tree nodes.

use alloc::string::String;

/// Error returned when a path cannot be decomposed or does not fit the target type.
///
/// All of these are caller bugs: nothing is retried and nothing is logged.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PathError {
    /// The accessor contains something other than member and indexer accesses.
    UnsupportedPathExpression {
        /// The kind of the offending node, e.g. "method call `len`".
        node: String,
        /// The full accessor text.
        expression: String,
    },

    /// The accessor text is not a well-formed expression.
    Syntax {
        /// The full accessor text.
        expression: String,
        /// Byte offset of the problem.
        position: usize,
        /// What was wrong there.
        message: String,
    },

    /// The accessor names the root itself; there is nothing to set.
    Empty {
        /// The full accessor text, or `<root>` for an empty [`Path`](crate::Path).
        expression: String,
    },

    /// A segment names a member the type does not have.
    NoSuchMember {
        /// Name of the type that was searched.
        type_name: &'static str,
        /// The segment key that was not found.
        segment: String,
        /// A member with a similar name, if one exists.
        suggestion: Option<&'static str>,
    },

    /// The value registered for a leaf has a different type than the member it targets.
    LeafTypeMismatch {
        /// The leaf's segment key.
        segment: String,
        /// The member's declared type.
        expected: &'static str,
        /// The type of the supplied value.
        actual: &'static str,
    },
}

impl core::fmt::Display for PathError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PathError::UnsupportedPathExpression { node, expression } => {
                write!(
                    f,
                    "unsupported path expression: {node} in `{expression}`; paths may only contain member and indexer accesses"
                )
            }
            PathError::Syntax {
                expression,
                position,
                message,
            } => {
                write!(f, "invalid path `{expression}` at offset {position}: {message}")
            }
            PathError::Empty { expression } => {
                write!(f, "path `{expression}` does not reach any member of the root")
            }
            PathError::NoSuchMember {
                type_name,
                segment,
                suggestion,
            } => {
                write!(f, "`{type_name}` has no member `{segment}`")?;
                if let Some(suggestion) = suggestion {
                    write!(f, " (did you mean `{suggestion}`?)")?;
                }
                Ok(())
            }
            PathError::LeafTypeMismatch {
                segment,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "member `{segment}` holds `{expected}`, but the supplied value is `{actual}`"
                )
            }
        }
    }
}

impl core::error::Error for PathError {}
