//! Paths from a root type down to one of its members.
//!
//! A [`Path`] is either built with the method DSL
//!
//! ```
//! use fixtures::Path;
//!
//! let path = Path::root().field("lines").index(0).field("quantity");
//! assert_eq!(path.to_string(), "lines[0].quantity");
//! ```
//!
//! or parsed from accessor text with [`Path::parse`] (see [`IntoPath`] for
//! what every `with*` method accepts).

mod error;
mod parse;
mod segment;

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

pub use error::PathError;
pub use segment::{Access, IndexArg, Segment};

/// An ordered list of [`Segment`]s, outermost first.
#[derive(Clone, Default)]
pub struct Path {
    segments: Vec<Segment>,
    /// The accessor text this path was parsed from, if any.
    source: Option<String>,
}

impl Path {
    /// The empty path. Extend it with [`field`](Self::field) and friends.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse accessor text such as `o => o.customer.name` or `lines[0].qty`.
    pub fn parse(text: &str) -> Result<Self, PathError> {
        let expr = parse::parse(text)?;
        let segments = parse::decompose(&expr, text)?;
        Ok(Self {
            segments,
            source: Some(text.to_string()),
        })
    }

    /// Step into the member `name`.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.push(Segment::member(name));
        self
    }

    /// Step through a one-argument indexer.
    pub fn index(self, arg: impl Into<IndexArg>) -> Self {
        self.index_args([arg.into()])
    }

    /// Step through a one-argument indexer keyed by an arbitrary value.
    pub fn index_key<K: core::any::Any + fmt::Debug>(self, key: K) -> Self {
        self.index_args([IndexArg::key(key)])
    }

    /// Step through an indexer whose argument is computed by `f`.
    ///
    /// `f` runs now, while the path is specified; its result becomes part of
    /// the segment key.
    pub fn index_with<A: Into<IndexArg>>(self, f: impl FnOnce() -> A) -> Self {
        self.index(f())
    }

    /// Step through an indexer with any number of arguments.
    pub fn index_args(mut self, args: impl IntoIterator<Item = IndexArg>) -> Self {
        self.push(Segment::index(args));
        self
    }

    /// Append a segment in place.
    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
        self.source = None;
    }

    /// The segments, outermost first.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether the path names the root itself.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Reject the empty path.
    pub(crate) fn non_empty(self) -> Result<Self, PathError> {
        if self.is_empty() {
            return Err(PathError::Empty {
                expression: self.to_string(),
            });
        }
        Ok(self)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 && !segment.is_index() {
                f.write_str(".")?;
            }
            f.write_str(segment.key())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "Path({self} from `{source}`)"),
            None => write!(f, "Path({self})"),
        }
    }
}

/// Anything that names a member of the root: a [`Path`] or accessor text.
pub trait IntoPath {
    /// Convert to a path, failing for unsupported or malformed accessors.
    fn into_path(self) -> Result<Path, PathError>;
}

impl IntoPath for Path {
    fn into_path(self) -> Result<Path, PathError> {
        Ok(self)
    }
}

impl IntoPath for &Path {
    fn into_path(self) -> Result<Path, PathError> {
        Ok(self.clone())
    }
}

impl IntoPath for &str {
    fn into_path(self) -> Result<Path, PathError> {
        Path::parse(self)
    }
}

impl IntoPath for String {
    fn into_path(self) -> Result<Path, PathError> {
        Path::parse(&self)
    }
}

impl IntoPath for &String {
    fn into_path(self) -> Result<Path, PathError> {
        Path::parse(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dsl_and_text_produce_the_same_keys() {
        let dsl = Path::root().field("items").index_args([IndexArg::from(3), IndexArg::from("x")]);
        let text = Path::parse(r#"o => o.items[3, "x"]"#).unwrap();
        assert_eq!(dsl.to_string(), text.to_string());
        assert_eq!(dsl.to_string(), r#"items[3, "x"]"#);
    }

    #[test]
    fn index_with_is_evaluated_immediately() {
        let mut calls = 0;
        let path = Path::root().field("scores").index_with(|| {
            calls += 1;
            "alice"
        });
        assert_eq!(calls, 1);
        assert_eq!(path.to_string(), r#"scores["alice"]"#);
    }

    #[test]
    fn empty_paths_are_rejected_for_registration() {
        assert_eq!(Path::root().to_string(), "<root>");
        assert_eq!(
            Path::root().non_empty().unwrap_err(),
            PathError::Empty {
                expression: "<root>".into()
            }
        );
    }
}
