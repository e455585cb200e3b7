//! Path segments and indexer arguments.

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

/// One step of a path: a named member, or an indexer with its arguments.
///
/// Every segment carries a key that is a pure function of the access, so
/// specifying the same logical step twice yields the same key and the
/// builder tree merges instead of growing a duplicate.
#[derive(Clone)]
pub struct Segment {
    access: Access,
    key: String,
}

/// How a [`Segment`] reaches its value.
#[derive(Clone, Debug)]
pub enum Access {
    /// `parent.name`
    Member(String),
    /// `parent[arg, ...]`
    Index(Vec<IndexArg>),
}

impl Segment {
    /// A named member access.
    pub fn member(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            key: name.clone(),
            access: Access::Member(name),
        }
    }

    /// An indexer access with the given arguments.
    pub fn index(args: impl IntoIterator<Item = IndexArg>) -> Self {
        let args: Vec<IndexArg> = args.into_iter().collect();
        let mut key = String::from("[");
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                key.push_str(", ");
            }
            key.push_str(arg.repr());
        }
        key.push(']');
        Self {
            access: Access::Index(args),
            key,
        }
    }

    /// The merge key of this segment, e.g. `name` or `[3, "x"]`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// How this segment accesses its parent.
    pub fn access(&self) -> &Access {
        &self.access
    }

    /// The member name, for member segments.
    pub fn member_name(&self) -> Option<&str> {
        match &self.access {
            Access::Member(name) => Some(name),
            Access::Index(_) => None,
        }
    }

    /// The indexer arguments, for index segments.
    pub fn index_args(&self) -> Option<&[IndexArg]> {
        match &self.access {
            Access::Member(_) => None,
            Access::Index(args) => Some(args),
        }
    }

    /// The argument of a one-argument indexer.
    pub fn single_index(&self) -> Option<&IndexArg> {
        match self.index_args()? {
            [arg] => Some(arg),
            _ => None,
        }
    }

    /// Whether this is an indexer access.
    pub fn is_index(&self) -> bool {
        matches!(self.access, Access::Index(_))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Segment({})", self.key)
    }
}

/// A concrete indexer argument.
///
/// Arguments are evaluated when the path is specified, never deferred: the
/// rendering of every argument is part of the segment key.
#[derive(Clone)]
pub struct IndexArg {
    kind: ArgKind,
    repr: String,
}

#[derive(Clone)]
enum ArgKind {
    Int(i128),
    Str(String),
    Bool(bool),
    Char(char),
    Key(Rc<dyn Any>),
}

impl IndexArg {
    /// An integer literal. Converts to whichever integer type the indexer takes.
    pub fn int(n: i128) -> Self {
        Self {
            kind: ArgKind::Int(n),
            repr: n.to_string(),
        }
    }

    /// A string literal.
    pub fn str(s: impl Into<String>) -> Self {
        let s = s.into();
        Self {
            repr: alloc::format!("{s:?}"),
            kind: ArgKind::Str(s),
        }
    }

    /// A boolean literal.
    pub fn bool(b: bool) -> Self {
        Self {
            kind: ArgKind::Bool(b),
            repr: b.to_string(),
        }
    }

    /// A character literal.
    pub fn char(c: char) -> Self {
        Self {
            kind: ArgKind::Char(c),
            repr: alloc::format!("{c:?}"),
        }
    }

    /// An arbitrary key value, such as a struct used as a map key.
    ///
    /// The key participates in the segment key through its `Debug` rendering,
    /// so equal keys must render equally.
    pub fn key<K: Any + fmt::Debug>(key: K) -> Self {
        Self {
            repr: alloc::format!("{key:?}"),
            kind: ArgKind::Key(Rc::new(key)),
        }
    }

    /// The rendering used in segment keys.
    pub fn repr(&self) -> &str {
        &self.repr
    }

    /// Convert the argument to the key type an indexer expects.
    ///
    /// Integer literals convert to any integer type that can hold them,
    /// string literals to `String`; explicit keys only to their own type.
    pub fn to_key<K: Any + Clone>(&self) -> Option<K> {
        match &self.kind {
            ArgKind::Int(n) => int_key::<K>(*n),
            ArgKind::Str(s) => (s as &dyn Any).downcast_ref::<K>().cloned(),
            ArgKind::Bool(b) => (b as &dyn Any).downcast_ref::<K>().cloned(),
            ArgKind::Char(c) => (c as &dyn Any).downcast_ref::<K>().cloned(),
            ArgKind::Key(key) => key.downcast_ref::<K>().cloned(),
        }
    }
}

fn int_key<K: Any + Clone>(n: i128) -> Option<K> {
    macro_rules! try_as {
        ($($t:ty),*) => {$(
            if let Ok(v) = <$t>::try_from(n) {
                if let Some(key) = (&v as &dyn Any).downcast_ref::<K>() {
                    return Some(key.clone());
                }
            }
        )*};
    }
    try_as!(usize, u8, u16, u32, u64, u128, isize, i8, i16, i32, i64, i128);
    None
}

impl fmt::Debug for IndexArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}

macro_rules! int_args {
    ($($t:ty),*) => {$(
        impl From<$t> for IndexArg {
            fn from(n: $t) -> Self {
                IndexArg::int(n as i128)
            }
        }
    )*};
}

int_args!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl From<&str> for IndexArg {
    fn from(s: &str) -> Self {
        IndexArg::str(s)
    }
}

impl From<String> for IndexArg {
    fn from(s: String) -> Self {
        IndexArg::str(s)
    }
}

impl From<bool> for IndexArg {
    fn from(b: bool) -> Self {
        IndexArg::bool(b)
    }
}

impl From<char> for IndexArg {
    fn from(c: char) -> Self {
        IndexArg::char(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Coord {
        x: i32,
        y: i32,
    }

    #[test]
    fn index_keys_render_their_arguments() {
        let segment = Segment::index([IndexArg::from(3), IndexArg::from("x")]);
        assert_eq!(segment.key(), r#"[3, "x"]"#);
        assert!(segment.is_index());
        assert!(segment.single_index().is_none());
    }

    #[test]
    fn integer_literals_merge_across_integer_types() {
        assert_eq!(
            Segment::index([IndexArg::from(2u8)]).key(),
            Segment::index([IndexArg::from(2usize)]).key()
        );
        assert_eq!(IndexArg::from(2u8).to_key::<usize>(), Some(2));
        assert_eq!(IndexArg::int(-1).to_key::<usize>(), None);
        assert_eq!(IndexArg::int(-1).to_key::<i64>(), Some(-1));
    }

    #[test]
    fn explicit_keys_convert_only_to_their_own_type() {
        let arg = IndexArg::key(Coord { x: 1, y: 2 });
        assert_eq!(arg.repr(), "Coord { x: 1, y: 2 }");
        assert_eq!(arg.to_key::<Coord>(), Some(Coord { x: 1, y: 2 }));
        assert_eq!(arg.to_key::<String>(), None);
    }
}
