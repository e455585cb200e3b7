//! The per-builder tree of registered paths.
//!
//! Intermediate segments become [`BranchNode`]s and terminal segments become
//! [`ValueNode`]s. Registering the same segment twice under the same parent
//! reuses the existing node, so overlapping paths share structure.

mod branch;
mod leaf;

#[cfg(test)]
pub(crate) use branch::BranchKind;
pub(crate) use branch::BranchNode;
pub(crate) use leaf::{Defaults, Derived, Generator, Literal, Source, ValueNode};

use alloc::string::String;
use core::ptr;

use crate::path::Segment;
use crate::registry::Registry;

/// What every node needs while a build is running.
#[derive(Clone, Copy)]
pub(crate) struct BuildCx<'a> {
    pub(crate) registry: &'a Registry,
    /// Root of the builder that started the build. Derived values read
    /// through it, even from inside a nested build.
    pub(crate) origin: &'a BranchNode,
}

/// A child found by [`BranchNode::find`].
#[derive(Clone, Copy)]
pub(crate) enum NodeRef<'a> {
    Branch(&'a BranchNode),
    Value(&'a ValueNode),
}

impl NodeRef<'_> {
    /// Record that the factory of the assembly over `by` read this node.
    pub(crate) fn mark_consumed(self, by: &BranchNode) {
        match self {
            NodeRef::Branch(branch) => branch.mark_consumed(by),
            NodeRef::Value(leaf) => leaf.mark_consumed(by),
        }
    }
}

/// Which factory reads an application walk leaves alone.
#[derive(Clone, Copy)]
pub(crate) enum Walk<'a> {
    /// Filling the instance built for the assembly over this node: whatever
    /// its factory read is already in place.
    After(&'a BranchNode),
    /// Producing a whole value for a running factory.
    Full,
}

impl Walk<'_> {
    fn skips(self, consumed_by: Option<*const BranchNode>) -> bool {
        match (self, consumed_by) {
            (Walk::After(owner), Some(reader)) => ptr::eq(owner, reader),
            _ => false,
        }
    }
}

/// Full path of a child, rendered the way [`Path`](crate::Path) displays.
fn child_path(parent: &str, segment: &Segment) -> String {
    let mut path = String::from(parent);
    if !parent.is_empty() && !segment.is_index() {
        path.push('.');
    }
    path.push_str(segment.key());
    path
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;

    use super::*;
    use crate::Fixture;
    use crate::path::{IntoPath, PathError};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Address {
        city: String,
        street: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Money {
        cents: i64,
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Customer {
        name: String,
        address: Address,
        balance: Option<Money>,
    }

    crate::fixture! { Address: Default { city: String, street: String } }
    crate::fixture! { Money { cents: i64 } }
    crate::fixture! { Customer: Default { name: String, address: Address, balance: Option<Money> } }

    fn insert<V: Clone + 'static>(root: &mut BranchNode, path: &str, value: V) -> Result<(), PathError> {
        let path = path.into_path()?;
        let (leaf, parents) = path.segments().split_last().unwrap();
        let mut node = root;
        for segment in parents {
            node = node.add_or_get_branch(segment)?;
        }
        node.add_or_get_value(leaf, Box::new(Literal(value)), None)?;
        Ok(())
    }

    #[test]
    fn overlapping_paths_share_their_branches() {
        let mut root = BranchNode::root(Customer::shape());
        insert(&mut root, "address.city", String::from("Oslo")).unwrap();
        insert(&mut root, "o => o.address.street", String::from("Main")).unwrap();
        insert(&mut root, "name", String::from("Ada")).unwrap();

        assert_eq!(root.len(), 2);
        let Some(NodeRef::Branch(address)) = root.find("address") else {
            panic!("address should be a branch");
        };
        assert_eq!(address.len(), 2);
        assert_eq!(address.kind(), BranchKind::Composite);
        assert!(matches!(address.find("city"), Some(NodeRef::Value(_))));
        assert!(root.find("missing").is_none());
    }

    #[test]
    fn branches_without_a_constructor_build_through_a_nested_assembly() {
        let mut root = BranchNode::root(Customer::shape());
        insert(&mut root, "balance.cents", 5i64).unwrap();
        let Some(NodeRef::Branch(balance)) = root.find("balance") else {
            panic!("balance should be a branch");
        };
        assert_eq!(balance.kind(), BranchKind::Builder);
        assert_eq!(balance.shape().type_name(), core::any::type_name::<Option<Money>>());
    }

    #[test]
    fn leaves_must_match_the_member_type() {
        let mut root = BranchNode::root(Customer::shape());
        let err = insert(&mut root, "name", 3u32).unwrap_err();
        assert_eq!(
            err,
            PathError::LeafTypeMismatch {
                segment: "name".into(),
                expected: core::any::type_name::<String>(),
                actual: "u32",
            }
        );
        assert_eq!(root.len(), 0);
    }

    #[test]
    fn unknown_members_are_rejected_at_registration() {
        let mut root = BranchNode::root(Customer::shape());
        let err = insert(&mut root, "adress.city", String::new()).unwrap_err();
        let PathError::NoSuchMember { segment, .. } = &err else {
            panic!("unexpected error {err:?}");
        };
        assert_eq!(segment, "adress");
        #[cfg(feature = "suggestions")]
        assert!(err.to_string().ends_with("(did you mean `address`?)"));
    }

    #[test]
    fn child_paths_render_like_paths() {
        assert_eq!(child_path("", &Segment::member("lines")), "lines");
        assert_eq!(
            child_path("lines", &Segment::index([crate::IndexArg::int(0)])),
            "lines[0]"
        );
        assert_eq!(child_path("lines[0]", &Segment::member("qty")), "lines[0].qty");
    }
}
