use alloc::boxed::Box;
use alloc::string::{String, ToString};
use core::cell::Cell;
use core::ptr;

use indexmap::IndexMap;
use indexmap::map::Entry;

use super::{BuildCx, Defaults, NodeRef, Source, ValueNode, Walk, child_path};
use crate::error::BuildError;
use crate::path::{PathError, Segment};
use crate::shape::Shape;
use crate::tracing_macros::{debug, trace};
use crate::value::Value;

/// How a branch produces its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BranchKind {
    /// Read or instantiate the member, mutate it in place, write it back.
    Composite,
    /// No zero-argument constructor: run a nested assembly over this
    /// branch's children and write the built value.
    Builder,
}

/// An intermediate segment, or the root.
pub(crate) struct BranchNode {
    /// `None` for the root.
    segment: Option<Segment>,
    path: String,
    shape: Shape,
    kind: BranchKind,
    branches: IndexMap<String, BranchNode>,
    values: IndexMap<String, ValueNode>,
    /// Node of the assembly whose factory read this branch in the running build.
    consumed_by: Cell<Option<*const BranchNode>>,
}

impl BranchNode {
    /// The root of a builder for `shape`. Always composite: the builder
    /// itself decides how the root instance comes to be.
    pub(crate) fn root(shape: Shape) -> Self {
        Self {
            segment: None,
            path: String::new(),
            shape,
            kind: BranchKind::Composite,
            branches: IndexMap::new(),
            values: IndexMap::new(),
            consumed_by: Cell::new(None),
        }
    }

    fn child(segment: Segment, path: String, shape: Shape) -> Self {
        let kind = if shape.is_constructible() {
            BranchKind::Composite
        } else {
            BranchKind::Builder
        };
        Self {
            segment: Some(segment),
            path,
            shape,
            kind,
            branches: IndexMap::new(),
            values: IndexMap::new(),
            consumed_by: Cell::new(None),
        }
    }

    pub(crate) fn shape(&self) -> &Shape {
        &self.shape
    }

    #[cfg(test)]
    pub(crate) fn kind(&self) -> BranchKind {
        self.kind
    }

    pub(crate) fn mark_consumed(&self, by: &BranchNode) {
        self.consumed_by.set(Some(ptr::from_ref(by)));
    }

    /// Forget what the factories of a previous build read, in the whole subtree.
    pub(crate) fn reset_consumed(&self) {
        self.consumed_by.set(None);
        for branch in self.branches.values() {
            branch.reset_consumed();
        }
        for leaf in self.values.values() {
            leaf.reset_consumed();
        }
    }

    /// Number of immediate children, branches and values together.
    pub(crate) fn len(&self) -> usize {
        self.branches.len() + self.values.len()
    }

    /// Fetch the child branch for `segment`, creating it on first use.
    pub(crate) fn add_or_get_branch(
        &mut self,
        segment: &Segment,
    ) -> Result<&mut BranchNode, PathError> {
        let shape = self.shape.member_or_err(segment)?;
        let path = &self.path;
        match self.branches.entry(segment.key().to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let child = BranchNode::child(segment.clone(), child_path(path, segment), shape);
                trace!(path = %child.path, kind = ?child.kind, "new branch");
                Ok(entry.insert(child))
            }
        }
    }

    /// Register a leaf under `segment`. The first registration of a key wins;
    /// later ones leave the existing leaf in place.
    pub(crate) fn add_or_get_value(
        &mut self,
        segment: &Segment,
        source: Box<dyn Source>,
        defaults: Option<Defaults>,
    ) -> Result<&ValueNode, PathError> {
        let shape = self.shape.member_or_err(segment)?;
        if shape.key() != source.type_key() {
            return Err(PathError::LeafTypeMismatch {
                segment: segment.key().to_string(),
                expected: shape.type_name(),
                actual: source.type_key().name(),
            });
        }
        let path = &self.path;
        match self.values.entry(segment.key().to_string()) {
            Entry::Occupied(entry) => {
                debug!(
                    path = %child_path(path, segment),
                    "value already registered; keeping the first registration"
                );
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                let leaf = ValueNode::new(segment.clone(), child_path(path, segment), source, defaults);
                trace!(path = %child_path(path, segment), "new value");
                Ok(entry.insert(leaf))
            }
        }
    }

    /// Immediate child by segment key, branches first.
    pub(crate) fn find(&self, key: &str) -> Option<NodeRef<'_>> {
        if let Some(branch) = self.branches.get(key) {
            return Some(NodeRef::Branch(branch));
        }
        self.values.get(key).map(NodeRef::Value)
    }

    /// Apply every child to `target`, which must be of `shape`.
    /// Branches go first, then values, each in registration order.
    pub(crate) fn apply_children(
        &self,
        target: &mut Value,
        shape: &Shape,
        walk: Walk<'_>,
        cx: BuildCx<'_>,
    ) -> Result<(), BuildError> {
        for branch in self.branches.values() {
            branch.apply_to(target, shape, walk, cx)?;
        }
        for leaf in self.values.values() {
            leaf.apply_to(target, shape, walk, cx)?;
        }
        Ok(())
    }

    /// Produce this branch's value and write it into `parent`.
    pub(crate) fn apply_to(
        &self,
        parent: &mut Value,
        parent_shape: &Shape,
        walk: Walk<'_>,
        cx: BuildCx<'_>,
    ) -> Result<(), BuildError> {
        let Some(segment) = &self.segment else {
            return self.apply_children(parent, &self.shape, walk, cx);
        };
        if walk.skips(self.consumed_by.get()) {
            trace!(path = %self.path, "skipping branch consumed by constructor");
            return Ok(());
        }

        let value = match self.kind {
            BranchKind::Composite => {
                let existing = (parent_shape.read)(parent, segment)
                    .map_err(|source| BuildError::access(&self.path, source))?;
                let mut current = match existing {
                    Some(current) => current,
                    None => self.instantiate()?,
                };
                self.apply_children(&mut current, &self.shape, walk, cx)?;
                current
            }
            BranchKind::Builder => {
                debug!(path = %self.path, type_name = self.shape.type_name(), "nested build");
                (self.shape.build)(self, cx)?
            }
        };

        trace!(path = %self.path, "writing branch");
        (parent_shape.write)(parent, segment, value)
            .map_err(|source| BuildError::access(&self.path, source))
    }

    /// Produce this branch's whole value for a running factory, without
    /// writing it anywhere.
    pub(crate) fn apply_to_constructor(&self, cx: BuildCx<'_>) -> Result<Value, BuildError> {
        match self.kind {
            BranchKind::Composite => {
                let mut value = self.instantiate()?;
                self.apply_children(&mut value, &self.shape, Walk::Full, cx)?;
                Ok(value)
            }
            BranchKind::Builder => (self.shape.build)(self, cx),
        }
    }

    fn instantiate(&self) -> Result<Value, BuildError> {
        (self.shape.instantiate)().ok_or_else(|| BuildError::Configuration {
            type_name: self.shape.type_name(),
            reason: "it has no zero-argument constructor".to_string(),
        })
    }
}
