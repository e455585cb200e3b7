//! [`Builder`], the unit of work, and [`Assembly`], the view factories see.

use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::any::{Any, type_name};
use core::cell::Cell;
use core::fmt;
use core::marker::PhantomData;

use crate::error::BuildError;
use crate::path::{IntoPath, PathError};
use crate::registry::{Factory, PostBuild, Registry};
use crate::shape::Fixture;
use crate::tracing_macros::{debug, trace};
use crate::tree::{
    BranchNode, BuildCx, Defaults, Derived, Generator, Literal, NodeRef, Source, Walk,
};
use crate::value::Value;

/// Accumulates path registrations for a `T` and assembles instances from them.
///
/// ```
/// use fixtures::{Builder, Registry, fixture};
///
/// #[derive(Debug, Clone, Default, PartialEq)]
/// struct Address {
///     city: String,
/// }
///
/// #[derive(Debug, Clone, Default, PartialEq)]
/// struct Customer {
///     name: String,
///     address: Address,
/// }
///
/// fixture! { Address: Default { city: String } }
/// fixture! { Customer: Default { name: String, address: Address } }
///
/// # fn main() -> Result<(), fixtures::Error> {
/// let registry = Registry::new();
/// let mut builder = Builder::<Customer>::new(&registry);
/// builder
///     .with("name", String::from("Ada"))?
///     .with("o => o.address.city", String::from("London"))?;
///
/// let customer = builder.build()?;
/// assert_eq!(customer.address.city, "London");
/// # Ok(())
/// # }
/// ```
///
/// A builder stays configurable after it has built; every build re-resolves
/// generators and clones literals afresh.
pub struct Builder<'r, T: Fixture> {
    registry: &'r Registry,
    root: BranchNode,
    constructor: Option<Factory<T>>,
    post_build: Option<PostBuild<T>>,
}

impl<'r, T: Fixture> Builder<'r, T> {
    /// An empty builder reading constructors, post-build actions and type
    /// defaults from `registry`.
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            root: BranchNode::root(T::shape()),
            constructor: None,
            post_build: None,
        }
    }

    /// Construct `T` with `factory` instead of the registered constructor.
    pub fn with_constructor(
        mut self,
        factory: impl Fn(&Assembly<'_, T>) -> Result<T, BuildError> + 'static,
    ) -> Self {
        self.constructor = Some(Box::new(factory));
        self
    }

    /// Run `action` after assembly instead of the registered post-build action.
    pub fn with_post_build(mut self, action: impl Fn(&mut T) + 'static) -> Self {
        self.post_build = Some(Box::new(action));
        self
    }

    /// The registry this builder reads from.
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Set the member at `path` to `value`.
    ///
    /// If `value` equals `V::default()` and a type default is registered for
    /// `V`, the type default is used instead. See [`with_exact`](Self::with_exact).
    pub fn with<V>(&mut self, path: impl IntoPath, value: V) -> Result<&mut Self, PathError>
    where
        V: Clone + Default + PartialEq + 'static,
    {
        self.register(path, Box::new(Literal(value)), Some(Defaults::of::<V>()))
    }

    /// Set the member at `path` to `value`, never substituting type defaults.
    pub fn with_exact<V>(&mut self, path: impl IntoPath, value: V) -> Result<&mut Self, PathError>
    where
        V: Clone + 'static,
    {
        self.register(path, Box::new(Literal(value)), None)
    }

    /// Set the `Vec<E>` member at `path` to exactly `values`, in order.
    pub fn with_many<E>(
        &mut self,
        path: impl IntoPath,
        values: impl IntoIterator<Item = E>,
    ) -> Result<&mut Self, PathError>
    where
        E: Clone + 'static,
    {
        let values: Vec<E> = values.into_iter().collect();
        self.register(path, Box::new(Literal(values)), None)
    }

    /// Set the member at `path` to a fresh result of `f` on every build.
    ///
    /// Type defaults are never substituted for generated values.
    pub fn with_fn<V>(
        &mut self,
        path: impl IntoPath,
        f: impl FnMut() -> V + 'static,
    ) -> Result<&mut Self, PathError>
    where
        V: 'static,
    {
        self.register(path, Box::new(Generator::new(f)), None)
    }

    /// Set the member at `path` to a value computed from other paths of this
    /// builder, on every build.
    ///
    /// A zero result is replaced by the registered type default, like [`with`](Self::with).
    pub fn with_derived<V>(
        &mut self,
        path: impl IntoPath,
        f: impl Fn(&Assembly<'_, T>) -> Result<V, BuildError> + 'static,
    ) -> Result<&mut Self, PathError>
    where
        V: Default + PartialEq + 'static,
    {
        self.register(path, Box::new(Derived::new(f)), Some(Defaults::of::<V>()))
    }

    /// Like [`with_derived`](Self::with_derived), without type default substitution.
    pub fn with_derived_exact<V>(
        &mut self,
        path: impl IntoPath,
        f: impl Fn(&Assembly<'_, T>) -> Result<V, BuildError> + 'static,
    ) -> Result<&mut Self, PathError>
    where
        V: 'static,
    {
        self.register(path, Box::new(Derived::new(f)), None)
    }

    fn register(
        &mut self,
        path: impl IntoPath,
        source: Box<dyn Source>,
        defaults: Option<Defaults>,
    ) -> Result<&mut Self, PathError> {
        let path = path.into_path()?;
        let Some((leaf, parents)) = path.segments().split_last() else {
            return Err(PathError::Empty {
                expression: path.to_string(),
            });
        };
        let mut node = &mut self.root;
        for segment in parents {
            node = node.add_or_get_branch(segment)?;
        }
        node.add_or_get_value(leaf, source, defaults)?;
        Ok(self)
    }

    /// Read a registered path outside of construction; see [`Assembly::from`].
    pub fn from<V: Any>(&self, path: impl IntoPath, default: V) -> Result<V, BuildError> {
        Assembly::<T>::new(&self.root, self.cx()).from(path, default)
    }

    /// Assemble a new `T`.
    pub fn build(&self) -> Result<T, BuildError> {
        debug!(type_name = type_name::<T>(), "build");
        self.root.reset_consumed();
        Assembly::<T>::new(&self.root, self.cx()).assemble(
            None,
            self.constructor.as_ref(),
            self.post_build.as_ref(),
        )
    }

    /// Apply the registered paths to `baseline` instead of constructing a new `T`.
    pub fn build_onto(&self, baseline: T) -> Result<T, BuildError> {
        debug!(type_name = type_name::<T>(), "build onto baseline");
        self.root.reset_consumed();
        Assembly::<T>::new(&self.root, self.cx()).assemble(
            Some(baseline),
            self.constructor.as_ref(),
            self.post_build.as_ref(),
        )
    }

    fn cx(&self) -> BuildCx<'_> {
        BuildCx {
            registry: self.registry,
            origin: &self.root,
        }
    }
}

impl<T: Fixture> fmt::Debug for Builder<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("type", &type_name::<T>())
            .field("paths", &self.root.len())
            .field("custom_constructor", &self.constructor.is_some())
            .field("custom_post_build", &self.post_build.is_some())
            .finish()
    }
}

/// Read access to a builder's registered paths while a `T` is being assembled.
///
/// Factories receive one to pull constructor arguments out of the builder;
/// derived values receive one to compute from sibling paths.
pub struct Assembly<'a, T> {
    node: &'a BranchNode,
    cx: BuildCx<'a>,
    constructing: Cell<bool>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Fixture> Assembly<'a, T> {
    pub(crate) fn new(node: &'a BranchNode, cx: BuildCx<'a>) -> Self {
        Self {
            node,
            cx,
            constructing: Cell::new(false),
            _marker: PhantomData,
        }
    }

    /// The value registered at `path`, or `default` if nothing is.
    ///
    /// A registered branch is assembled from its children; a registered leaf
    /// is resolved. While a factory is running, every node on the way is
    /// marked as used so the assembly does not write it a second time. Marks
    /// last for one build.
    /// A missing path creates nothing and marks nothing.
    pub fn from<V: Any>(&self, path: impl IntoPath, default: V) -> Result<V, BuildError> {
        let path = path.into_path()?.non_empty()?;

        let mut touched = Vec::with_capacity(path.len());
        let mut current = NodeRef::Branch(self.node);
        for segment in path.segments() {
            let next = match current {
                NodeRef::Branch(branch) => branch.find(segment.key()),
                NodeRef::Value(_) => None,
            };
            let Some(next) = next else {
                trace!(%path, "nothing registered; using the default");
                return Ok(default);
            };
            touched.push(next);
            current = next;
        }

        let value = match current {
            NodeRef::Branch(branch) => branch.apply_to_constructor(self.cx)?,
            NodeRef::Value(leaf) => leaf.resolve(self.cx)?,
        };
        if self.constructing.get() {
            for node in touched {
                node.mark_consumed(self.node);
            }
        }

        value.downcast::<V>().map_err(|value| BuildError::TypeMismatch {
            path: path.to_string(),
            expected: type_name::<V>(),
            actual: value.type_name(),
        })
    }

    /// [`from`](Self::from) with `V::default()` as the fallback.
    pub fn from_or_default<V: Any + Default>(&self, path: impl IntoPath) -> Result<V, BuildError> {
        self.from(path, V::default())
    }

    /// [`from`](Self::from) with a fallback built by `builder`.
    ///
    /// The fallback is built even when the path is registered.
    pub fn from_builder<V: Fixture>(
        &self,
        path: impl IntoPath,
        builder: &Builder<'_, V>,
    ) -> Result<V, BuildError> {
        let default = builder.build()?;
        self.from(path, default)
    }

    /// The registry of the running build.
    pub fn registry(&self) -> &'a Registry {
        self.cx.registry
    }

    /// Whether a factory is currently running on this assembly.
    pub fn is_constructing(&self) -> bool {
        self.constructing.get()
    }

    /// Create the instance, apply the children of this assembly's node, run
    /// the post-build action.
    pub(crate) fn assemble(
        &self,
        baseline: Option<T>,
        constructor: Option<&Factory<T>>,
        post_build: Option<&PostBuild<T>>,
    ) -> Result<T, BuildError> {
        let instance = match baseline {
            Some(baseline) => baseline,
            None => self.create(constructor)?,
        };

        let mut target = Value::new(instance);
        self.node
            .apply_children(&mut target, &T::shape(), Walk::After(self.node), self.cx)?;
        let mut instance = target
            .downcast::<T>()
            .map_err(|value| BuildError::TypeMismatch {
                path: "<root>".into(),
                expected: type_name::<T>(),
                actual: value.type_name(),
            })?;

        if let Some(action) = post_build.or_else(|| self.cx.registry.post_build::<T>()) {
            debug!(type_name = type_name::<T>(), "post-build action");
            action(&mut instance);
        }
        Ok(instance)
    }

    fn create(&self, constructor: Option<&Factory<T>>) -> Result<T, BuildError> {
        if let Some(factory) = constructor.or_else(|| self.cx.registry.constructor::<T>()) {
            debug!(type_name = type_name::<T>(), "running factory");
            self.constructing.set(true);
            let built = factory(self);
            self.constructing.set(false);
            return built;
        }
        match T::default_constructor() {
            Some(ctor) => Ok(ctor()),
            None => Err(BuildError::Configuration {
                type_name: type_name::<T>(),
                reason: "it has no zero-argument constructor and no factory is registered for it"
                    .into(),
            }),
        }
    }
}

impl<T> fmt::Debug for Assembly<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assembly")
            .field("type", &type_name::<T>())
            .field("constructing", &self.constructing.get())
            .finish()
    }
}
