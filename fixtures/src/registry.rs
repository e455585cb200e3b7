//! The registration store: per-type constructors, post-build actions and
//! type defaults.
//!
//! There is no global store. A [`Registry`] is filled during setup and then
//! borrowed by every [`Builder`](crate::Builder), so the borrow checker keeps
//! registrations from changing while anything is being built.

use alloc::boxed::Box;
use core::any::Any;
use core::fmt;

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::builder::Assembly;
use crate::error::{BuildError, RegistrationError};
use crate::shape::Fixture;
use crate::tracing_macros::debug;
use crate::value::TypeKey;

/// A factory producing a `T` from an [`Assembly`] of the builder's paths.
pub type Factory<T> = Box<dyn Fn(&Assembly<'_, T>) -> Result<T, BuildError>>;

/// An action run on every freshly assembled `T`.
pub type PostBuild<T> = Box<dyn Fn(&mut T)>;

/// A generator replacing zero values of `V`.
pub type TypeDefault<V> = Box<dyn Fn() -> V>;

/// Which of the three registrations of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistrationKind {
    /// See [`Registry::add_constructor`].
    Constructor,
    /// See [`Registry::add_post_build`].
    PostBuild,
    /// See [`Registry::add_type_default`].
    TypeDefault,
}

impl fmt::Display for RegistrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RegistrationKind::Constructor => "constructor",
            RegistrationKind::PostBuild => "post-build action",
            RegistrationKind::TypeDefault => "type default",
        })
    }
}

/// Entries keyed by type and kind, each holding a `Factory<T>`,
/// `PostBuild<T>` or `TypeDefault<V>` behind `dyn Any`.
#[derive(Default)]
struct Slots {
    entries: IndexMap<(TypeKey, RegistrationKind), Box<dyn Any>>,
}

impl Slots {
    fn insert(
        &mut self,
        key: TypeKey,
        kind: RegistrationKind,
        entry: Box<dyn Any>,
    ) -> Result<(), RegistrationError> {
        match self.entries.entry((key, kind)) {
            Entry::Occupied(_) => Err(RegistrationError::Duplicate {
                type_name: key.name(),
                kind,
            }),
            Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(())
            }
        }
    }

    fn get<E: 'static>(&self, key: TypeKey, kind: RegistrationKind) -> Option<&E> {
        self.entries.get(&(key, kind))?.downcast_ref::<E>()
    }

    fn contains(&self, key: TypeKey, kind: RegistrationKind) -> bool {
        self.entries.contains_key(&(key, kind))
    }
}

impl fmt::Debug for Slots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.entries
                    .keys()
                    .map(|(key, kind)| alloc::format!("{kind} for {key}")),
            )
            .finish()
    }
}

/// The process's registrations.
///
/// Each type holds at most one constructor, one post-build action and one
/// type default; a second registration of the same kind is an error and
/// leaves the first in place.
#[derive(Default)]
pub struct Registry {
    slots: Slots,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the factory used to construct `T`.
    ///
    /// Needed for types without a zero-argument constructor; for other types
    /// it replaces default construction.
    pub fn add_constructor<T: Fixture>(
        &mut self,
        factory: impl Fn(&Assembly<'_, T>) -> Result<T, BuildError> + 'static,
    ) -> Result<&mut Self, RegistrationError> {
        let factory: Factory<T> = Box::new(factory);
        self.insert(TypeKey::of::<T>(), RegistrationKind::Constructor, Box::new(factory))
    }

    /// Register an action run on every assembled `T`.
    pub fn add_post_build<T: Fixture>(
        &mut self,
        action: impl Fn(&mut T) + 'static,
    ) -> Result<&mut Self, RegistrationError> {
        let action: PostBuild<T> = Box::new(action);
        self.insert(TypeKey::of::<T>(), RegistrationKind::PostBuild, Box::new(action))
    }

    /// Register the value substituted for zero values of `V`.
    pub fn add_type_default<V: 'static>(
        &mut self,
        generator: impl Fn() -> V + 'static,
    ) -> Result<&mut Self, RegistrationError> {
        let generator: TypeDefault<V> = Box::new(generator);
        self.insert(TypeKey::of::<V>(), RegistrationKind::TypeDefault, Box::new(generator))
    }

    fn insert(
        &mut self,
        key: TypeKey,
        kind: RegistrationKind,
        entry: Box<dyn Any>,
    ) -> Result<&mut Self, RegistrationError> {
        self.slots.insert(key, kind, entry)?;
        debug!(type_name = key.name(), %kind, "registered");
        Ok(self)
    }

    /// The registered factory for `T`.
    pub fn constructor<T: Fixture>(&self) -> Option<&Factory<T>> {
        self.slots.get(TypeKey::of::<T>(), RegistrationKind::Constructor)
    }

    /// The registered post-build action for `T`.
    pub fn post_build<T: 'static>(&self) -> Option<&PostBuild<T>> {
        self.slots.get(TypeKey::of::<T>(), RegistrationKind::PostBuild)
    }

    /// The registered type default for `V`.
    pub fn type_default<V: 'static>(&self) -> Option<&TypeDefault<V>> {
        self.slots.get(TypeKey::of::<V>(), RegistrationKind::TypeDefault)
    }

    /// Whether a registration of `kind` exists for `key`.
    pub fn contains(&self, key: TypeKey, kind: RegistrationKind) -> bool {
        self.slots.contains(key, kind)
    }

    /// Number of registrations of all kinds.
    pub fn len(&self) -> usize {
        self.slots.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.slots.entries.is_empty()
    }

    /// Drop every registration.
    pub fn clear(&mut self) {
        debug!(count = self.len(), "clearing registry");
        self.slots.entries.clear();
    }

    /// Merge a batch into the store.
    ///
    /// All or nothing: if any entry of the batch conflicts with the store,
    /// nothing is installed.
    pub fn install(&mut self, batch: Registrations) -> Result<&mut Self, RegistrationError> {
        if let Some(&(key, kind)) = batch
            .slots
            .entries
            .keys()
            .find(|(key, kind)| self.slots.contains(*key, *kind))
        {
            return Err(RegistrationError::Duplicate {
                type_name: key.name(),
                kind,
            });
        }
        debug!(count = batch.len(), "installing registrations");
        self.slots.entries.extend(batch.slots.entries);
        Ok(self)
    }

    /// Install the registrations of a default-constructed `C`.
    pub fn add_config<C: Register + Default>(&mut self) -> Result<&mut Self, RegistrationError> {
        self.add_config_value(&C::default())
    }

    /// Install the registrations of `config`.
    pub fn add_config_value(&mut self, config: &dyn Register) -> Result<&mut Self, RegistrationError> {
        let mut batch = Registrations::new();
        config.register(&mut batch)?;
        self.install(batch)
    }

    /// Install the registrations of every config, in order. Stops at the
    /// first conflict; earlier configs stay installed.
    pub fn add_configs<'c>(
        &mut self,
        configs: impl IntoIterator<Item = &'c dyn Register>,
    ) -> Result<&mut Self, RegistrationError> {
        for config in configs {
            self.add_config_value(config)?;
        }
        Ok(self)
    }

    /// Install every registration submitted with
    /// [`submit_registrations!`](crate::submit_registrations) anywhere in the
    /// final binary, in name order.
    #[cfg(feature = "discovery")]
    pub fn add_discovered(&mut self) -> Result<&mut Self, RegistrationError> {
        let mut discovered: alloc::vec::Vec<&Discovered> =
            inventory::iter::<Discovered>.into_iter().collect();
        discovered.sort_by_key(|d| d.name);
        for entry in discovered {
            debug!(name = entry.name, "installing discovered registrations");
            let mut batch = Registrations::new();
            (entry.register)(&mut batch)?;
            self.install(batch)?;
        }
        Ok(self)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.slots, f)
    }
}

/// A batch of registrations, checked for duplicates within itself and
/// installed into a [`Registry`] as a unit.
#[derive(Default)]
pub struct Registrations {
    slots: Slots,
}

impl Registrations {
    /// An empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`Registry::add_constructor`].
    pub fn constructor<T: Fixture>(
        &mut self,
        factory: impl Fn(&Assembly<'_, T>) -> Result<T, BuildError> + 'static,
    ) -> Result<&mut Self, RegistrationError> {
        let factory: Factory<T> = Box::new(factory);
        self.slots
            .insert(TypeKey::of::<T>(), RegistrationKind::Constructor, Box::new(factory))?;
        Ok(self)
    }

    /// See [`Registry::add_post_build`].
    pub fn post_build<T: Fixture>(
        &mut self,
        action: impl Fn(&mut T) + 'static,
    ) -> Result<&mut Self, RegistrationError> {
        let action: PostBuild<T> = Box::new(action);
        self.slots
            .insert(TypeKey::of::<T>(), RegistrationKind::PostBuild, Box::new(action))?;
        Ok(self)
    }

    /// See [`Registry::add_type_default`].
    pub fn type_default<V: 'static>(
        &mut self,
        generator: impl Fn() -> V + 'static,
    ) -> Result<&mut Self, RegistrationError> {
        let generator: TypeDefault<V> = Box::new(generator);
        self.slots
            .insert(TypeKey::of::<V>(), RegistrationKind::TypeDefault, Box::new(generator))?;
        Ok(self)
    }

    /// Number of registrations in the batch.
    pub fn len(&self) -> usize {
        self.slots.entries.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.entries.is_empty()
    }
}

impl fmt::Debug for Registrations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Registrations").field(&self.slots).finish()
    }
}

/// A declarative group of registrations, typically one per domain area.
///
/// ```
/// use fixtures::{Registrations, Register, RegistrationError, Registry, fixture};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Money {
///     cents: i64,
/// }
///
/// fixture! { Money { cents: i64 } }
///
/// #[derive(Default)]
/// struct MoneyConfig;
///
/// impl Register for MoneyConfig {
///     fn register(&self, batch: &mut Registrations) -> Result<(), RegistrationError> {
///         batch.constructor::<Money>(|a| Ok(Money { cents: a.from("cents", 100)? }))?;
///         Ok(())
///     }
/// }
///
/// let mut registry = Registry::new();
/// registry.add_config::<MoneyConfig>().unwrap();
/// assert!(registry.constructor::<Money>().is_some());
/// ```
pub trait Register {
    /// Add this group's registrations to `batch`.
    fn register(&self, batch: &mut Registrations) -> Result<(), RegistrationError>;
}

/// A registration function collected at link time.
///
/// Submit one with [`submit_registrations!`](crate::submit_registrations).
#[cfg(feature = "discovery")]
pub struct Discovered {
    /// Name used to order installation and in logs.
    pub name: &'static str,
    /// Fills a batch.
    pub register: fn(&mut Registrations) -> Result<(), RegistrationError>,
}

#[cfg(feature = "discovery")]
inventory::collect!(Discovered);

/// Submit a registration function for [`Registry::add_discovered`].
///
/// ```ignore
/// fixtures::submit_registrations!("money", |batch| {
///     batch.type_default(|| Money { cents: 1 })?;
///     Ok(())
/// });
/// ```
#[cfg(feature = "discovery")]
#[macro_export]
macro_rules! submit_registrations {
    ($name:expr, $register:expr $(,)?) => {
        $crate::__private::inventory::submit! {
            $crate::Discovered {
                name: $name,
                register: $register,
            }
        }
    };
}
