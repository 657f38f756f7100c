// container/src/local_container.rs

//! A single-threaded, unsynchronized service registry.

use crate::core::{RegistrationKey, ResolutionGuard};
use crate::error::ContainerError;
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace};

/// The concrete storage behind a [`LocalContainer`].
pub type LocalStorage = HashMap<RegistrationKey, LocalEntry>;

/// A registration held by [`LocalContainer`]. The `Rc` counterpart of
/// [`RegistrationEntry`](crate::RegistrationEntry).
pub enum LocalEntry {
  /// A pre-built instance handed out on every resolution.
  Singleton {
    /// The `Rc<K>` handle, boxed.
    instance: Box<dyn Any>,
  },
  /// A factory invoked on every resolution.
  Transient {
    /// Builds a boxed `Rc<K>`.
    factory: Rc<dyn Fn() -> Box<dyn Any>>,
  },
}

impl LocalEntry {
  /// A singleton entry holding `instance` under its key type `K`.
  pub fn singleton<K: ?Sized + Any>(instance: Rc<K>) -> Self {
    LocalEntry::Singleton {
      instance: Box::new(instance),
    }
  }

  /// A transient entry calling `factory` on every resolution.
  pub fn transient<K: ?Sized + Any>(factory: impl Fn() -> Rc<K> + 'static) -> Self {
    LocalEntry::Transient {
      factory: Rc::new(move || -> Box<dyn Any> { Box::new(factory()) }),
    }
  }

  /// `"singleton"` or `"transient"`.
  pub fn lifetime(&self) -> &'static str {
    match self {
      LocalEntry::Singleton { .. } => "singleton",
      LocalEntry::Transient { .. } => "transient",
    }
  }
}

impl fmt::Debug for LocalEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LocalEntry")
      .field("lifetime", &self.lifetime())
      .finish_non_exhaustive()
  }
}

/// A single-threaded, unsynchronized service registry.
///
/// Same contract as [`Container`](crate::Container), but backed by a plain
/// `HashMap` and `Rc` handles, so it can hold services that are neither
/// `Send` nor `Sync`. Callers own the synchronization story.
///
/// # Note on API
///
/// Mutating methods take `&mut self` and return `&mut Self` for chaining.
/// Factories that need to resolve from the container they live in should
/// share it as `Rc<RefCell<LocalContainer>>`.
#[derive(Default)]
pub struct LocalContainer {
  entries: LocalStorage,
}

impl LocalContainer {
  /// Creates a new, empty `LocalContainer`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates an empty `LocalContainer` with room for `capacity` registrations.
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      entries: HashMap::with_capacity(capacity),
    }
  }

  // --- PRIVATE HELPERS ---

  fn insert_entry(&mut self, key: RegistrationKey, entry: LocalEntry) -> &mut Self {
    let lifetime = entry.lifetime();
    let replaced = self.entries.insert(key, entry).is_some();
    debug!(service = key.type_name(), lifetime, replaced, "registered service");
    self
  }

  // --- Registration ---

  /// Registers `instance` as the singleton for key `K`, which may be a trait
  /// object type.
  pub fn register<K: ?Sized + Any>(&mut self, instance: Rc<K>) -> &mut Self {
    self.insert_entry(RegistrationKey::of::<K>(), LocalEntry::singleton(instance))
  }

  /// Registers `instance` as a singleton keyed by its own type.
  pub fn register_instance<T: Any>(&mut self, instance: T) -> &mut Self {
    self.register(Rc::new(instance))
  }

  /// Registers `T` as a transient built with `T::default()` on every resolution.
  pub fn register_transient<T: Any + Default>(&mut self) -> &mut Self {
    self.register_factory(T::default)
  }

  /// Registers a transient under key `K` that builds a fresh `T` and hands it
  /// out through `upcast`, e.g. `|service| service as Rc<dyn Greeter>`.
  pub fn register_transient_as<K, T>(&mut self, upcast: fn(Rc<T>) -> Rc<K>) -> &mut Self
  where
    K: ?Sized + Any,
    T: Default + 'static,
  {
    self.insert_entry(
      RegistrationKey::of::<K>(),
      LocalEntry::transient(move || upcast(Rc::new(T::default()))),
    )
  }

  /// Registers a transient keyed by `T` that calls `factory` on every resolution.
  pub fn register_factory<T: Any>(&mut self, factory: impl Fn() -> T + 'static) -> &mut Self {
    self.insert_entry(
      RegistrationKey::of::<T>(),
      LocalEntry::transient(move || Rc::new(factory())),
    )
  }

  // --- Removal ---

  /// Removes the entry for key `K`. Removing an absent key is a no-op.
  pub fn deregister<K: ?Sized + Any>(&mut self) -> &mut Self {
    let key = RegistrationKey::of::<K>();
    let removed = self.entries.remove(&key).is_some();
    debug!(service = key.type_name(), removed, "deregistered service");
    self
  }

  /// Removes the entry for the service `instance` was resolved as, i.e. the
  /// `T` behind the handle.
  pub fn deregister_instance<T: ?Sized + Any>(&mut self, _instance: &Rc<T>) -> &mut Self {
    self.deregister::<T>()
  }

  /// Removes every entry. Singletons still held by callers stay alive.
  pub fn clear(&mut self) -> &mut Self {
    let removed = self.entries.drain().count();
    debug!(removed, "cleared container");
    self
  }

  // --- Resolution ---

  /// Resolves the service registered under key `K`.
  ///
  /// Fails with [`ContainerError::NotRegistered`] when the key is absent and
  /// [`ContainerError::CircularResolution`] when a factory re-enters its own key.
  pub fn resolve<K: ?Sized + Any>(&self) -> Result<Rc<K>, ContainerError> {
    let key = RegistrationKey::of::<K>();
    let mismatch = || ContainerError::TypeMismatch {
      type_name: key.type_name(),
    };

    let factory = match self.entries.get(&key) {
      None => {
        return Err(ContainerError::NotRegistered {
          type_name: key.type_name(),
        })
      }
      Some(LocalEntry::Singleton { instance }) => {
        trace!(service = key.type_name(), lifetime = "singleton", "resolved service");
        return instance.downcast_ref::<Rc<K>>().cloned().ok_or_else(mismatch);
      }
      Some(LocalEntry::Transient { factory }) => Rc::clone(factory),
    };

    let _guard = ResolutionGuard::enter(self as *const Self as usize, key)?;
    let instance = factory()
      .downcast::<Rc<K>>()
      .map(|boxed| *boxed)
      .map_err(|_| mismatch())?;
    trace!(service = key.type_name(), lifetime = "transient", "resolved service");
    Ok(instance)
  }

  // --- Introspection ---

  /// Returns `true` if an entry is registered under key `K`.
  pub fn contains<K: ?Sized + Any>(&self) -> bool {
    self.entries.contains_key(&RegistrationKey::of::<K>())
  }

  /// Number of registered keys.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Returns `true` when nothing is registered.
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Escape hatch to the raw storage. `S` must be [`LocalStorage`].
  pub fn internal_container<S: Any>(&self) -> Result<&S, ContainerError> {
    (&self.entries as &dyn Any)
      .downcast_ref::<S>()
      .ok_or_else(representation_mismatch::<S>)
  }

  /// Mutable escape hatch to the raw storage. `S` must be [`LocalStorage`].
  pub fn internal_container_mut<S: Any>(&mut self) -> Result<&mut S, ContainerError> {
    (&mut self.entries as &mut dyn Any)
      .downcast_mut::<S>()
      .ok_or_else(representation_mismatch::<S>)
  }
}

fn representation_mismatch<S>() -> ContainerError {
  ContainerError::RepresentationMismatch {
    requested: type_name::<S>(),
    actual: type_name::<LocalStorage>(),
  }
}

impl fmt::Debug for LocalContainer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LocalContainer")
      .field("registrations", &self.entries.len())
      .finish()
  }
}
