//! The thread-safe `Container` and its associated methods.

use crate::core::{RegistrationEntry, RegistrationKey, ResolutionGuard};
use crate::error::ContainerError;
use dashmap::DashMap;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// The concrete storage behind a [`Container`], as returned by
/// [`Container::internal_container`].
pub type Storage = DashMap<RegistrationKey, RegistrationEntry>;

/// A thread-safe, type-keyed service registry.
///
/// Each key type maps to at most one entry, either a singleton instance or a
/// transient factory. Registering under an existing key replaces the old
/// entry. All operations take `&self`; mutating ones return the container so
/// calls can be chained:
///
/// ```
/// use fibre_container::Container;
///
/// let container = Container::new();
/// container
///   .register_instance(String::from("db://primary"))
///   .register_instance(8080_u16);
///
/// assert_eq!(*container.resolve::<u16>().unwrap(), 8080);
/// ```
///
/// Storage is a sharded concurrent map, so the container can be shared as
/// `Arc<Container>` and resolved from many threads at once. Factories run
/// without any storage lock held.
#[derive(Default)]
pub struct Container {
  entries: Storage,
}

impl Container {
  /// Creates a new, empty `Container`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates an empty `Container` with room for `capacity` registrations.
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      entries: DashMap::with_capacity(capacity),
    }
  }

  // --- PRIVATE HELPERS ---

  fn insert_entry(&self, key: RegistrationKey, entry: RegistrationEntry) -> &Self {
    let lifetime = entry.lifetime();
    let replaced = self.entries.insert(key, entry).is_some();
    debug!(service = key.type_name(), lifetime, replaced, "registered service");
    self
  }

  // --- Singleton Registration ---

  /// Registers `instance` as the singleton for key `K`.
  ///
  /// `K` may be a trait object type, in which case the concrete value behind
  /// the handle is served as `Arc<dyn Trait>`. Every resolution returns a
  /// clone of this very handle.
  pub fn register<K: ?Sized + Any + Send + Sync>(&self, instance: Arc<K>) -> &Self {
    self.insert_entry(RegistrationKey::of::<K>(), RegistrationEntry::singleton(instance))
  }

  /// Registers `instance` as a singleton keyed by its own type.
  pub fn register_instance<T: Any + Send + Sync>(&self, instance: T) -> &Self {
    self.register(Arc::new(instance))
  }

  // --- Transient Registration ---

  /// Registers `T` as a transient built with `T::default()` on every resolution.
  pub fn register_transient<T: Any + Default + Send + Sync>(&self) -> &Self {
    self.register_factory(T::default)
  }

  /// Registers a transient under key `K` that constructs a fresh `T` on every
  /// resolution and hands it out through `upcast`, usually an unsizing
  /// coercion such as `|service| service as Arc<dyn Greeter>`.
  pub fn register_transient_as<K, T>(&self, upcast: fn(Arc<T>) -> Arc<K>) -> &Self
  where
    K: ?Sized + Any + Send + Sync,
    T: Default + 'static,
  {
    self.insert_entry(
      RegistrationKey::of::<K>(),
      RegistrationEntry::transient(move || upcast(Arc::new(T::default()))),
    )
  }

  /// Registers a transient keyed by `T` that calls `factory` on every resolution.
  pub fn register_factory<T: Any + Send + Sync>(
    &self,
    factory: impl Fn() -> T + Send + Sync + 'static,
  ) -> &Self {
    self.insert_entry(
      RegistrationKey::of::<T>(),
      RegistrationEntry::transient(move || Arc::new(factory())),
    )
  }

  // --- Removal ---

  /// Removes the entry for key `K`. Removing an absent key is a no-op.
  pub fn deregister<K: ?Sized + Any>(&self) -> &Self {
    let key = RegistrationKey::of::<K>();
    let removed = self.entries.remove(&key).is_some();
    debug!(service = key.type_name(), removed, "deregistered service");
    self
  }

  /// Removes the entry for the service `instance` was resolved as.
  ///
  /// The key is the `T` behind the handle, so a handle obtained from
  /// [`resolve`](Self::resolve) removes its own registration:
  ///
  /// ```
  /// use fibre_container::Container;
  ///
  /// let container = Container::new();
  /// container.register_instance(5_u32);
  ///
  /// let handle = container.resolve::<u32>().unwrap();
  /// container.deregister_instance(&handle);
  /// assert!(!container.contains::<u32>());
  /// ```
  pub fn deregister_instance<T: ?Sized + Any>(&self, _instance: &Arc<T>) -> &Self {
    self.deregister::<T>()
  }

  /// Removes every entry.
  ///
  /// Singletons are only released, never torn down: one still held by a
  /// caller stays alive until that handle is dropped.
  pub fn clear(&self) -> &Self {
    let keys: Vec<RegistrationKey> = self.entries.iter().map(|entry| *entry.key()).collect();
    // Entries are dropped after every shard lock is released, so a `Drop`
    // that calls back into the container cannot deadlock.
    let drained: Vec<_> = keys
      .iter()
      .filter_map(|key| self.entries.remove(key))
      .collect();
    debug!(removed = drained.len(), "cleared container");
    drop(drained);
    self
  }

  // --- Resolution ---

  /// Resolves the service registered under key `K`.
  ///
  /// A singleton yields the stored handle, a transient a newly built
  /// instance.
  ///
  /// # Errors
  ///
  /// [`ContainerError::NotRegistered`] when nothing is registered under `K`,
  /// [`ContainerError::CircularResolution`] when called from inside the
  /// factory of `K` itself.
  pub fn resolve<K: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<K>, ContainerError> {
    let key = RegistrationKey::of::<K>();

    let factory = {
      let entry = self
        .entries
        .get(&key)
        .ok_or(ContainerError::NotRegistered {
          type_name: key.type_name(),
        })?;

      match entry.value() {
        RegistrationEntry::Singleton { instance } => {
          trace!(service = key.type_name(), lifetime = "singleton", "resolved service");
          return instance
            .downcast_ref::<Arc<K>>()
            .cloned()
            .ok_or(ContainerError::TypeMismatch {
              type_name: key.type_name(),
            });
        }
        RegistrationEntry::Transient { factory } => Arc::clone(factory),
      }
    };

    // The shard lock is released here; the factory may call back into `self`.
    let _guard = ResolutionGuard::enter(self as *const Self as usize, key)?;
    let instance = factory()
      .downcast::<Arc<K>>()
      .map(|boxed| *boxed)
      .map_err(|_| ContainerError::TypeMismatch {
        type_name: key.type_name(),
      })?;
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

  /// Escape hatch to the raw storage, bypassing the typed API.
  ///
  /// `S` must be [`Storage`]. Entries inserted through it are not checked
  /// against their keys; a mismatch surfaces later as
  /// [`ContainerError::TypeMismatch`].
  ///
  /// # Errors
  ///
  /// [`ContainerError::RepresentationMismatch`] for any other `S`.
  pub fn internal_container<S: Any>(&self) -> Result<&S, ContainerError> {
    (&self.entries as &dyn Any)
      .downcast_ref::<S>()
      .ok_or(ContainerError::RepresentationMismatch {
        requested: type_name::<S>(),
        actual: type_name::<Storage>(),
      })
  }
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Container")
      .field("registrations", &self.entries.len())
      .finish()
  }
}
