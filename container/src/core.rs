//! Registration keys, entries and the re-entrancy guard shared by the containers.

use crate::error::ContainerError;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

thread_local! {
  // (container address, key) pairs whose factories are running on this thread.
  static RESOLVING: RefCell<HashSet<(usize, RegistrationKey)>> = RefCell::new(HashSet::new());
}

/// An RAII guard around a factory invocation.
///
/// Entering records the owning container and the key on the thread-local
/// resolution set; a second entry for the same pair means the factory is
/// (transitively) resolving its own service from its own container. The same
/// key resolved from another container is not circular. Dropping the guard
/// removes the pair again.
pub(crate) struct ResolutionGuard {
  slot: (usize, RegistrationKey),
}

impl ResolutionGuard {
  /// `owner` is the address of the container performing the resolution.
  pub(crate) fn enter(owner: usize, key: RegistrationKey) -> Result<Self, ContainerError> {
    let slot = (owner, key);
    let inserted = RESOLVING.with(|resolving| resolving.borrow_mut().insert(slot));
    if !inserted {
      return Err(ContainerError::CircularResolution {
        type_name: key.type_name(),
      });
    }
    Ok(Self { slot })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING.with(|resolving| {
      resolving.borrow_mut().remove(&self.slot);
    });
  }
}

/// The type identity an entry is stored under.
///
/// The key is carried explicitly rather than read off the stored value, so a
/// trait object type (`dyn Greeter`) can key a concrete implementation.
/// Equality and hashing only look at the [`TypeId`].
#[derive(Clone, Copy)]
pub struct RegistrationKey {
  type_id: TypeId,
  type_name: &'static str,
}

impl RegistrationKey {
  /// The key for `T`.
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      type_name: std::any::type_name::<T>(),
    }
  }

  /// The [`TypeId`] the key compares by.
  pub fn type_id(&self) -> TypeId {
    self.type_id
  }

  /// Human readable name of the key type, for diagnostics only.
  pub fn type_name(&self) -> &'static str {
    self.type_name
  }
}

impl PartialEq for RegistrationKey {
  fn eq(&self, other: &Self) -> bool {
    self.type_id == other.type_id
  }
}

impl Eq for RegistrationKey {}

impl Hash for RegistrationKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.type_id.hash(state);
  }
}

impl fmt::Debug for RegistrationKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Key({})", self.type_name)
  }
}

/// A transient factory, shared so it can be called without holding a storage lock.
pub type SharedFactory = Arc<dyn Fn() -> Box<dyn Any + Send + Sync> + Send + Sync>;

/// A registration held by [`Container`](crate::Container).
///
/// Both variants store an `Arc<K>` (boxed as `Any`) for the key type `K`.
pub enum RegistrationEntry {
  /// A pre-built instance handed out on every resolution.
  Singleton {
    /// The `Arc<K>` handle, boxed.
    instance: Box<dyn Any + Send + Sync>,
  },
  /// A factory invoked on every resolution.
  Transient {
    /// Builds a boxed `Arc<K>`.
    factory: SharedFactory,
  },
}

impl RegistrationEntry {
  /// A singleton entry holding `instance` under its key type `K`.
  pub fn singleton<K: ?Sized + Any + Send + Sync>(instance: Arc<K>) -> Self {
    RegistrationEntry::Singleton {
      instance: Box::new(instance),
    }
  }

  /// A transient entry calling `factory` on every resolution.
  pub fn transient<K: ?Sized + Any + Send + Sync>(
    factory: impl Fn() -> Arc<K> + Send + Sync + 'static,
  ) -> Self {
    RegistrationEntry::Transient {
      factory: Arc::new(move || -> Box<dyn Any + Send + Sync> { Box::new(factory()) }),
    }
  }

  /// `"singleton"` or `"transient"`.
  pub fn lifetime(&self) -> &'static str {
    match self {
      RegistrationEntry::Singleton { .. } => "singleton",
      RegistrationEntry::Transient { .. } => "transient",
    }
  }
}

impl fmt::Debug for RegistrationEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RegistrationEntry")
      .field("lifetime", &self.lifetime())
      .finish_non_exhaustive()
  }
}
