use thiserror::Error;

/// Errors surfaced by container operations.
///
/// Every error is returned to the immediate caller. A failed operation leaves
/// the registry exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
  /// No entry is registered under the requested key.
  #[error("no registration for service `{type_name}`")]
  NotRegistered {
    /// The requested key type.
    type_name: &'static str,
  },

  /// The entry registered under the key does not hold a value of the
  /// requested type. Only reachable after editing the raw storage.
  #[error("registration for `{type_name}` does not hold a value of that type")]
  TypeMismatch {
    /// The requested key type.
    type_name: &'static str,
  },

  /// A factory tried to resolve the key it is currently constructing.
  #[error("circular resolution detected while resolving `{type_name}`")]
  CircularResolution {
    /// The key whose factory re-entered itself.
    type_name: &'static str,
  },

  /// `internal_container` was asked for a representation other than the
  /// actual storage type.
  #[error("internal storage is `{actual}`, not `{requested}`")]
  RepresentationMismatch {
    /// The type the caller asked for.
    requested: &'static str,
    /// The container's real storage type.
    actual: &'static str,
  },
}
