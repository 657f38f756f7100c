//! Public macros for ergonomic service resolution and binding.

/// Resolves a required service from a container, panicking if it cannot be
/// resolved.
///
/// Works with [`Container`](crate::Container) and, with the `local` feature,
/// `LocalContainer`. For a non-panicking version use
/// [`maybe_resolve_from!`] or call `resolve` directly.
///
/// # Panics
///
/// Panics with `"Failed to resolve required service: <type>"` (or
/// `"Failed to resolve required trait service: <type>"`) followed by the
/// underlying [`ContainerError`](crate::ContainerError).
///
/// # Examples
///
/// ```
/// use fibre_container::{resolve_from, Container};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter { fn greet(&self) -> String { "Hello!".to_string() } }
///
/// let container = Container::new();
/// container
///   .register_instance(String::from("hello"))
///   .register::<dyn Greeter>(Arc::new(EnglishGreeter));
///
/// assert_eq!(*resolve_from!(&container, String), "hello");
/// assert_eq!(resolve_from!(&container, trait Greeter).greet(), "Hello!");
/// ```
#[macro_export]
macro_rules! resolve_from {
  // A `trait` keyword cannot start a type, so this arm must come first.
  ($container:expr, trait $trait_ident:ident) => {
    match $container.resolve::<dyn $trait_ident>() {
      Ok(service) => service,
      Err(err) => panic!(
        "Failed to resolve required trait service: {} ({})",
        std::any::type_name::<dyn $trait_ident>(),
        err
      ),
    }
  };

  ($container:expr, $type:ty) => {
    match $container.resolve::<$type>() {
      Ok(service) => service,
      Err(err) => panic!(
        "Failed to resolve required service: {} ({})",
        std::any::type_name::<$type>(),
        err
      ),
    }
  };
}

/// Resolves a service from a container, yielding `None` on any resolution error.
#[macro_export]
macro_rules! maybe_resolve_from {
  ($container:expr, trait $trait_ident:ident) => {
    $container.resolve::<dyn $trait_ident>().ok()
  };

  ($container:expr, $type:ty) => {
    $container.resolve::<$type>().ok()
  };
}

/// Binds a trait to a default-constructible implementation as a transient on
/// a [`Container`](crate::Container).
///
/// `bind!(container, trait Greeter => EnglishGreeter)` keys the entry by
/// `dyn Greeter` and builds a fresh `EnglishGreeter` on every resolution.
///
/// ```
/// use fibre_container::{bind, resolve_from, Container};
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// #[derive(Default)]
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter { fn greet(&self) -> String { "Hello!".to_string() } }
///
/// let container = Container::new();
/// bind!(&container, trait Greeter => EnglishGreeter);
///
/// assert_eq!(resolve_from!(&container, trait Greeter).greet(), "Hello!");
/// ```
#[macro_export]
macro_rules! bind {
  ($container:expr, trait $trait_ident:ident => $impl_ty:ty) => {
    $container.register_transient_as::<dyn $trait_ident, $impl_ty>(|service| {
      service as ::std::sync::Arc<dyn $trait_ident>
    })
  };
}
