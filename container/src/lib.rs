//! # Fibre Container
//!
//! A flat, type-keyed service registry for Rust with singleton and transient
//! registrations.
//!
//! A [`Container`] maps a key type to one entry. A singleton entry hands out
//! the same shared instance on every resolution; a transient entry builds a
//! new one each time. The key may be a trait object type, which binds an
//! interface to an implementation.
//!
//! ## Core Concepts
//!
//! - **Container**: the thread-safe registry, shared as `Arc<Container>` or
//!   `&Container`. There is no global instance; pass the handle explicitly.
//! - **LocalContainer** (feature `local`): the unsynchronized variant, for
//!   single-threaded code and `!Send` services.
//! - **Last write wins**: registering under an existing key replaces the entry.
//! - **Fluent chaining**: every mutating call returns the container.
//! - **Resolution**: `resolve` returns a [`ContainerError`] for a missing key;
//!   [`resolve_from!`] panics instead.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_container::{bind, resolve_from, Container, ContainerError};
//! use std::sync::Arc;
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! #[derive(Default)]
//! struct EnglishGreeter;
//!
//! impl Greeter for EnglishGreeter {
//!     fn greet(&self) -> String {
//!         "Hello, World!".to_string()
//!     }
//! }
//!
//! let container = Container::new();
//!
//! // A singleton keyed by its own type, and a transient bound to a trait.
//! container.register_instance(String::from("greeting"));
//! bind!(&container, trait Greeter => EnglishGreeter);
//!
//! let first = resolve_from!(&container, trait Greeter);
//! let second = resolve_from!(&container, trait Greeter);
//! assert_eq!(first.greet(), "Hello, World!");
//! assert!(!Arc::ptr_eq(&first, &second));
//!
//! container.deregister::<String>();
//! assert!(matches!(
//!     container.resolve::<String>(),
//!     Err(ContainerError::NotRegistered { .. })
//! ));
//! ```

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

mod container;
mod core;
mod error;
#[cfg(feature = "local")]
mod local_container;
mod macros;

pub use crate::container::{Container, Storage};
pub use crate::core::{RegistrationEntry, RegistrationKey, SharedFactory};
pub use crate::error::ContainerError;
#[cfg(feature = "local")]
pub use crate::local_container::{LocalContainer, LocalEntry, LocalStorage};
