use fibre_container::{resolve_from, Container, ContainerError};
use std::panic;

struct UnregisteredService;

fn main() {
  let container = Container::new();

  // --- Using the panicking `resolve_from!` macro ---
  println!("Attempting to resolve a service that was never registered...");

  let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
    // This line will panic!
    let _service = resolve_from!(&container, UnregisteredService);
  }));

  assert!(result.is_err(), "resolve_from! should have panicked.");
  println!("Successfully caught the expected panic from resolve_from!.");

  // --- Using the fallible `resolve()` method ---
  println!("\nNow, attempting to resolve using the fallible `resolve()` method...");

  match container.resolve::<UnregisteredService>() {
    Ok(_) => panic!("Should not have found the service!"),
    Err(err @ ContainerError::NotRegistered { .. }) => println!("Correctly received: {}", err),
    Err(other) => panic!("Unexpected error: {}", other),
  }

  // Removing something that was never registered is not an error.
  container.deregister::<UnregisteredService>().clear();
  println!("Deregistering and clearing an empty container succeeded.");
}
