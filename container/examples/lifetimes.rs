use fibre_container::{resolve_from, Container};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

// A global, thread-safe counter to generate unique IDs.
static ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

// A service that gets a unique ID upon creation.
struct RequestTracker {
  id: usize,
}

impl Default for RequestTracker {
  fn default() -> Self {
    println!("Creating TRANSIENT RequestTracker...");
    RequestTracker {
      id: ID_COUNTER.fetch_add(1, Ordering::SeqCst),
    }
  }
}

// A pre-built service shared by everyone who resolves it.
struct AppSettings {
  name: &'static str,
}

fn main() {
  let container = Container::new();

  // --- Registration ---
  container
    .register_instance(AppSettings { name: "fibre-demo" })
    .register_transient::<RequestTracker>();

  println!("--- Resolving Singletons ---");
  let s1 = resolve_from!(&container, AppSettings);
  let s2 = resolve_from!(&container, AppSettings);
  println!("Settings 1: {}, Settings 2: {}", s1.name, s2.name);
  assert!(
    Arc::ptr_eq(&s1, &s2),
    "Singleton instances should be identical"
  );
  println!("Singleton instances are the same pointer, as expected.\n");

  println!("--- Resolving Transients ---");
  let t1 = resolve_from!(&container, RequestTracker);
  let t2 = resolve_from!(&container, RequestTracker);
  println!("Transient 1 ID: {}, Transient 2 ID: {}", t1.id, t2.id);
  assert_eq!(t1.id, 0);
  assert_eq!(t2.id, 1);
  assert!(
    !Arc::ptr_eq(&t1, &t2),
    "Transient instances should be different"
  );
  println!("Transient instances are different pointers, as expected.");
}
