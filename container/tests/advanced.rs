use fibre_container::{
  Container, ContainerError, RegistrationEntry, RegistrationKey, Storage,
};
use std::collections::HashMap;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc, Mutex, Weak,
};
use std::thread;

// --- Advanced Test Fixtures ---

fn init_tracing() {
  // Only the first test to get here installs the subscriber.
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

struct Logger {
  prefix: String,
}

impl Logger {
  fn format(&self, message: &str) -> String {
    format!("{}{}", self.prefix, message)
  }
}

#[derive(Default)]
struct Widget;

// --- Advanced Tests ---

#[test]
fn test_logger_widget_scenario() {
  init_tracing();
  let container = Container::new();

  // Singleton logger: resolution returns the registered instance.
  let l1 = Arc::new(Logger {
    prefix: "[app] ".to_string(),
  });
  container.register(l1.clone());
  let logger = container.resolve::<Logger>().unwrap();
  assert!(Arc::ptr_eq(&logger, &l1));
  assert_eq!(logger.format("started"), "[app] started");

  // Transient widget: two resolutions, two instances.
  container.register_transient::<Widget>();
  let w1 = container.resolve::<Widget>().unwrap();
  let w2 = container.resolve::<Widget>().unwrap();
  assert!(!Arc::ptr_eq(&w1, &w2));

  // Deregistered logger is gone.
  container.deregister::<Logger>();
  assert!(matches!(
    container.resolve::<Logger>(),
    Err(ContainerError::NotRegistered { .. })
  ));

  // Cleared container resolves nothing.
  container.clear();
  assert!(matches!(
    container.resolve::<Widget>(),
    Err(ContainerError::NotRegistered { .. })
  ));
}

#[test]
fn test_shared_container_resolves_across_threads() {
  // Arrange
  let container = Arc::new(Container::new());
  container
    .register_instance(Logger {
      prefix: "[shared] ".to_string(),
    })
    .register_transient::<Widget>();
  let expected = container.resolve::<Logger>().unwrap();

  // Act & Assert
  thread::scope(|s| {
    for _ in 0..8 {
      let container = Arc::clone(&container);
      let expected = Arc::clone(&expected);
      s.spawn(move || {
        for _ in 0..100 {
          let logger = container.resolve::<Logger>().unwrap();
          assert!(Arc::ptr_eq(&logger, &expected));
          container.resolve::<Widget>().unwrap();
        }
      });
    }
  });
}

#[test]
fn test_concurrent_registration_and_resolution() {
  // A stress test to ensure registering while resolving neither deadlocks
  // nor loses writes.
  struct Common(i32);
  let container = Container::new();
  container.register_instance(Common(42));

  thread::scope(|s| {
    for i in 0..10_usize {
      let container = &container;
      s.spawn(move || {
        if i % 2 == 0 {
          container.register_instance(i);
        } else {
          container.register_factory(move || i as u64);
        }

        for _ in 0..100 {
          assert_eq!(container.resolve::<Common>().unwrap().0, 42);
        }
      });
    }
  });

  // Every thread wrote under the `usize` or `u64` key; one of each survives.
  assert_eq!(container.len(), 3);
  assert!(container.contains::<usize>());
  assert!(container.contains::<u64>());
}

#[test]
fn test_factory_can_resolve_from_its_own_container() {
  // Factories run without a storage lock held, so they may read and write
  // the container they are registered in.
  struct Config {
    url: String,
  }
  struct Connection {
    url: String,
  }

  let container = Arc::new(Container::new());
  container.register_instance(Config {
    url: "postgres://host/db".to_string(),
  });

  let handle: Weak<Container> = Arc::downgrade(&container);
  container.register_factory(move || {
    let container = handle.upgrade().expect("container dropped");
    let config = container.resolve::<Config>().unwrap();
    container.register_instance(7_u8);
    Connection {
      url: config.url.clone(),
    }
  });

  let connection = container.resolve::<Connection>().unwrap();

  assert_eq!(connection.url, "postgres://host/db");
  assert_eq!(*container.resolve::<u8>().unwrap(), 7);
}

#[test]
fn test_circular_resolution_is_reported() {
  struct SelfReferential {
    inner: Option<ContainerError>,
  }

  let container = Arc::new(Container::new());
  let handle = Arc::downgrade(&container);
  container.register_factory(move || {
    let container = handle.upgrade().expect("container dropped");
    SelfReferential {
      inner: container.resolve::<SelfReferential>().err(),
    }
  });

  let outer = container.resolve::<SelfReferential>().unwrap();

  assert!(matches!(
    outer.inner,
    Some(ContainerError::CircularResolution { .. })
  ));
  // The guard is released once the outer resolution finishes.
  assert!(container.resolve::<SelfReferential>().is_ok());
}

#[test]
fn test_factory_may_resolve_same_key_from_another_container() {
  struct Config(u32);

  let parent = Arc::new(Container::new());
  parent.register_factory(|| Config(7));

  // The child's `Config` factory delegates to the parent's `Config`. Same
  // key, different container: not a cycle.
  let child = Container::new();
  let upstream = Arc::clone(&parent);
  child.register_factory(move || {
    upstream
      .resolve::<Config>()
      .map(|config| Config(config.0))
      .unwrap_or(Config(0))
  });

  assert_eq!(child.resolve::<Config>().unwrap().0, 7);
  assert_eq!(parent.resolve::<Config>().unwrap().0, 7);
}

#[test]
fn test_indirect_circular_resolution_is_reported() {
  struct ServiceA {
    b: Option<Arc<ServiceB>>,
  }
  struct ServiceB {
    a: Option<Arc<ServiceA>>,
  }

  let observed = Arc::new(Mutex::new(None));
  let container = Arc::new(Container::new());

  let handle = Arc::downgrade(&container);
  container.register_factory(move || ServiceA {
    b: handle.upgrade().and_then(|c| c.resolve::<ServiceB>().ok()),
  });

  let handle = Arc::downgrade(&container);
  let slot = Arc::clone(&observed);
  container.register_factory(move || {
    let a = handle.upgrade().map(|c| c.resolve::<ServiceA>());
    let a = match a {
      Some(Ok(a)) => Some(a),
      Some(Err(err)) => {
        *slot.lock().unwrap() = Some(err);
        None
      }
      None => None,
    };
    ServiceB { a }
  });

  let a = container.resolve::<ServiceA>().unwrap();

  let b = a.b.as_ref().expect("B should resolve");
  assert!(b.a.is_none());
  assert!(matches!(
    observed.lock().unwrap().take(),
    Some(ContainerError::CircularResolution { .. })
  ));
}

#[test]
fn test_internal_container_exposes_storage() {
  let container = Container::new();
  container.register_instance(10_u32).register_transient::<Widget>();

  let storage = container.internal_container::<Storage>().unwrap();
  assert_eq!(storage.len(), 2);
  assert!(storage.contains_key(&RegistrationKey::of::<u32>()));

  // Writes through the storage are visible to the typed API.
  storage.insert(
    RegistrationKey::of::<i8>(),
    RegistrationEntry::singleton(Arc::new(-1_i8)),
  );
  assert_eq!(*container.resolve::<i8>().unwrap(), -1);
}

#[test]
fn test_internal_container_rejects_other_representations() {
  let container = Container::new();

  let err = container
    .internal_container::<HashMap<RegistrationKey, RegistrationEntry>>()
    .unwrap_err();

  match err {
    ContainerError::RepresentationMismatch { requested, actual } => {
      assert!(requested.contains("HashMap"));
      assert!(actual.contains("DashMap"));
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn test_mismatched_raw_entry_surfaces_type_mismatch() {
  let container = Container::new();
  let storage = container.internal_container::<Storage>().unwrap();

  // A `String` stored under the `u32` key.
  storage.insert(
    RegistrationKey::of::<u32>(),
    RegistrationEntry::singleton(Arc::new(String::from("not a number"))),
  );
  storage.insert(
    RegistrationKey::of::<u64>(),
    RegistrationEntry::transient(|| Arc::new(String::from("not a number"))),
  );

  assert!(matches!(
    container.resolve::<u32>(),
    Err(ContainerError::TypeMismatch { .. })
  ));
  assert!(matches!(
    container.resolve::<u64>(),
    Err(ContainerError::TypeMismatch { .. })
  ));
}

#[test]
fn test_singleton_outlives_removal_while_held() {
  static DROP_COUNTER: AtomicUsize = AtomicUsize::new(0);

  struct ConnectionPool;
  impl Drop for ConnectionPool {
    fn drop(&mut self) {
      DROP_COUNTER.fetch_add(1, Ordering::SeqCst);
    }
  }

  let container = Container::new();
  container.register_instance(ConnectionPool);
  let pool = container.resolve::<ConnectionPool>().unwrap();

  // The registry only releases its handle; the caller's keeps the pool alive.
  container.clear();
  assert_eq!(DROP_COUNTER.load(Ordering::SeqCst), 0);

  drop(pool);
  assert_eq!(DROP_COUNTER.load(Ordering::SeqCst), 1);
}

#[test]
fn test_clear_drops_entries_outside_storage_locks() {
  static LEN_SEEN_ON_DROP: AtomicUsize = AtomicUsize::new(usize::MAX);

  // Calls back into the container from `Drop`.
  struct Reporter {
    container: Weak<Container>,
  }
  impl Drop for Reporter {
    fn drop(&mut self) {
      if let Some(container) = self.container.upgrade() {
        LEN_SEEN_ON_DROP.store(container.len(), Ordering::SeqCst);
        container.register_instance(1_u8);
      }
    }
  }

  let container = Arc::new(Container::new());
  container
    .register_instance(Reporter {
      container: Arc::downgrade(&container),
    })
    .register_instance(String::from("config"))
    .register_transient::<Widget>();

  container.clear();

  assert_eq!(LEN_SEEN_ON_DROP.load(Ordering::SeqCst), 0);
  // Registered from inside `Drop`, after the drain.
  assert_eq!(container.len(), 1);
  assert!(container.contains::<u8>());
}

#[test]
fn test_dropping_container_releases_singletons() {
  static DROP_COUNTER: AtomicUsize = AtomicUsize::new(0);

  struct Cache;
  impl Drop for Cache {
    fn drop(&mut self) {
      DROP_COUNTER.fetch_add(1, Ordering::SeqCst);
    }
  }

  let container = Container::new();
  container.register_instance(Cache);
  drop(container.resolve::<Cache>().unwrap());
  assert_eq!(DROP_COUNTER.load(Ordering::SeqCst), 0);

  drop(container);
  assert_eq!(DROP_COUNTER.load(Ordering::SeqCst), 1);
}
