use fibre_container::Container;
use std::sync::Arc;
use std::thread;

// Settings built once at startup and read by every worker.
struct Settings {
  workers: usize,
}

// A per-request scratch buffer; every worker gets its own.
#[derive(Default)]
struct Scratch {
  bytes: Vec<u8>,
}

// Configures the container once, then hands it to the workers.
fn bootstrap() -> Arc<Container> {
  let container = Container::new();
  container
    .register_instance(Settings { workers: 4 })
    .register_transient::<Scratch>();
  Arc::new(container)
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let container = bootstrap();
  let workers = container.resolve::<Settings>().map(|s| s.workers).unwrap_or(1);

  let handles: Vec<_> = (0..workers)
    .map(|worker| {
      let container = Arc::clone(&container);
      thread::spawn(move || {
        let settings = container.resolve::<Settings>()?;
        let mut scratch = container.resolve::<Scratch>()?;
        // A fresh transient is not shared yet, so it can be mutated in place.
        if let Some(scratch) = Arc::get_mut(&mut scratch) {
          scratch.bytes.push(worker as u8);
        }
        println!(
          "worker {} of {} got {} byte(s) of scratch",
          worker,
          settings.workers,
          scratch.bytes.len()
        );
        Ok::<_, fibre_container::ContainerError>(())
      })
    })
    .collect();

  for handle in handles {
    if let Ok(Err(err)) = handle.join() {
      eprintln!("worker failed: {}", err);
    }
  }

  // Shutdown: drop every registration.
  container.clear();
}
