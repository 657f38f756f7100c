use fibre_container::{bind, resolve_from, Container};
use std::sync::Arc;

// 1. Define the abstraction (the trait)
trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

// 2. Define a concrete implementation
#[derive(Default)]
struct ConsoleLogger;
impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[CONSOLE LOG]: {}", message);
  }
}

// 3. Define a service that depends on the abstraction
struct ReportService {
  logger: Arc<dyn Logger>,
}

impl ReportService {
  fn generate_report(&self) {
    self.logger.log("Starting report generation.");
    self.logger.log("Finished report generation.");
  }
}

fn main() {
  let container = Arc::new(Container::new());

  // --- Registration ---

  // Bind `dyn Logger` to ConsoleLogger. Each resolution builds a new logger.
  bind!(&container, trait Logger => ConsoleLogger);

  // The ReportService factory resolves its own dependency through a weak
  // handle, so the container does not keep itself alive.
  let handle = Arc::downgrade(&container);
  container.register_factory(move || ReportService {
    logger: match handle.upgrade() {
      Some(container) => resolve_from!(&container, trait Logger),
      None => Arc::new(ConsoleLogger) as Arc<dyn Logger>,
    },
  });

  // --- Resolution and Usage ---
  println!("Resolving the high-level service...");
  let report_service = resolve_from!(&container, ReportService);

  println!("Using the service...");
  report_service.generate_report();
}
