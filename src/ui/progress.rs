//! Progress indicators for long-running operations
//!
//! Uses `linya` for allocation-free, concurrency-optimized progress bars

use linya::{Bar, Progress};
use std::sync::Mutex;

/// Progress bar for component version fetches, shared across worker
/// threads via interior locking so `inc` takes `&self`.
pub struct ComponentProgress {
  progress: Mutex<Progress>,
  bar: Bar,
}

impl ComponentProgress {
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self {
      progress: Mutex::new(progress),
      bar,
    }
  }

  /// Increment progress by 1 (thread-safe)
  pub fn inc(&self) {
    self.progress.lock().unwrap().inc_and_draw(&self.bar, 1);
  }
}
