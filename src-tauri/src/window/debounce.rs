//! Trailing-edge debounce.
//!
//! Each call bumps a generation counter and schedules a timer; a timer only
//! runs the action if no newer call happened during its quiet period. Timers
//! are never cancelled, so the action must tolerate running after its
//! window is gone.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Quiet period before persisting bounds after a move/resize burst.
pub const BOUNDS_QUIET_PERIOD: Duration = Duration::from_millis(500);

pub struct Debouncer {
    generation: Arc<AtomicU64>,
    quiet: Duration,
    action: Arc<dyn Fn() + Send + Sync>,
}

impl Debouncer {
    pub fn new(quiet: Duration, action: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            quiet,
            action: Arc::new(action),
        }
    }

    /// Schedule the action, replacing any pending run.
    pub fn call(&self) {
        let scheduled = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::clone(&self.generation);
        let action = Arc::clone(&self.action);
        let quiet = self.quiet;
        tauri::async_runtime::spawn(async move {
            tokio::time::sleep(quiet).await;
            if generation.load(Ordering::SeqCst) == scheduled {
                action();
            }
        });
    }
}
