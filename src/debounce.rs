#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Quiet period before a burst of edits becomes one `update` call.
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(450);
/// Further delay before an interactive frontend reports "saved".
pub const SAVED_INDICATOR_DELAY: Duration = Duration::from_millis(350);

/// Latest-wins deferred action: only the most recent `schedule` is live.
/// A newer `schedule`, a `cancel`, or dropping the debouncer keeps any
/// older pending action from ever firing.
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn schedule<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::clone(&self.generation);
        let delay = self.delay;
        thread::spawn(move || {
            thread::sleep(delay);
            if generation.load(Ordering::SeqCst) == token {
                action();
            }
        });
    }

    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
