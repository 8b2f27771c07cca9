use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

struct PendingSend {
    generation: u64,
    timer: JoinHandle<()>,
}

/// Trailing-edge debouncer holding at most one scheduled send.
///
/// Scheduling a new send cancels the previous one if its quiet interval has
/// not elapsed yet. A send that already fired runs to completion.
pub struct Debouncer {
    quiet: Duration,
    pending: Arc<Mutex<Option<PendingSend>>>,
    generation: AtomicU64,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
        }
    }

    /// Runs `send` once the quiet interval has passed without another call
    /// to `schedule`.
    pub fn schedule<F>(&self, send: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let mut slot = self.pending.lock();
        if let Some(previous) = slot.take() {
            debug!("Debounced send {} superseded", previous.generation);
            previous.timer.abort();
        }

        let pending = Arc::clone(&self.pending);
        let quiet = self.quiet;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            {
                let mut slot = pending.lock();
                match slot.as_ref() {
                    Some(current) if current.generation == generation => *slot = None,
                    _ => return,
                }
            }
            debug!("Debounced send {generation} firing");
            send.await;
        });

        *slot = Some(PendingSend { generation, timer });
    }

    /// True between a call to `schedule` and the moment its send fires.
    pub fn is_pending(&self) -> bool {
        self.pending.lock().is_some()
    }
}
