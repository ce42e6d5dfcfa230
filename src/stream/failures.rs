use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::Error;

/// Hands publish failures to the drain without ever waiting on it.
#[derive(Debug, Clone)]
pub struct FailureReporter {
    tx: mpsc::Sender<Error>,
    dropped: Arc<AtomicU64>,
}

/// Receiving end of [`FailureReporter`], logs everything it gets.
#[derive(Debug)]
pub struct FailureDrain {
    rx: mpsc::Receiver<Error>,
    dropped: Arc<AtomicU64>,
}

pub fn failures(capacity: usize) -> (FailureReporter, FailureDrain) {
    let (tx, rx) = mpsc::channel(capacity);
    let dropped = Arc::new(AtomicU64::new(0));
    (
        FailureReporter { tx, dropped: dropped.clone() },
        FailureDrain { rx, dropped },
    )
}

impl FailureReporter {
    /// Queues `err` for the drain. If the queue is full the failure is only counted.
    pub fn report(&self, err: Error) {
        if self.tx.try_send(err).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl FailureDrain {
    /// Logs failures until every reporter is gone.
    pub async fn run(mut self) {
        while let Some(err) = self.rx.recv().await {
            error!("{}", err);
            let dropped = self.dropped.swap(0, Ordering::Relaxed);
            if dropped > 0 {
                error!("{} more publish failures were not logged", dropped);
            }
        }
    }

    #[cfg(test)]
    fn try_next(&mut self) -> Option<Error> {
        self.rx.try_recv().ok()
    }
}
