//! Off-thread dataset loads for the TUI.
//!
//! The fetch itself can't be interrupted. Instead each request carries a
//! cancel flag: once the requester loses interest (tab switched, app closing)
//! the handle is cancelled and its result is dropped on arrival, so a slow
//! response never overwrites newer data.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::data::loader::{LoadPolicy, Loader};
use crate::domain::PanelPoint;
use crate::error::LoadError;

pub type LoadResult = Result<Vec<PanelPoint>, LoadError>;

/// Shared "still interested?" flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of polling a pending load.
#[derive(Debug)]
pub enum Poll {
    Pending,
    Ready(LoadResult),
    /// Cancelled, or the worker went away without answering.
    Dropped,
}

/// One in-flight dataset request.
pub struct PendingLoad {
    key: String,
    cancel: CancelFlag,
    rx: Receiver<LoadResult>,
}

impl PendingLoad {
    /// Start loading `key` on a worker thread.
    pub fn spawn(loader: &Loader, key: &str, policy: LoadPolicy) -> Self {
        let (tx, rx) = mpsc::channel();
        let cancel = CancelFlag::default();
        let worker_loader = loader.clone();
        let worker_key = key.to_string();
        let worker_cancel = cancel.clone();

        thread::spawn(move || {
            let result = worker_loader.load(&worker_key, policy);
            if worker_cancel.is_cancelled() {
                tracing::debug!(key = %worker_key, "load finished after cancel; discarding");
                return;
            }
            // The receiver may already be gone; nothing to do then.
            let _ = tx.send(result);
        });

        Self::from_parts(key, cancel, rx)
    }

    fn from_parts(key: &str, cancel: CancelFlag, rx: Receiver<LoadResult>) -> Self {
        Self {
            key: key.to_string(),
            cancel,
            rx,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Non-blocking check. The cancel flag is checked before a result is handed
    /// out, so a cancelled load never reaches the caller.
    pub fn poll(&self) -> Poll {
        if self.cancel.is_cancelled() {
            return Poll::Dropped;
        }
        match self.rx.try_recv() {
            Ok(result) => {
                if self.cancel.is_cancelled() {
                    tracing::debug!(key = %self.key, "dropping stale load result");
                    Poll::Dropped
                } else {
                    Poll::Ready(result)
                }
            }
            Err(TryRecvError::Empty) => Poll::Pending,
            Err(TryRecvError::Disconnected) => Poll::Dropped,
        }
    }
}

impl Drop for PendingLoad {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use crate::data::source::DirSource;

    fn wait_ready(load: &PendingLoad) -> Poll {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match load.poll() {
                Poll::Pending if Instant::now() < deadline => thread::sleep(Duration::from_millis(5)),
                other => return other,
            }
        }
    }

    #[test]
    fn delivers_result_when_still_interested() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("prices.json"), "[]").unwrap();
        let loader = Loader::new(Arc::new(DirSource::new(dir.path())));

        let load = PendingLoad::spawn(&loader, "prices", LoadPolicy::Strict);
        match wait_ready(&load) {
            Poll::Ready(Ok(points)) => assert!(points.is_empty()),
            other => panic!("unexpected poll result: {other:?}"),
        }
    }

    #[test]
    fn cancelled_result_is_never_applied() {
        let (tx, rx) = mpsc::channel();
        let load = PendingLoad::from_parts("prices", CancelFlag::default(), rx);
        tx.send(Ok(Vec::new())).unwrap();

        load.cancel();
        assert!(matches!(load.poll(), Poll::Dropped));
    }

    #[test]
    fn pending_until_worker_answers() {
        let (tx, rx) = mpsc::channel::<LoadResult>();
        let load = PendingLoad::from_parts("prices", CancelFlag::default(), rx);
        assert!(matches!(load.poll(), Poll::Pending));
        drop(tx);
        assert!(matches!(load.poll(), Poll::Dropped));
    }
}
