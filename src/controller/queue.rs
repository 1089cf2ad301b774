//! Serial execution contexts.
//!
//! [`WorkerQueue`] runs boxed jobs one at a time, in submission order, on
//! a dedicated thread. It can be held suspended until signaled, which is
//! how configuration is gated on the permission decision.

use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

/// A unit of work for a serial context.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// The context on which UI-owned state may be touched.
///
/// Preview rotation and every delegate callback run here. Hosts with their
/// own main loop implement this to post onto it.
pub trait UiContext: Send + Sync {
    fn dispatch(&self, job: Job);
}

struct QueueState {
    jobs: VecDeque<Job>,
    suspended: bool,
    shutdown: bool,
}

struct Shared {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Single-threaded FIFO job queue.
pub struct WorkerQueue {
    label: String,
    shared: Arc<Shared>,
}

impl WorkerQueue {
    /// Spawns the worker thread, named `label`.
    pub fn new(label: &str) -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState {
                jobs: VecDeque::new(),
                suspended: false,
                shutdown: false,
            }),
            available: Condvar::new(),
        });

        let worker = Arc::clone(&shared);
        let name = label.to_string();
        thread::Builder::new()
            .name(label.to_string())
            .spawn(move || run(worker, name))?;

        tracing::debug!(label, "Worker queue started");
        Ok(Self {
            label: label.to_string(),
            shared,
        })
    }

    /// Appends a job. Returns false if the queue has been shut down.
    pub fn enqueue(&self, job: impl FnOnce() + Send + 'static) -> bool {
        let mut state = self.shared.lock();
        if state.shutdown {
            tracing::debug!(label = %self.label, "Dropping job submitted after shutdown");
            return false;
        }
        state.jobs.push_back(Box::new(job));
        drop(state);
        self.shared.available.notify_one();
        true
    }

    /// Holds all queued and future jobs until [`resume`](Self::resume).
    ///
    /// A job already executing runs to completion.
    pub fn suspend(&self) {
        self.shared.lock().suspended = true;
        tracing::trace!(label = %self.label, "Worker queue suspended");
    }

    pub fn resume(&self) {
        self.shared.lock().suspended = false;
        self.shared.available.notify_one();
        tracing::trace!(label = %self.label, "Worker queue resumed");
    }

    #[cfg(test)]
    pub(crate) fn is_suspended(&self) -> bool {
        self.shared.lock().suspended
    }

    /// Number of jobs waiting to run.
    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.shared.lock().jobs.len()
    }

    /// Waits until every job submitted before this call has run.
    ///
    /// Returns false on timeout, which is what happens while suspended.
    pub fn sync(&self, timeout: Duration) -> bool {
        let (tx, rx) = mpsc::channel();
        if !self.enqueue(move || {
            let _ = tx.send(());
        }) {
            return false;
        }
        rx.recv_timeout(timeout).is_ok()
    }

    /// Stops the worker once the queue drains.
    ///
    /// A suspended queue never drains: its pending jobs are discarded.
    pub fn shutdown(&self) {
        let discarded = {
            let mut state = self.shared.lock();
            if state.shutdown {
                return;
            }
            state.shutdown = true;
            if state.suspended {
                std::mem::take(&mut state.jobs)
            } else {
                VecDeque::new()
            }
        };
        self.shared.available.notify_one();

        if !discarded.is_empty() {
            tracing::debug!(
                label = %self.label,
                discarded = discarded.len(),
                "Discarded jobs held by suspended queue"
            );
        }
        drop(discarded);
    }
}

impl UiContext for WorkerQueue {
    fn dispatch(&self, job: Job) {
        self.enqueue(job);
    }
}

impl Drop for WorkerQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(shared: Arc<Shared>, label: String) {
    loop {
        let job = {
            let mut state = shared.lock();
            loop {
                if state.shutdown && (state.suspended || state.jobs.is_empty()) {
                    tracing::debug!(label = %label, "Worker queue stopped");
                    return;
                }
                if !state.suspended {
                    if let Some(job) = state.jobs.pop_front() {
                        break job;
                    }
                }
                state = shared
                    .available
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };
        job();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TIMEOUT: Duration = Duration::from_secs(2);

    #[test]
    fn test_jobs_run_in_order() {
        let queue = WorkerQueue::new("test-order").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..10 {
            let seen = Arc::clone(&seen);
            queue.enqueue(move || seen.lock().unwrap().push(i));
        }

        assert!(queue.sync(TIMEOUT));
        assert_eq!(*seen.lock().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_suspend_holds_jobs_until_resume() {
        let queue = WorkerQueue::new("test-suspend").unwrap();
        let ran = Arc::new(AtomicUsize::new(0));

        queue.suspend();
        let counter = Arc::clone(&ran);
        queue.enqueue(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!queue.sync(Duration::from_millis(50)));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert!(queue.is_suspended());

        queue.resume();
        assert!(queue.sync(TIMEOUT));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_enqueue_after_shutdown_rejected() {
        let queue = WorkerQueue::new("test-shutdown").unwrap();
        queue.shutdown();
        assert!(!queue.enqueue(|| {}));
    }

    #[test]
    fn test_shutdown_discards_suspended_jobs() {
        let queue = WorkerQueue::new("test-discard").unwrap();
        queue.suspend();
        queue.enqueue(|| {});
        queue.enqueue(|| {});
        assert_eq!(queue.pending(), 2);

        queue.shutdown();
        assert_eq!(queue.pending(), 0);
    }
}
