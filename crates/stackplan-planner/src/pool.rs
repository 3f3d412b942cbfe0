//! Fixed-size pool of worker threads fed through a bounded job queue.
//!
//! The pool knows nothing about search: it runs boxed closures. Batching, result
//! ordering, and panic reporting live in
//! [`PoolStrategy`](crate::strategy::PoolStrategy).

use std::{
    io,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc, Mutex,
        mpsc::{self, Receiver, SyncSender},
    },
    thread::{self, JoinHandle},
};

use crate::error::WorkerFailure;

pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Jobs that may wait in the queue per worker before submission blocks.
const QUEUE_DEPTH_PER_WORKER: usize = 64;

/// Long-lived worker threads shared by every planning call that uses them.
///
/// Dropping the pool closes the queue and joins the workers after they finish the
/// jobs already queued.
#[derive(Debug)]
pub struct WorkerPool {
    sender: Option<SyncSender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `size` workers (at least one).
    pub fn new(size: usize) -> io::Result<Self> {
        let size = size.max(1);
        let (sender, receiver) = mpsc::sync_channel::<Job>(size * QUEUE_DEPTH_PER_WORKER);
        let receiver = Arc::new(Mutex::new(receiver));
        let workers = (0..size)
            .map(|id| {
                let receiver = Arc::clone(&receiver);
                thread::Builder::new()
                    .name(format!("stackplan-worker-{id}"))
                    .spawn(move || worker_loop(&receiver))
            })
            .collect::<io::Result<Vec<_>>>()?;
        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queues a job, blocking while the queue is full.
    pub(crate) fn execute(&self, job: Job) -> Result<(), WorkerFailure> {
        let sender = self.sender.as_ref().ok_or(WorkerFailure::Disconnected)?;
        sender.send(job).map_err(|_| WorkerFailure::Disconnected)
    }
}

fn worker_loop(receiver: &Mutex<Receiver<Job>>) {
    loop {
        let job = {
            let receiver = match receiver.lock() {
                Ok(receiver) => receiver,
                Err(poisoned) => poisoned.into_inner(),
            };
            receiver.recv()
        };
        let Ok(job) = job else {
            // queue closed
            return;
        };
        // a panicking job must not take the worker down with it
        let _ = panic::catch_unwind(AssertUnwindSafe(job));
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_runs_every_job_before_drop_returns() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::new(3).unwrap();
        assert_eq!(pool.size(), 3);
        for _ in 0..100 {
            let counter = Arc::clone(&counter);
            pool.execute(Box::new(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            }))
            .unwrap();
        }
        drop(pool);
        assert_eq!(counter.load(Ordering::Relaxed), 100);
    }

    #[test]
    fn test_zero_size_spawns_one_worker() {
        assert_eq!(WorkerPool::new(0).unwrap().size(), 1);
    }

    #[test]
    fn test_worker_survives_panicking_job() {
        let pool = WorkerPool::new(1).unwrap();
        pool.execute(Box::new(|| panic!("job failure"))).unwrap();

        let (tx, rx) = mpsc::channel();
        pool.execute(Box::new(move || tx.send(42).unwrap())).unwrap();
        assert_eq!(rx.recv().unwrap(), 42);
    }
}
